//! History export for front ends.

use std::path::Path;

use sag_sim::HistorySeries;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// One row per recorded sample, one column per series.
pub fn history_to_csv(series: &HistorySeries) -> String {
    let columns = series.columns();
    let header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let mut csv = header.join(",");
    csv.push('\n');
    for row in 0..series.len() {
        let values: Vec<String> = columns.iter().map(|(_, col)| col[row].to_string()).collect();
        csv.push_str(&values.join(","));
        csv.push('\n');
    }
    csv
}

pub fn history_to_json(series: &HistorySeries) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(series)?)
}

pub fn render_history(series: &HistorySeries, format: ExportFormat) -> AppResult<String> {
    match format {
        ExportFormat::Csv => Ok(history_to_csv(series)),
        ExportFormat::Json => history_to_json(series),
    }
}

pub fn write_history(path: &Path, series: &HistorySeries, format: ExportFormat) -> AppResult<()> {
    let content = render_history(series, format)?;
    std::fs::write(path, content).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
