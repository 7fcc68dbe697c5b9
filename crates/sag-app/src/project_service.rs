//! Scenario loading, saving and validation.

use std::path::Path;

use sag_project::Scenario;

use crate::error::{AppError, AppResult};

/// Load a scenario; `.json` files as JSON, anything else as YAML.
pub fn load_scenario(path: &Path) -> AppResult<Scenario> {
    if !path.exists() {
        return Err(AppError::InvalidInput(format!(
            "Scenario file not found: {}",
            path.display()
        )));
    }
    Ok(sag_project::load(path)?)
}

pub fn save_scenario(path: &Path, scenario: &Scenario) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => sag_project::save_json(path, scenario)?,
        _ => sag_project::save_yaml(path, scenario)?,
    }
    Ok(())
}

pub fn validate_scenario(scenario: &Scenario) -> AppResult<()> {
    Ok(sag_project::validate_scenario(scenario)?)
}

/// The built-in plant defaults as a scenario file.
pub fn default_scenario_yaml() -> AppResult<String> {
    Ok(sag_project::to_yaml_string(&Scenario::default())?)
}
