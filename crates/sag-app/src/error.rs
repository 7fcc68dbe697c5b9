//! Error types for the sag-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// behind one interface for front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scenario error: {0}")]
    Project(String),

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Scenario validation failed: {0}")]
    Validation(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sag-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<sag_project::ProjectError> for AppError {
    fn from(err: sag_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<sag_project::ValidationError> for AppError {
    fn from(err: sag_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<sag_sim::SimError> for AppError {
    fn from(err: sag_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Export(err.to_string())
    }
}
