//! Shared application service layer for the mill simulator.
//!
//! Gives front ends one interface for loading scenarios, running them
//! against a simulator and exporting what was recorded.

pub mod error;
pub mod export;
pub mod progress;
pub mod project_service;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use export::{ExportFormat, history_to_csv, history_to_json, render_history, write_history};
pub use progress::{RunProgressEvent, RunStage, SimProgress};
pub use project_service::{default_scenario_yaml, load_scenario, save_scenario, validate_scenario};
pub use run_service::{
    RunRequest, RunResponse, RunSummary, build_simulator, run_scenario,
    run_scenario_with_progress,
};
