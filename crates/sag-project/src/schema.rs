//! Scenario file schema.

use sag_sim::{Parameters, SimOptions, Targets};
use serde::{Deserialize, Serialize};

use crate::migrate::LATEST_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    /// Files written before versioning carry no version key and load as 0.
    #[serde(default)]
    pub version: u32,
    pub name: String,
    /// Simulated span of the run (hours)
    pub duration_h: f64,
    #[serde(default)]
    pub parameters: Parameters,
    /// Starting setpoints; nominal feed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Targets>,
    #[serde(default)]
    pub options: SimOptions,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "default".to_string(),
            duration_h: 24.0,
            parameters: Parameters::default(),
            targets: None,
            options: SimOptions::default(),
            events: Vec::new(),
        }
    }
}

/// An operator action scheduled at a simulated time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioEvent {
    pub at_h: f64,
    #[serde(flatten)]
    pub action: EventAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EventAction {
    /// `kind` accepts `flow`/`F` and `grade`/`L`.
    SetTarget { kind: String, value: f64 },
    SetParameter { name: String, value: f64 },
    Reset,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::SetTarget { kind, value } => write!(f, "set target {kind} = {value}"),
            EventAction::SetParameter { name, value } => write!(f, "set {name} = {value}"),
            EventAction::Reset => f.write_str("reset"),
        }
    }
}
