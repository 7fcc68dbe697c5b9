//! Mass and grade balance of a SAG mill circuit.
//!
//! Provides:
//! - Crusher feed generator chasing operator setpoints through first-order lags
//! - Recirculation and fines transport delays
//! - Lumped solids / water / copper balance of the mill, explicit Euler
//! - Simulator handle with fixed-step clock, setpoint and parameter updates,
//!   reset, snapshots and a bounded history
//!
//! Units: masses t, flows t/h, times h, grades and moistures as fractions.
//! The simulator is single-owner and advances only when `step()` is called;
//! callers sharing it across threads must serialize access themselves.

pub mod error;
pub mod feed;
pub mod history;
pub mod mill;
pub mod params;
pub mod sim;
pub mod state;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use feed::{FeedGenerator, FeedOutput};
pub use history::{History, HistorySample, HistorySeries};
pub use mill::{MillBalance, MillInputs, MillInventory, MillRates, SOLIDS_FLOOR_T, WATER_FLOOR_T};
pub use params::{FeedVariability, ParamName, Parameters, TargetKind, Targets};
pub use sim::{SimOptions, Simulator, StepReport, TargetsOnReset};
pub use state::{SimulationState, Snapshot};

pub use sag_controls::{NoiseSource, SeededNoise, SilentNoise, VariabilityProfile};
