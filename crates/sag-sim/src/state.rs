//! Dynamical state of the circuit and its read-only snapshot.

use serde::{Deserialize, Serialize};

use crate::mill::MillInventory;

/// Mutable state, owned by the simulator and advanced once per step.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    /// Elapsed simulated time (h).
    pub t_h: f64,
    pub mill: MillInventory,
    /// Crusher feed delivered over the last step (t/h).
    pub feed_flow_tph: f64,
    /// Copper grade of that feed (mass fraction).
    pub feed_grade: f64,
}

impl SimulationState {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            t_h: self.t_h,
            solids_t: self.mill.solids_t,
            water_t: self.mill.water_t,
            copper_t: self.mill.copper_t,
            feed_flow_tph: self.feed_flow_tph,
            feed_grade: self.feed_grade,
            moisture: self.mill.moisture(),
        }
    }
}

/// Immutable copy of the simulator state handed to callers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub t_h: f64,
    pub solids_t: f64,
    pub water_t: f64,
    pub copper_t: f64,
    pub feed_flow_tph: f64,
    pub feed_grade: f64,
    /// water / (solids + water)
    pub moisture: f64,
}

impl Snapshot {
    /// Copper grade of the mill holdup.
    pub fn mill_grade(&self) -> f64 {
        if self.solids_t > 0.0 {
            self.copper_t / self.solids_t
        } else {
            0.0
        }
    }
}
