//! First-order lag: the relaxation law used to chase an operator target.

use sag_core::ensure_finite;

use crate::error::{ControlError, ControlResult};

/// First-order lag with time constant `tau_h`.
///
/// Dynamics: dx/dt = (target - x) / tau, integrated with explicit Euler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FirstOrderLag {
    tau_h: f64,
}

impl FirstOrderLag {
    /// Create a new lag. `tau_h` must be finite and positive.
    pub fn new(tau_h: f64) -> ControlResult<Self> {
        if ensure_finite(tau_h, "lag time constant")? <= 0.0 {
            return Err(ControlError::OutOfRange {
                what: "lag time constant",
                value: tau_h,
            });
        }
        Ok(Self { tau_h })
    }

    pub fn tau_h(&self) -> f64 {
        self.tau_h
    }

    /// Rate of change toward `target` (units per hour).
    pub fn derivative(&self, value: f64, target: f64) -> f64 {
        (target - value) / self.tau_h
    }

    /// Advance `value` by `dt_h` toward `target`.
    pub fn step(&self, value: f64, target: f64, dt_h: f64) -> f64 {
        value + self.derivative(value, target) * dt_h
    }
}
