//! Error types for signal primitives.

use sag_core::CoreError;
use thiserror::Error;

/// Result type for signal primitive operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors raised when a signal primitive is configured with bad values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a constructor or setter.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Numeric value outside its admissible range.
    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}
