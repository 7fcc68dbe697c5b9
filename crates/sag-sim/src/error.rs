//! Error types for simulator configuration.
//!
//! Only configuration can fail. Numerical degeneracy inside a step (a mill
//! running nearly empty) is handled by floors and never surfaces here.

use sag_controls::ControlError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Unknown target kind: {kind}")]
    UnknownTarget { kind: String },

    #[error("Invalid {kind} target {value}: {reason}")]
    InvalidTarget {
        kind: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid option: {what}")]
    InvalidOption { what: &'static str },

    #[error("Signal configuration error: {0}")]
    Control(#[from] ControlError),
}

pub type SimResult<T> = Result<T, SimError>;
