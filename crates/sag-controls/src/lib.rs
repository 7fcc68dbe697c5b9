//! Signal-domain primitives for the SAG circuit simulator.
//!
//! The mill model itself lives in `sag-sim`; this crate holds the scalar
//! signal pieces it is assembled from:
//! - first-order lag used by the feed generator to chase operator targets
//! - bounded variability signals (harmonics + noise) with an injectable
//!   noise source so runs can be made deterministic
//! - transport delay lines for recirculation and fines onset
//! - step decimation for history recording
//!
//! All times are hours. Signals are plain `f64` values.

pub mod delay;
pub mod error;
pub mod lag;
pub mod noise;
pub mod sampled;
pub mod signal;

pub use delay::{DEFAULT_RAMP_WINDOW_H, DelayLine};
pub use error::{ControlError, ControlResult};
pub use lag::FirstOrderLag;
pub use noise::{NoiseSource, SeededNoise, SilentNoise};
pub use sampled::Decimator;
pub use signal::{Harmonic, VariabilityProfile};
