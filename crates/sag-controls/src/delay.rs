//! Transport delay line.
//!
//! Reproduces a recorded scalar signal after a fixed delay with a
//! zero-order hold: `read(t)` returns the last value recorded at or before
//! `t - delay`, never a later one.
//!
//! Two policies sit on top of the pure delay:
//! - before the delay has elapsed (`t < delay`) the signal has not arrived
//!   and `read` returns 0;
//! - from `t = delay` the output is ramped linearly from 0 to the delayed
//!   value over `ramp_h`. This is a smoothing choice for display, not a
//!   physical effect; set `ramp_h = 0` for a hard onset.
//!
//! Samples must be recorded in nondecreasing time order. Samples older than
//! the retention horizon are dropped, so memory stays bounded by roughly
//! `retention / dt` entries, and lookups are a binary search. Retention
//! defaults to the delay and never shrinks, so a delay can be lengthened
//! up to it without losing the samples the longer delay reads.

use std::collections::VecDeque;

use sag_core::ensure_finite;
use tracing::trace;

use crate::error::{ControlError, ControlResult};

/// Default length of the onset ramp (15 simulated minutes).
pub const DEFAULT_RAMP_WINDOW_H: f64 = 0.25;

/// Slack when comparing sample times computed in floating point.
const TIME_EPS_H: f64 = 1e-9;

/// Extra samples kept beyond the delay horizon.
const MARGIN_SAMPLES: usize = 4;

#[derive(Debug, Clone)]
pub struct DelayLine {
    delay_h: f64,
    /// History kept behind the newest sample; always >= `delay_h`.
    retain_h: f64,
    ramp_h: f64,
    dt_h: f64,
    samples: VecDeque<(f64, f64)>,
}

impl DelayLine {
    /// Create a delay line.
    ///
    /// `dt_h` is the nominal spacing of recorded samples; it only sizes the
    /// buffer.
    pub fn new(delay_h: f64, ramp_h: f64, dt_h: f64) -> ControlResult<Self> {
        check_delay(delay_h)?;
        if !ramp_h.is_finite() || ramp_h < 0.0 {
            return Err(ControlError::OutOfRange {
                what: "delay ramp window",
                value: ramp_h,
            });
        }
        if ensure_finite(dt_h, "delay sample spacing")? <= 0.0 {
            return Err(ControlError::OutOfRange {
                what: "delay sample spacing",
                value: dt_h,
            });
        }
        let mut line = Self {
            delay_h,
            retain_h: delay_h,
            ramp_h,
            dt_h,
            samples: VecDeque::new(),
        };
        line.samples.reserve(line.capacity());
        Ok(line)
    }

    /// Keep `retain_h` of history so the delay can later grow up to it.
    pub fn with_retention(mut self, retain_h: f64) -> ControlResult<Self> {
        check_delay(retain_h)?;
        if retain_h < self.delay_h {
            return Err(ControlError::OutOfRange {
                what: "delay retention below delay",
                value: retain_h,
            });
        }
        self.retain_h = retain_h;
        self.samples.reserve(self.capacity().saturating_sub(self.samples.len()));
        Ok(self)
    }

    pub fn delay_h(&self) -> f64 {
        self.delay_h
    }

    pub fn retain_h(&self) -> f64 {
        self.retain_h
    }

    pub fn ramp_h(&self) -> f64 {
        self.ramp_h
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples needed to cover the retention at the nominal spacing.
    pub fn capacity(&self) -> usize {
        (self.retain_h / self.dt_h).ceil() as usize + MARGIN_SAMPLES
    }

    /// Change the delay. Within the retention the delayed value is read from
    /// history already recorded. Beyond it the retention grows with the
    /// delay, and the line reads 0 until history covers the new horizon.
    pub fn set_delay(&mut self, delay_h: f64) -> ControlResult<()> {
        check_delay(delay_h)?;
        self.delay_h = delay_h;
        self.retain_h = self.retain_h.max(delay_h);
        Ok(())
    }

    /// Append a sample. A sample stamped at the same time as the last one
    /// replaces it; samples older than the last one are ignored.
    pub fn record(&mut self, t_h: f64, value: f64) {
        match self.samples.back_mut() {
            Some(last) if (t_h - last.0).abs() <= TIME_EPS_H => {
                last.1 = value;
                return;
            }
            Some(last) if t_h < last.0 => {
                trace!(t_h, last_t_h = last.0, "out-of-order delay sample ignored");
                return;
            }
            _ => {}
        }
        self.samples.push_back((t_h, value));
        self.prune();
    }

    /// Delayed, onset-ramped value at current time `t_h`.
    pub fn read(&self, t_h: f64) -> f64 {
        let since_arrival = t_h - self.delay_h;
        if since_arrival < -TIME_EPS_H {
            return 0.0;
        }
        let Some(value) = self.lookup(since_arrival) else {
            return 0.0;
        };
        value * self.ramp_factor(since_arrival)
    }

    /// Last value recorded at or before `t_h`, without delay or ramp.
    pub fn lookup(&self, t_h: f64) -> Option<f64> {
        let idx = self
            .samples
            .partition_point(|&(ts, _)| ts <= t_h + TIME_EPS_H);
        if idx == 0 {
            None
        } else {
            self.samples.get(idx - 1).map(|&(_, v)| v)
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    fn ramp_factor(&self, since_arrival_h: f64) -> f64 {
        if self.ramp_h <= 0.0 {
            1.0
        } else {
            (since_arrival_h / self.ramp_h).clamp(0.0, 1.0)
        }
    }

    /// Drop samples no future read can reach: keep the newest sample at or
    /// before the horizon plus everything after it.
    fn prune(&mut self) {
        let Some(&(latest, _)) = self.samples.back() else {
            return;
        };
        let horizon = latest - self.retain_h - MARGIN_SAMPLES as f64 * self.dt_h;
        while self.samples.len() > 1 && self.samples[1].0 <= horizon {
            self.samples.pop_front();
        }
    }
}

fn check_delay(delay_h: f64) -> ControlResult<()> {
    if delay_h.is_finite() && delay_h >= 0.0 {
        Ok(())
    } else {
        Err(ControlError::OutOfRange {
            what: "transport delay",
            value: delay_h,
        })
    }
}
