//! Step decimation for history recording.
//!
//! History is sampled every N integration steps. N is a fixed count chosen at
//! construction, independent of the step size.

use serde::{Deserialize, Serialize};

/// Counts steps and fires on every `every`-th one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decimator {
    every: usize,
    count: u64,
}

impl Decimator {
    /// Create a decimator firing every `every` steps (0 is treated as 1).
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            count: 0,
        }
    }

    pub fn every(&self) -> usize {
        self.every
    }

    /// Steps counted since construction or the last reset.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Count one step; returns `true` if this step should be recorded.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        self.count % self.every as u64 == 0
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_every_nth_step() {
        let mut d = Decimator::new(10);
        let fired: Vec<u64> = (0..35).filter_map(|_| d.tick().then(|| d.count())).collect();
        assert_eq!(fired, vec![10, 20, 30]);
    }

    #[test]
    fn zero_means_every_step() {
        let mut d = Decimator::new(0);
        assert_eq!(d.every(), 1);
        assert!(d.tick());
        assert!(d.tick());
    }

    #[test]
    fn reset_restarts_count() {
        let mut d = Decimator::new(3);
        d.tick();
        d.tick();
        d.reset();
        assert_eq!(d.count(), 0);
        assert!(!d.tick());
        assert!(!d.tick());
        assert!(d.tick());
    }
}
