//! Bounded variability signals.
//!
//! A [`VariabilityProfile`] turns elapsed time plus a noise source into a
//! fractional multiplier around 1.0. The harmonic part is normalised by the
//! total harmonic weight so `amplitude` is the peak combined swing, and the
//! noise part is clipped at three standard deviations, so the multiplier is
//! always inside `1 ± (amplitude + 3 * noise_std)`.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::noise::NoiseSource;

/// Largest fractional swing accepted for any variability knob.
pub const MAX_FRACTION: f64 = 0.5;

const NOISE_CLIP_SIGMA: f64 = 3.0;

/// One sinusoidal component: `weight * sin(omega * t + phase)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harmonic {
    pub weight: f64,
    pub omega_rad_per_h: f64,
    pub phase_rad: f64,
}

impl Harmonic {
    pub fn new(weight: f64, omega_rad_per_h: f64, phase_rad: f64) -> Self {
        Self {
            weight,
            omega_rad_per_h,
            phase_rad,
        }
    }

    pub fn eval(&self, t_h: f64) -> f64 {
        self.weight * (self.omega_rad_per_h * t_h + self.phase_rad).sin()
    }
}

/// Fractional variability applied on top of a base signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariabilityProfile {
    /// Peak combined harmonic swing, as a fraction of the base value.
    pub amplitude: f64,
    pub harmonics: Vec<Harmonic>,
    /// Standard deviation of the zero-mean noise, as a fraction.
    pub noise_std: f64,
    /// Chance per step of a step disturbance.
    pub disturbance_probability: f64,
    /// Disturbance size, uniform in `±disturbance_amplitude` (fraction).
    pub disturbance_amplitude: f64,
}

impl Default for VariabilityProfile {
    fn default() -> Self {
        Self::off()
    }
}

impl VariabilityProfile {
    /// No variability at all.
    pub fn off() -> Self {
        Self {
            amplitude: 0.0,
            harmonics: Vec::new(),
            noise_std: 0.0,
            disturbance_probability: 0.0,
            disturbance_amplitude: 0.0,
        }
    }

    /// Flow channel: harmonics present but silent until an amplitude is set.
    pub fn flow_default() -> Self {
        Self {
            amplitude: 0.0,
            harmonics: vec![Harmonic::new(1.0, 0.3, 0.0), Harmonic::new(0.4, 0.9, 2.0)],
            ..Self::off()
        }
    }

    /// Grade channel: ±1% slow drift plus light noise.
    pub fn grade_default() -> Self {
        Self {
            amplitude: 0.01,
            harmonics: vec![
                Harmonic::new(1.0, 0.5, 1.5),
                Harmonic::new(0.5, 1.3, 0.4),
                Harmonic::new(0.25, 3.1, 2.2),
            ],
            noise_std: 0.002,
            ..Self::off()
        }
    }

    pub fn validate(&self) -> ControlResult<()> {
        check_fraction("variability amplitude", self.amplitude)?;
        check_fraction("variability noise", self.noise_std)?;
        check_fraction("disturbance amplitude", self.disturbance_amplitude)?;
        if !(0.0..=1.0).contains(&self.disturbance_probability) {
            return Err(ControlError::OutOfRange {
                what: "disturbance probability",
                value: self.disturbance_probability,
            });
        }
        for h in &self.harmonics {
            if !(h.weight.is_finite() && h.omega_rad_per_h.is_finite() && h.phase_rad.is_finite())
            {
                return Err(ControlError::InvalidArg {
                    what: "harmonic components must be finite",
                });
            }
        }
        Ok(())
    }

    /// True if the profile can move the signal at all.
    pub fn is_active(&self) -> bool {
        self.amplitude > 0.0 || self.noise_std > 0.0 || self.disturbance_probability > 0.0
    }

    /// Normalised harmonic sum in [-1, 1].
    pub fn harmonic_term(&self, t_h: f64) -> f64 {
        let total: f64 = self.harmonics.iter().map(|h| h.weight.abs()).sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.harmonics.iter().map(|h| h.eval(t_h)).sum::<f64>() / total
    }

    /// Multiplier around 1.0 at time `t_h`.
    ///
    /// `proximity` in [0, 1] scales the harmonic swing only; the noise term
    /// keeps its full level. The noise source is only drawn from when
    /// `noise_std > 0`.
    pub fn multiplier(&self, t_h: f64, proximity: f64, noise: &mut dyn NoiseSource) -> f64 {
        let scale = proximity.clamp(0.0, 1.0);
        let mut m = 1.0 + self.amplitude * scale * self.harmonic_term(t_h);
        if self.noise_std > 0.0 {
            let n = noise
                .standard_normal()
                .clamp(-NOISE_CLIP_SIGMA, NOISE_CLIP_SIGMA);
            m += self.noise_std * n;
        }
        m
    }

    /// Largest possible deviation of [`Self::multiplier`] from 1.0.
    pub fn max_swing(&self) -> f64 {
        self.amplitude + NOISE_CLIP_SIGMA * self.noise_std
    }

    /// Roll for a step disturbance; returns its fractional size if one fires.
    pub fn disturbance(&self, noise: &mut dyn NoiseSource) -> Option<f64> {
        if self.disturbance_probability <= 0.0 || self.disturbance_amplitude <= 0.0 {
            return None;
        }
        if noise.unit_uniform() < self.disturbance_probability {
            Some((2.0 * noise.unit_uniform() - 1.0) * self.disturbance_amplitude)
        } else {
            None
        }
    }
}

fn check_fraction(what: &'static str, value: f64) -> ControlResult<()> {
    if value.is_finite() && (0.0..=MAX_FRACTION).contains(&value) {
        Ok(())
    } else {
        Err(ControlError::OutOfRange { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{SeededNoise, SilentNoise};
    use proptest::prelude::*;

    #[test]
    fn off_profile_is_identity() {
        let p = VariabilityProfile::off();
        let mut noise = SeededNoise::new(1);
        for i in 0..100 {
            assert_eq!(p.multiplier(i as f64 * 0.1, 1.0, &mut noise), 1.0);
        }
        assert!(!p.is_active());
        assert!(p.disturbance(&mut noise).is_none());
    }

    #[test]
    fn flow_default_is_silent() {
        let p = VariabilityProfile::flow_default();
        assert!(!p.is_active());
        assert_eq!(p.multiplier(3.0, 1.0, &mut SilentNoise), 1.0);
    }

    #[test]
    fn harmonic_term_is_normalised() {
        let p = VariabilityProfile::grade_default();
        for i in 0..1000 {
            let h = p.harmonic_term(i as f64 * 0.05);
            assert!((-1.0..=1.0).contains(&h));
        }
    }

    #[test]
    fn zero_proximity_suppresses_harmonics_only() {
        let p = VariabilityProfile::grade_default();
        assert_eq!(p.multiplier(5.0, 0.0, &mut SilentNoise), 1.0);

        let mut noise = SeededNoise::new(9);
        let mut replay = SeededNoise::new(9);
        let n = replay.standard_normal().clamp(-3.0, 3.0);
        let m = p.multiplier(5.0, 0.0, &mut noise);
        assert!((m - (1.0 + p.noise_std * n)).abs() < 1e-15);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut p = VariabilityProfile::grade_default();
        p.amplitude = -0.1;
        assert!(p.validate().is_err());

        let mut p = VariabilityProfile::grade_default();
        p.disturbance_probability = 1.5;
        assert!(p.validate().is_err());

        let mut p = VariabilityProfile::grade_default();
        p.harmonics.push(Harmonic::new(f64::NAN, 1.0, 0.0));
        assert!(p.validate().is_err());

        assert!(VariabilityProfile::grade_default().validate().is_ok());
    }

    #[test]
    fn certain_disturbance_fires_within_bounds() {
        let p = VariabilityProfile {
            disturbance_probability: 1.0,
            disturbance_amplitude: 0.05,
            ..VariabilityProfile::off()
        };
        let mut noise = SeededNoise::new(5);
        for _ in 0..100 {
            let d = p.disturbance(&mut noise).unwrap();
            assert!(d.abs() <= 0.05);
        }
    }

    proptest! {
        #[test]
        fn multiplier_stays_bounded(seed in any::<u64>(), t in 0.0_f64..500.0, amp in 0.0_f64..0.05) {
            let p = VariabilityProfile { amplitude: amp, ..VariabilityProfile::grade_default() };
            let mut noise = SeededNoise::new(seed);
            let m = p.multiplier(t, 1.0, &mut noise);
            prop_assert!((m - 1.0).abs() <= p.max_swing() + 1e-12);
        }
    }
}
