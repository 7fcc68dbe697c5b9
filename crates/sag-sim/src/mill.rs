//! Lumped mass balance of the SAG mill holdup.
//!
//! Three inventories (dry solids, water, copper) are integrated with explicit
//! Euler. Discharge is linear in holdup, `D = k * M`, so for a constant
//! solids feed `F_in` the holdup settles at `M_eq = F_in / k`.
//!
//! All flows are t/h, masses t, `dt` h. Nothing is rescaled inside the step.

use sag_core::units::{as_tonnes, hours, tph, unitless, water_per_solids};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::params::Parameters;

/// Below this the grade ratio is not trusted and feed grade is used.
pub const SOLIDS_FLOOR_T: f64 = 10.0;
pub const WATER_FLOOR_T: f64 = 1.0;

/// Holdup of the mill.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MillInventory {
    pub solids_t: f64,
    pub water_t: f64,
    pub copper_t: f64,
}

impl MillInventory {
    /// Copper grade of the holdup, or `fallback` when the mill is too empty
    /// for the ratio to mean anything.
    pub fn grade_or(&self, fallback: f64) -> f64 {
        if self.solids_t < SOLIDS_FLOOR_T {
            fallback
        } else {
            self.copper_t / self.solids_t
        }
    }

    /// water / (solids + water)
    pub fn moisture(&self) -> f64 {
        let total = self.solids_t + self.water_t;
        if total > 0.0 { self.water_t / total } else { 0.0 }
    }

    fn apply_floors(&mut self) {
        self.solids_t = self.solids_t.max(SOLIDS_FLOOR_T);
        self.water_t = self.water_t.max(WATER_FLOOR_T);
        self.copper_t = self.copper_t.max(0.0);
    }
}

/// Streams entering the mill over one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MillInputs {
    pub feed_flow_tph: f64,
    pub feed_grade: f64,
    pub recirc_flow_tph: f64,
}

/// Flows and derivatives evaluated at the start of a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MillRates {
    pub mill_grade: f64,
    pub moisture: f64,
    pub total_solids_in_tph: f64,
    pub blended_grade: f64,
    pub discharge_tph: f64,
    pub feed_water_tph: f64,
    pub recirc_water_tph: f64,
    pub additional_water_tph: f64,
    pub water_out_tph: f64,
    pub copper_in_tph: f64,
    pub copper_out_tph: f64,
    pub d_solids_tph: f64,
    pub d_water_tph: f64,
    pub d_copper_tph: f64,
}

/// Coefficients of the mill balance.
#[derive(Clone, Debug, PartialEq)]
pub struct MillBalance {
    k_per_h: f64,
    feed_water_ratio: f64,
    recirc_water_ratio: f64,
    target_water_ratio: f64,
}

impl MillBalance {
    /// Build a balance from raw coefficients.
    ///
    /// Only requires `k > 0`; the operating range of `k` is enforced by
    /// [`Parameters::validate`].
    pub fn new(
        k_per_h: f64,
        feed_moisture: f64,
        recirc_moisture: f64,
        mill_moisture: f64,
    ) -> SimResult<Self> {
        if !k_per_h.is_finite() || k_per_h <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: "k_discharge",
                value: k_per_h,
                reason: "must be finite and positive",
            });
        }
        for (name, h) in [
            ("feed_moisture", feed_moisture),
            ("recirc_moisture", recirc_moisture),
            ("mill_moisture", mill_moisture),
        ] {
            if !h.is_finite() || !(0.0..1.0).contains(&h) {
                return Err(SimError::InvalidParameter {
                    name,
                    value: h,
                    reason: "must lie in [0, 1)",
                });
            }
        }
        Ok(Self {
            k_per_h,
            feed_water_ratio: water_per_solids(unitless(feed_moisture)),
            recirc_water_ratio: water_per_solids(unitless(recirc_moisture)),
            target_water_ratio: water_per_solids(unitless(mill_moisture)),
        })
    }

    pub fn from_parameters(params: &Parameters) -> SimResult<Self> {
        Self::new(
            params.k_discharge_per_h,
            params.feed_moisture,
            params.recirc_moisture,
            params.mill_moisture,
        )
    }

    pub fn k_per_h(&self) -> f64 {
        self.k_per_h
    }

    /// Holdup at which discharge balances a solids feed of `total_in_tph`.
    pub fn equilibrium_solids_t(&self, total_in_tph: f64) -> f64 {
        // Residence time 1/k at the feed rate.
        as_tonnes(tph(total_in_tph) * hours(1.0 / self.k_per_h))
    }

    /// Evaluate flows and time derivatives for the current holdup.
    pub fn rates(&self, inv: &MillInventory, inputs: &MillInputs) -> MillRates {
        let mill_grade = inv.grade_or(inputs.feed_grade);
        let moisture = inv.moisture();

        let feed = inputs.feed_flow_tph.max(0.0);
        let recirc = inputs.recirc_flow_tph.max(0.0);
        let total_in = feed + recirc;

        // Oversize returns at the grade of the material that left the mill.
        let blended_grade = if total_in > 0.0 {
            (inputs.feed_grade * feed + mill_grade * recirc) / total_in
        } else {
            inputs.feed_grade
        };

        let discharge = self.k_per_h * inv.solids_t;

        let feed_water = feed * self.feed_water_ratio;
        let recirc_water = recirc * self.recirc_water_ratio;
        let needed_water = total_in * self.target_water_ratio;
        let additional_water = (needed_water - feed_water - recirc_water).max(0.0);
        let water_out = discharge * water_per_solids(unitless(moisture));

        let copper_in = blended_grade * total_in;
        let copper_out = mill_grade * discharge;

        MillRates {
            mill_grade,
            moisture,
            total_solids_in_tph: total_in,
            blended_grade,
            discharge_tph: discharge,
            feed_water_tph: feed_water,
            recirc_water_tph: recirc_water,
            additional_water_tph: additional_water,
            water_out_tph: water_out,
            copper_in_tph: copper_in,
            copper_out_tph: copper_out,
            d_solids_tph: total_in - discharge,
            d_water_tph: feed_water + recirc_water + additional_water - water_out,
            d_copper_tph: copper_in - copper_out,
        }
    }

    /// Advance the holdup by `dt_h` and apply the physical floors.
    /// Returns the rates the step was taken with.
    pub fn step(&self, inv: &mut MillInventory, inputs: &MillInputs, dt_h: f64) -> MillRates {
        let rates = self.rates(inv, inputs);
        inv.solids_t += rates.d_solids_tph * dt_h;
        inv.water_t += rates.d_water_tph * dt_h;
        inv.copper_t += rates.d_copper_tph * dt_h;
        inv.apply_floors();
        rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(k: f64) -> MillBalance {
        MillBalance::new(k, 0.035, 0.08, 0.30).unwrap()
    }

    fn inputs(feed: f64, recirc: f64) -> MillInputs {
        MillInputs {
            feed_flow_tph: feed,
            feed_grade: 0.0072,
            recirc_flow_tph: recirc,
        }
    }

    #[test]
    fn rejects_bad_coefficients() {
        assert!(MillBalance::new(0.0, 0.035, 0.08, 0.3).is_err());
        assert!(MillBalance::new(-0.5, 0.035, 0.08, 0.3).is_err());
        assert!(MillBalance::new(1.0, 1.0, 0.08, 0.3).is_err());
        assert!(MillBalance::new(1.0, 0.035, 0.08, f64::NAN).is_err());
    }

    #[test]
    fn equilibrium_holdup_is_fixed_point() {
        let b = balance(0.5);
        let total = 2000.0 + 220.0;
        let inv = MillInventory {
            solids_t: b.equilibrium_solids_t(total),
            water_t: 1000.0,
            copper_t: 30.0,
        };
        let r = b.rates(&inv, &inputs(2000.0, 220.0));
        assert!(r.d_solids_tph.abs() < 1e-9);
        assert!((inv.solids_t - 4440.0).abs() < 1e-9);
    }

    #[test]
    fn converges_to_feed_over_k() {
        let b = balance(1.0);
        let mut inv = MillInventory {
            solids_t: 10.0,
            water_t: 5.0,
            copper_t: 0.072,
        };
        let dt = 1.0 / 60.0;
        for _ in 0..(20 * 60) {
            b.step(&mut inv, &inputs(1800.0, 200.0), dt);
        }
        assert!((inv.solids_t - 2000.0).abs() / 2000.0 < 1e-3);
        // Copper settles at feed grade when recirculated grade equals mill grade.
        assert!((inv.copper_t / inv.solids_t - 0.0072).abs() < 1e-5);
        // Water dosed up to the target moisture.
        assert!((inv.moisture() - 0.30).abs() < 1e-3);
    }

    #[test]
    fn vanishing_k_has_no_loss_term() {
        let b = balance(1e-9);
        let inv = MillInventory {
            solids_t: 500.0,
            water_t: 200.0,
            copper_t: 3.6,
        };
        let r = b.rates(&inv, &inputs(1500.0, 100.0));
        assert!((r.d_solids_tph - 1600.0).abs() < 1e-5);
        assert!(r.discharge_tph < 1e-6);
    }

    #[test]
    fn additional_water_is_never_negative() {
        // Very wet feed already exceeds target moisture.
        let b = MillBalance::new(1.0, 0.5, 0.5, 0.2).unwrap();
        let inv = MillInventory {
            solids_t: 100.0,
            water_t: 20.0,
            copper_t: 0.7,
        };
        let r = b.rates(&inv, &inputs(1000.0, 100.0));
        assert_eq!(r.additional_water_tph, 0.0);
        assert!((r.feed_water_tph - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn blended_grade_weights_by_flow() {
        let b = balance(1.0);
        let inv = MillInventory {
            solids_t: 100.0,
            water_t: 40.0,
            copper_t: 1.0, // 1% in the mill
        };
        let r = b.rates(&inv, &inputs(900.0, 100.0));
        let expected = (0.0072 * 900.0 + 0.01 * 100.0) / 1000.0;
        assert!((r.blended_grade - expected).abs() < 1e-12);

        let r = b.rates(&inv, &inputs(0.0, 0.0));
        assert_eq!(r.blended_grade, 0.0072);
    }

    #[test]
    fn floors_hold_when_feed_stops() {
        let b = balance(2.0);
        let mut inv = MillInventory {
            solids_t: 50.0,
            water_t: 3.0,
            copper_t: 0.2,
        };
        for _ in 0..10_000 {
            b.step(&mut inv, &inputs(0.0, 0.0), 1.0 / 60.0);
            assert!(inv.solids_t >= SOLIDS_FLOOR_T);
            assert!(inv.water_t >= WATER_FLOOR_T);
            assert!(inv.copper_t >= 0.0);
        }
    }

    #[test]
    fn grade_falls_back_when_nearly_empty() {
        let inv = MillInventory {
            solids_t: 1.0,
            water_t: 1.0,
            copper_t: 0.5,
        };
        assert_eq!(inv.grade_or(0.0072), 0.0072);
    }
}
