// sag-core/src/units.rs
//
// Internal state is plain f64 with the unit in the field name (`_t`, `_tph`,
// `_h`). These helpers are the single place where operator-facing units are
// converted, so the integrator never rescales flows itself.

use uom::si::f64::{Mass as UomMass, MassRate as UomMassRate, Ratio as UomRatio, Time as UomTime};
use uom::si::mass::ton;
use uom::si::ratio::ratio;
use uom::si::time::{hour, minute};

// Public canonical unit types (SI, f64)
pub type Mass = UomMass;
pub type MassRate = UomMassRate;
pub type Ratio = UomRatio;
pub type Time = UomTime;

/// Metric tonnes.
#[inline]
pub fn tonnes(v: f64) -> Mass {
    Mass::new::<ton>(v)
}

/// Tonnes per hour.
#[inline]
pub fn tph(v: f64) -> MassRate {
    tonnes(v) / hours(1.0)
}

#[inline]
pub fn hours(v: f64) -> Time {
    Time::new::<hour>(v)
}

#[inline]
pub fn minutes(v: f64) -> Time {
    Time::new::<minute>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    Ratio::new::<ratio>(v)
}

#[inline]
pub fn as_tonnes(m: Mass) -> f64 {
    m.get::<ton>()
}

#[inline]
pub fn as_tph(rate: MassRate) -> f64 {
    as_tonnes(rate * hours(1.0))
}

#[inline]
pub fn as_hours(t: Time) -> f64 {
    t.get::<hour>()
}

#[inline]
pub fn as_minutes(t: Time) -> f64 {
    t.get::<minute>()
}

/// Convert an operator-facing delay in minutes to model hours.
#[inline]
pub fn minutes_to_hours(v: f64) -> f64 {
    as_hours(minutes(v))
}

/// Moisture (water / total) to water-to-solids ratio.
///
/// A stream with moisture `h` carries `h / (1 - h)` tonnes of water per tonne
/// of dry solids. Returns 0 for `h <= 0` and is undefined for `h >= 1`.
#[inline]
pub fn water_per_solids(moisture: Ratio) -> f64 {
    let h = moisture.get::<ratio>();
    if h <= 0.0 { 0.0 } else { h / (1.0 - h) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _m = tonnes(4000.0);
        let _f = tph(2000.0);
        let _t = hours(10.0);
        let _d = minutes(90.0);
        let _r = unitless(0.3);
    }

    #[test]
    fn minutes_convert_to_hours() {
        assert!((minutes_to_hours(90.0) - 1.5).abs() < 1e-12);
        assert!((minutes_to_hours(48.0) - 0.8).abs() < 1e-12);
        assert!((as_minutes(hours(0.25)) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn flow_times_time_is_mass() {
        let mass = tph(2000.0) * hours(0.5);
        assert!((as_tonnes(mass) - 1000.0).abs() < 1e-9);
        assert!((as_tph(tph(1994.68)) - 1994.68).abs() < 1e-9);
    }

    #[test]
    fn water_ratio_from_moisture() {
        assert!((water_per_solids(unitless(0.30)) - 0.3 / 0.7).abs() < 1e-12);
        assert_eq!(water_per_solids(unitless(0.0)), 0.0);
    }
}
