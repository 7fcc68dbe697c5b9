use crate::{CoreError, CoreResult};

/// Tonnes, hours and fractions are all plain `f64` once they leave `uom`.
pub type Real = f64;

/// Closeness test for delay lengths and mass comparisons.
///
/// `abs` covers values near zero (an empty line, a zero delay); `rel`
/// covers holdups in the thousands of tonnes.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// `|value - reference| / |reference|`, or `|value|` against a zero reference.
///
/// Used to compare a simulated holdup against its steady-state prediction.
pub fn rel_error(value: Real, reference: Real) -> Real {
    if reference == 0.0 {
        return value.abs();
    }
    ((value - reference) / reference).abs()
}

/// Rejects NaN and infinities in configuration values (time constants,
/// step sizes) before they reach the balance.
pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if !v.is_finite() {
        return Err(CoreError::NonFinite { what, value: v });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn delay_lengths_compare_within_tolerance() {
        let tol = Tolerances::default();
        let recirc_h = 90.0 / 60.0;
        assert!(nearly_equal(recirc_h, 1.5, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.5, 1.5 + 1.0 / 60.0, tol));
    }

    #[test]
    fn rel_error_against_holdup_and_zero() {
        assert_eq!(rel_error(0.5, 0.0), 0.5);
        assert!((rel_error(2214.0, 2214.0 * 1.01) - 0.01 / 1.01).abs() < 1e-12);
    }

    #[test]
    fn ensure_finite_rejects_nan_and_infinity() {
        let err = ensure_finite(Real::NAN, "tau").unwrap_err();
        assert!(format!("{err}").contains("Non-finite"));
        assert!(ensure_finite(Real::INFINITY, "dt").is_err());
        assert_eq!(ensure_finite(0.25, "ramp").unwrap(), 0.25);
    }

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let tol = Tolerances::default();
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
            prop_assert!(nearly_equal(a, a, tol));
        }

        #[test]
        fn rel_error_is_non_negative_and_zero_on_match(
            value in -1e6f64..1e6,
            reference in -1e6f64..1e6,
        ) {
            prop_assert!(rel_error(value, reference) >= 0.0);
            prop_assert_eq!(rel_error(reference, reference), 0.0);
        }
    }
}
