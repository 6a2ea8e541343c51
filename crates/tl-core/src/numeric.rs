use crate::{TlError, TlResult};

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
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
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> TlResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TlError::NonFinite { what, value: v })
    }
}

/// Validate an inclusive `[min, max]` pair. `min == max` is allowed.
pub fn ensure_bounds(min: Real, max: Real, what: &'static str) -> TlResult<(Real, Real)> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(TlError::InvalidBounds { what, min, max });
    }
    Ok((min, max))
}

/// Time step usable for integration, or `None` when the step is zero,
/// negative or non-finite.
#[inline]
pub fn sanitize_dt(dt: Real) -> Option<Real> {
    if dt.is_finite() && dt > 0.0 {
        Some(dt)
    } else {
        None
    }
}

/// Round to a fixed number of decimal places, ties to even.
///
/// Rounding happens on the scaled binary value, so `45.25` gives `45.2`.
/// A value whose decimal form only looks like a tie (`0.15` is stored just
/// below it) can still land on the other side of a correctly rounded
/// decimal result.
pub fn round_to_decimals(v: Real, decimals: u32) -> Real {
    if !v.is_finite() {
        return v;
    }
    let scale = 10f64.powi(decimals as i32);
    (v * scale).round_ties_even() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn bounds_reject_inverted_and_nan() {
        assert!(ensure_bounds(0.0, 300.0, "out").is_ok());
        assert!(ensure_bounds(5.0, 5.0, "out").is_ok());
        assert!(ensure_bounds(1.0, 0.0, "out").is_err());
        assert!(ensure_bounds(Real::NAN, 1.0, "out").is_err());
    }

    #[test]
    fn sanitize_dt_filters_degenerate_steps() {
        assert_eq!(sanitize_dt(0.01), Some(0.01));
        assert_eq!(sanitize_dt(0.0), None);
        assert_eq!(sanitize_dt(-1.0), None);
        assert_eq!(sanitize_dt(Real::NAN), None);
        assert_eq!(sanitize_dt(Real::INFINITY), None);
    }

    #[test]
    fn rounding_keeps_display_precision() {
        assert_eq!(round_to_decimals(45.26, 1), 45.3);
        assert_eq!(round_to_decimals(44.94, 1), 44.9);
        assert_eq!(round_to_decimals(-2.25, 0), -2.0);
        assert_eq!(round_to_decimals(12.345, 0), 12.0);
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(round_to_decimals(45.25, 1), 45.2);
        assert_eq!(round_to_decimals(45.75, 1), 45.8);
        assert_eq!(round_to_decimals(2.5, 0), 2.0);
        assert_eq!(round_to_decimals(-3.5, 0), -4.0);
    }
}
