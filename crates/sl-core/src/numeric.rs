use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
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
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Gate used by tunable-parameter setters: finite and not negative.
///
/// Negative zero counts as zero, so dumps carrying `-0.0` in a tunable
/// field re-import cleanly.
pub fn ensure_nonneg(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if !v.is_finite() {
        Err(CoreError::NonFinite { what, value: v })
    } else if v < 0.0 {
        Err(CoreError::InvalidArg { what })
    } else {
        Ok(v)
    }
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
    fn ensure_nonneg_rejects_negative_and_nan() {
        assert!(ensure_nonneg(0.0, "x").is_ok());
        assert!(ensure_nonneg(3.5, "x").is_ok());
        assert_eq!(ensure_nonneg(-0.0, "x").unwrap(), 0.0);
        assert!(ensure_nonneg(-1.0, "x").is_err());
        assert!(ensure_nonneg(Real::INFINITY, "x").is_err());
        assert!(ensure_nonneg(Real::NAN, "x").is_err());
    }
}
