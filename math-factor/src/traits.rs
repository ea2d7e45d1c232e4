//! Scalar abstraction shared by both engines
//!
//! The engines are written once over [`Scalar`], which is implemented for
//! `f64` (the default everywhere) and `f32`.

use ndarray::LinalgScalar;
use num_traits::{Float, NumAssign};
use std::fmt::{Debug, Display};

/// Real floating-point element type of a factorized matrix.
///
/// Besides float arithmetic the engines need values that can cross thread
/// boundaries, `ndarray` products for reconstruction, and a bridge to `f64`
/// for error payloads and tolerances.
pub trait Scalar:
    Float + NumAssign + LinalgScalar + Send + Sync + Debug + Display + Default + 'static
{
    /// Convert from `f64`, rounding if the target is narrower.
    fn from_f64_lossy(value: f64) -> Self;

    /// Widen to `f64` (used in error payloads and logs).
    fn to_f64_lossy(self) -> f64;

    /// Check if this value is non-finite or no larger than `tol` in magnitude
    fn is_degenerate(self, tol: Self) -> bool {
        !self.is_finite() || self.abs() <= tol
    }
}

impl Scalar for f64 {
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self
    }
}

impl Scalar for f32 {
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        f64::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_f64_scalar() {
        let x = f64::from_f64_lossy(2.5);
        assert_relative_eq!(x.to_f64_lossy(), 2.5);
        assert!(!x.is_degenerate(1e-12));
        assert!(0.0_f64.is_degenerate(0.0));
        assert!(f64::NAN.is_degenerate(0.0));
        assert!(f64::INFINITY.is_degenerate(1e-12));
        assert!((-1e-14_f64).is_degenerate(1e-12));
    }

    #[test]
    fn test_f32_scalar() {
        let x = f32::from_f64_lossy(0.1);
        assert_relative_eq!(x.to_f64_lossy(), 0.1, epsilon = 1e-7);
        assert!(f32::NEG_INFINITY.is_degenerate(0.0));
        assert!(!1.0_f32.is_degenerate(f32::EPSILON));
    }
}
