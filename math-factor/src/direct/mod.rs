//! Direct factorizations
//!
//! This module provides the two elimination engines:
//! - [`lu_decompose`]: Doolittle LU, no pivoting (`A = L·U`)
//! - [`cholesky_decompose`]: Cholesky for SPD matrices (`A = L·Lᵗ`)
//!
//! Both run a sequential loop over the elimination step and hand each inner
//! loop to a [`LoopScheduler`](crate::parallel::LoopScheduler), so the same
//! code serves the sequential, static and dynamic variants.

mod cholesky;
mod lu;

pub use cholesky::{CholeskyFactorization, cholesky_decompose};
pub use lu::{LuFactorization, lu_decompose};

use crate::dense::max_abs;
use crate::traits::Scalar;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// What the engines do with a vanishing or non-finite pivot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PivotCheck {
    /// Fail with a typed error when `|pivot| <= relative_tolerance * max|A|`
    /// or the pivot is not finite.
    Strict {
        /// Tolerance relative to the largest entry of `A`
        relative_tolerance: f64,
    },
    /// Divide regardless; infinities and NaN propagate into later entries.
    Unchecked,
}

impl Default for PivotCheck {
    fn default() -> Self {
        PivotCheck::Strict {
            relative_tolerance: f64::EPSILON,
        }
    }
}

impl PivotCheck {
    /// Absolute tolerance for input `a`, or `None` when unchecked.
    pub fn tolerance<T: Scalar>(&self, a: &Array2<T>) -> Option<T> {
        match *self {
            PivotCheck::Strict { relative_tolerance } => {
                Some(T::from_f64_lossy(relative_tolerance) * max_abs(a))
            }
            PivotCheck::Unchecked => None,
        }
    }
}

/// Factorization configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactorConfig {
    /// Pivot validation policy
    pub pivot_check: PivotCheck,
    /// Log progress every N elimination steps (0 = no output)
    pub progress_interval: usize,
}

impl FactorConfig {
    /// Configuration that reproduces silent NaN propagation on bad pivots.
    pub fn unchecked() -> Self {
        Self {
            pivot_check: PivotCheck::Unchecked,
            ..Self::default()
        }
    }

    /// Sets the pivot validation policy.
    pub fn pivot_check(mut self, pivot_check: PivotCheck) -> Self {
        self.pivot_check = pivot_check;
        self
    }

    /// Sets the progress logging interval.
    pub fn progress_interval(mut self, steps: usize) -> Self {
        self.progress_interval = steps;
        self
    }

    pub(crate) fn report_progress(&self, name: &str, step: usize, n: usize) {
        log::trace!("{name} step {step} finalized");
        if self.progress_interval > 0 && (step + 1) % self.progress_interval == 0 {
            log::info!("{name} step {}/{n}", step + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_tolerance_scales_with_input() {
        let a = array![[2.0_f64, -8.0], [1.0, 0.5]];
        let tol = PivotCheck::default().tolerance(&a).unwrap();
        assert_eq!(tol, 8.0 * f64::EPSILON);
        assert!(PivotCheck::Unchecked.tolerance(&a).is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = FactorConfig::default().progress_interval(10);
        assert_eq!(config.progress_interval, 10);
        assert_eq!(config.pivot_check, PivotCheck::default());
        assert_eq!(FactorConfig::unchecked().pivot_check, PivotCheck::Unchecked);
    }
}
