//! Cholesky factorization for symmetric positive-definite matrices
//!
//! Computes lower triangular `L` with `A = L·Lᵗ`, column by column. For
//! column `j` the diagonal comes first,
//!
//! ```text
//! L[j][j] = sqrt(A[j][j] - sum_{k<j} L[j][k]^2)
//! ```
//!
//! and then every entry below it, as one inner loop over `i in [j + 1, n)`:
//!
//! ```text
//! L[i][j] = (A[i][j] - sum_{k<j} L[i][k] L[j][k]) / L[j][j]
//! ```
//!
//! Entries of one column only read columns `< j` and the diagonal `L[j][j]`,
//! so the inner loop has no dependency between its iterations. (Walking the
//! same formulas row by row would make `L[i][j]` depend on `L[i][j-1]` within
//! one step.) The strict upper triangle of `A` is never read.

use super::FactorConfig;
use crate::dense::{check_output, check_square, prefix_dot};
use crate::error::{FactorError, Result};
use crate::parallel::LoopScheduler;
use crate::traits::Scalar;
use ndarray::{Array1, Array2, ArrayView1, s};

/// Cholesky factorization into a caller-owned buffer.
///
/// Only the lower triangle (diagonal included) of `l` is written; the upper
/// triangle must already be zero for `L·Lᵗ` to reproduce `A`.
///
/// # Errors
///
/// Shape errors, and `NotPositiveDefinite` when a diagonal radicand fails the
/// configured pivot check. On error, columns before the failing one are
/// already written.
pub fn cholesky_decompose<T, S>(
    a: &Array2<T>,
    l: &mut Array2<T>,
    scheduler: &S,
    config: &FactorConfig,
) -> Result<()>
where
    T: Scalar,
    S: LoopScheduler,
{
    let n = check_square(a)?;
    check_output(l, n)?;

    let tolerance = config.pivot_check.tolerance(a);
    log::debug!(
        "Cholesky: n={n}, schedule={}, threads={}",
        scheduler.schedule(),
        scheduler.num_threads()
    );

    let mut column = vec![T::zero(); n];
    for j in 0..n {
        let radicand = a[[j, j]] - prefix_dot(l.row(j), l.row(j), j);
        if tolerance.is_some_and(|tol| radicand.is_degenerate(tol) || radicand < T::zero()) {
            log::warn!(
                "Cholesky: radicand {:e} at column {j}",
                radicand.to_f64_lossy()
            );
            return Err(FactorError::NotPositiveDefinite {
                step: j,
                radicand: radicand.to_f64_lossy(),
            });
        }
        let diag = radicand.sqrt();
        l[[j, j]] = diag;

        {
            let lv = l.view();
            scheduler.fill(j + 1, &mut column[..n - j - 1], |i| {
                (a[[i, j]] - prefix_dot(lv.row(i), lv.row(j), j)) / diag
            });
        }
        l.slice_mut(s![j + 1.., j]).assign(&ArrayView1::from(&column[..n - j - 1]));

        config.report_progress("Cholesky", j, n);
    }

    Ok(())
}

/// Owned Cholesky factorization result
#[derive(Debug, Clone)]
pub struct CholeskyFactorization<T: Scalar> {
    /// Lower triangular factor
    pub l: Array2<T>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: Scalar> CholeskyFactorization<T> {
    /// Factor `a` into a freshly zeroed buffer.
    pub fn compute<S: LoopScheduler>(
        a: &Array2<T>,
        scheduler: &S,
        config: &FactorConfig,
    ) -> Result<Self> {
        let n = check_square(a)?;
        let mut l = Array2::zeros((n, n));
        cholesky_decompose(a, &mut l, scheduler, config)?;
        Ok(Self { l, n })
    }

    /// Solve `Ax = b` via `Ly = b` then `Lᵗx = y`.
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>> {
        if b.len() != self.n {
            return Err(FactorError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        if let Some(i) = (0..self.n).find(|&i| self.l[[i, i]].is_degenerate(T::zero())) {
            let l_ii = self.l[[i, i]];
            return Err(FactorError::NotPositiveDefinite {
                step: i,
                radicand: (l_ii * l_ii).to_f64_lossy(),
            });
        }

        let mut x = b.clone();

        for i in 0..self.n {
            let sum = prefix_dot(self.l.row(i), x.view(), i);
            x[i] = (x[i] - sum) / self.l[[i, i]];
        }

        for i in (0..self.n).rev() {
            let mut sum = T::zero();
            for k in (i + 1)..self.n {
                sum += self.l[[k, i]] * x[k];
            }
            x[i] = (x[i] - sum) / self.l[[i, i]];
        }

        Ok(x)
    }

    /// `ln det(A) = 2 * sum(ln L[j][j])`, safe from overflow for large `n`.
    pub fn log_determinant(&self) -> T {
        let two = T::one() + T::one();
        two * self.l.diag().iter().fold(T::zero(), |acc, &d| acc + d.ln())
    }

    /// Determinant of `A`.
    pub fn determinant(&self) -> T {
        let det_l = self.l.diag().iter().fold(T::one(), |acc, &d| acc * d);
        det_l * det_l
    }

    /// `L·Lᵗ`, which should reproduce `A`.
    pub fn reconstruct(&self) -> Array2<T> {
        self.l.dot(&self.l.t())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::{is_lower_triangular, max_abs_diff};
    use crate::parallel::{Scheduler, Sequential};
    use crate::schedule::Schedule;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn schedulers() -> Vec<Scheduler> {
        vec![
            Scheduler::new(Schedule::Sequential, 1).unwrap(),
            Scheduler::new(
                Schedule::Static {
                    chunk_size: Some(1),
                },
                2,
            )
            .unwrap(),
            Scheduler::new(Schedule::dynamic(), 4).unwrap(),
        ]
    }

    #[test]
    fn test_cholesky_example() {
        let a = array![[4.0_f64, 2.0], [2.0, 3.0]];
        for scheduler in schedulers() {
            let chol = CholeskyFactorization::compute(&a, &scheduler, &FactorConfig::default())
                .expect("Cholesky should succeed");
            assert_relative_eq!(chol.l[[0, 0]], 2.0);
            assert_relative_eq!(chol.l[[1, 0]], 1.0);
            assert_relative_eq!(chol.l[[1, 1]], 2.0_f64.sqrt(), epsilon = 1e-15);
            assert_eq!(chol.l[[0, 1]], 0.0);
            assert!(max_abs_diff(&chol.reconstruct(), &a).unwrap() < 1e-9);
        }
    }

    #[test]
    fn test_cholesky_3x3() {
        let a = array![
            [25.0_f64, 15.0, -5.0],
            [15.0, 18.0, 0.0],
            [-5.0, 0.0, 11.0]
        ];
        let chol =
            CholeskyFactorization::compute(&a, &Sequential, &FactorConfig::default()).unwrap();
        let expected = array![[5.0, 0.0, 0.0], [3.0, 3.0, 0.0], [-1.0, 1.0, 3.0]];
        assert!(max_abs_diff(&chol.l, &expected).unwrap() < 1e-12);
        assert!(is_lower_triangular(&chol.l));
        assert_relative_eq!(chol.determinant(), 2025.0, epsilon = 1e-9);
        assert_relative_eq!(chol.log_determinant(), 2025.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_cholesky_single_element() {
        let a = array![[9.0_f64]];
        let chol =
            CholeskyFactorization::compute(&a, &Sequential, &FactorConfig::default()).unwrap();
        assert_eq!(chol.l, array![[3.0]]);
    }

    #[test]
    fn test_cholesky_empty() {
        let a = Array2::<f64>::zeros((0, 0));
        let chol =
            CholeskyFactorization::compute(&a, &Sequential, &FactorConfig::default()).unwrap();
        assert_eq!(chol.n, 0);
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let chol =
            CholeskyFactorization::compute(&a, &Sequential, &FactorConfig::default()).unwrap();
        let b = array![1.0_f64, 2.0];
        let x = chol.solve(&b).unwrap();
        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cholesky_not_spd() {
        // Symmetric but indefinite: second radicand is 1 - 4 = -3
        let a = array![[1.0_f64, 2.0], [2.0, 1.0]];
        let err = CholeskyFactorization::compute(&a, &Sequential, &FactorConfig::default())
            .expect_err("indefinite matrix must be rejected");
        match err {
            FactorError::NotPositiveDefinite { step, radicand } => {
                assert_eq!(step, 1);
                assert_relative_eq!(radicand, -3.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cholesky_unchecked_yields_nan() {
        let a = array![[1.0_f64, 2.0, 0.0], [2.0, 1.0, 1.0], [0.0, 1.0, 5.0]];
        for scheduler in schedulers() {
            let chol =
                CholeskyFactorization::compute(&a, &scheduler, &FactorConfig::unchecked()).unwrap();
            assert!(chol.l[[1, 1]].is_nan());
            assert!(chol.l[[2, 1]].is_nan());
        }
    }

    #[test]
    fn test_cholesky_solve_rejects_degenerate_factor() {
        let a = array![[1.0_f64, 2.0], [2.0, 1.0]];
        let chol =
            CholeskyFactorization::compute(&a, &Sequential, &FactorConfig::unchecked()).unwrap();
        assert!(chol.l[[1, 1]].is_nan());
        let err = chol.solve(&array![1.0_f64, 1.0]).unwrap_err();
        assert!(matches!(err, FactorError::NotPositiveDefinite { step: 1, .. }));
    }

    #[test]
    fn test_cholesky_leaves_upper_triangle_alone() {
        let a = array![[4.0_f64, 2.0], [2.0, 3.0]];
        let mut l = Array2::from_elem((2, 2), 7.0);
        cholesky_decompose(&a, &mut l, &Sequential, &FactorConfig::default()).unwrap();
        assert_eq!(l[[0, 1]], 7.0);
        assert_eq!(l[[0, 0]], 2.0);
    }
}
