//! LU decomposition, Doolittle's method
//!
//! Factors a square matrix as `A = L·U` with `L` unit lower triangular and `U`
//! upper triangular. There is no pivoting: a zero `U[k][k]` breaks the
//! recurrence and is reported through [`PivotCheck`](super::PivotCheck).

use super::FactorConfig;
use crate::dense::{check_output, check_square, prefix_dot};
use crate::error::{FactorError, Result};
use crate::parallel::LoopScheduler;
use crate::traits::Scalar;
use ndarray::{Array1, Array2, ArrayView1, s};

/// Doolittle LU decomposition into caller-owned buffers.
///
/// For each step `k`, row `k` of `U` is computed as one inner loop over
/// `j in [k, n)`, then column `k` of `L` as a second inner loop over
/// `i in [k + 1, n)`. Each inner loop only reads rows/columns finalized
/// before it started, so `scheduler` may run its iterations in any order.
///
/// Only the diagonal and strict lower triangle of `l` and the upper triangle of
/// `u` are written; both buffers must be zero beforehand for `L·U` to
/// reproduce `A`.
///
/// # Errors
///
/// Shape errors, and `SingularPivot` when a pivot fails the configured check.
/// On a pivot error, steps before the failing one are already written.
pub fn lu_decompose<T, S>(
    a: &Array2<T>,
    l: &mut Array2<T>,
    u: &mut Array2<T>,
    scheduler: &S,
    config: &FactorConfig,
) -> Result<()>
where
    T: Scalar,
    S: LoopScheduler,
{
    let n = check_square(a)?;
    check_output(l, n)?;
    check_output(u, n)?;

    let tolerance = config.pivot_check.tolerance(a);
    log::debug!(
        "LU: n={n}, schedule={}, threads={}",
        scheduler.schedule(),
        scheduler.num_threads()
    );

    let mut step = vec![T::zero(); n];
    for k in 0..n {
        l[[k, k]] = T::one();

        // U[k][j] = A[k][j] - sum_{a<k} L[k][a] U[a][j]
        {
            let (lv, uv) = (l.view(), u.view());
            scheduler.fill(k, &mut step[..n - k], |j| {
                a[[k, j]] - prefix_dot(lv.row(k), uv.column(j), k)
            });
        }
        u.slice_mut(s![k, k..]).assign(&ArrayView1::from(&step[..n - k]));

        if k + 1 == n {
            break;
        }

        let pivot = u[[k, k]];
        if tolerance.is_some_and(|tol| pivot.is_degenerate(tol)) {
            log::warn!("LU: singular pivot {:e} at step {k}", pivot.to_f64_lossy());
            return Err(FactorError::SingularPivot {
                step: k,
                pivot: pivot.to_f64_lossy(),
            });
        }

        // L[i][k] = (A[i][k] - sum_{a<k} L[i][a] U[a][k]) / U[k][k]
        {
            let (lv, uv) = (l.view(), u.view());
            scheduler.fill(k + 1, &mut step[..n - k - 1], |i| {
                (a[[i, k]] - prefix_dot(lv.row(i), uv.column(k), k)) / pivot
            });
        }
        l.slice_mut(s![k + 1.., k]).assign(&ArrayView1::from(&step[..n - k - 1]));

        config.report_progress("LU", k, n);
    }

    Ok(())
}

/// Owned LU factorization result
#[derive(Debug, Clone)]
pub struct LuFactorization<T: Scalar> {
    /// Unit lower triangular factor
    pub l: Array2<T>,
    /// Upper triangular factor
    pub u: Array2<T>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: Scalar> LuFactorization<T> {
    /// Factor `a` into freshly zeroed buffers.
    pub fn compute<S: LoopScheduler>(
        a: &Array2<T>,
        scheduler: &S,
        config: &FactorConfig,
    ) -> Result<Self> {
        let n = check_square(a)?;
        let mut l = Array2::zeros((n, n));
        let mut u = Array2::zeros((n, n));
        lu_decompose(a, &mut l, &mut u, scheduler, config)?;
        Ok(Self { l, u, n })
    }

    /// Solve `Ax = b` by forward substitution with `L` and back substitution with `U`.
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>> {
        if b.len() != self.n {
            return Err(FactorError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut x = b.clone();

        // Forward substitution: Ly = b (unit diagonal)
        for i in 0..self.n {
            let sum = prefix_dot(self.l.row(i), x.view(), i);
            x[i] -= sum;
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            let mut sum = T::zero();
            for j in (i + 1)..self.n {
                sum += self.u[[i, j]] * x[j];
            }
            let u_ii = self.u[[i, i]];
            if u_ii.is_degenerate(T::zero()) {
                return Err(FactorError::SingularPivot {
                    step: i,
                    pivot: u_ii.to_f64_lossy(),
                });
            }
            x[i] = (x[i] - sum) / u_ii;
        }

        Ok(x)
    }

    /// Determinant of `A` (product of the diagonal of `U`).
    pub fn determinant(&self) -> T {
        self.u.diag().iter().fold(T::one(), |acc, &d| acc * d)
    }

    /// `L·U`, which should reproduce `A`.
    pub fn reconstruct(&self) -> Array2<T> {
        self.l.dot(&self.u)
    }
}
