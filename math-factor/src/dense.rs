//! Dense matrix helpers shared by the engines, the harness and the tests

use crate::error::{FactorError, Result};
use crate::traits::Scalar;
use ndarray::{Array2, ArrayView1};

/// Return `n` if `a` is `n x n`.
pub fn check_square<T>(a: &Array2<T>) -> Result<usize> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(FactorError::NotSquare { rows, cols });
    }
    Ok(rows)
}

/// Check that an output buffer is `n x n`.
pub fn check_output<T>(out: &Array2<T>, n: usize) -> Result<()> {
    let (rows, cols) = out.dim();
    if rows != n {
        return Err(FactorError::DimensionMismatch {
            expected: n,
            got: rows,
        });
    }
    if cols != n {
        return Err(FactorError::DimensionMismatch {
            expected: n,
            got: cols,
        });
    }
    Ok(())
}

/// Zero an output buffer before it is handed to an engine again.
///
/// The engines never clear their outputs; cells they do not compute keep
/// whatever the buffer held.
pub fn clear<T: Scalar>(out: &mut Array2<T>) {
    out.fill(T::zero());
}

/// `sum(x[a] * y[a])` for `a` in `0..len`, accumulated in increasing `a`.
///
/// The accumulation order is part of the engines' contract: every scheduler
/// computes a cell with this exact sequence of operations.
#[inline]
pub fn prefix_dot<T: Scalar>(x: ArrayView1<'_, T>, y: ArrayView1<'_, T>, len: usize) -> T {
    x.iter()
        .zip(y.iter())
        .take(len)
        .fold(T::zero(), |acc, (&xi, &yi)| acc + xi * yi)
}

/// Largest absolute entry (0 for an empty matrix).
pub fn max_abs<T: Scalar>(a: &Array2<T>) -> T {
    a.iter().fold(T::zero(), |acc, &v| acc.max(v.abs()))
}

/// Largest entrywise `|a - b|`.
///
/// NaN anywhere yields NaN, so a degenerate factor never looks accurate.
pub fn max_abs_diff<T: Scalar>(a: &Array2<T>, b: &Array2<T>) -> Result<T> {
    let ((rows, cols), (b_rows, b_cols)) = (a.dim(), b.dim());
    if rows != b_rows {
        return Err(FactorError::DimensionMismatch {
            expected: rows,
            got: b_rows,
        });
    }
    if cols != b_cols {
        return Err(FactorError::DimensionMismatch {
            expected: cols,
            got: b_cols,
        });
    }
    let mut worst = T::zero();
    for (&x, &y) in a.iter().zip(b.iter()) {
        let d = (x - y).abs();
        if d.is_nan() {
            return Ok(d);
        }
        worst = worst.max(d);
    }
    Ok(worst)
}

/// True when every entry strictly above the diagonal is zero.
pub fn is_lower_triangular<T: Scalar>(m: &Array2<T>) -> bool {
    m.indexed_iter()
        .all(|((i, j), &v)| j <= i || v == T::zero())
}

/// True when every entry strictly below the diagonal is zero.
pub fn is_upper_triangular<T: Scalar>(m: &Array2<T>) -> bool {
    m.indexed_iter()
        .all(|((i, j), &v)| j >= i || v == T::zero())
}

/// Tolerance for reconstruction checks: `1e-9 * n * max|A|` (at least `1e-9`).
pub fn reconstruction_tolerance<T: Scalar>(a: &Array2<T>) -> f64 {
    let scale = max_abs(a).to_f64_lossy().max(1.0);
    1e-9 * (a.nrows().max(1) as f64) * scale
}
