//! Error types for the factorization engines.
//!
//! Every failure the engines can detect, structural or arithmetic, is reported
//! through [`FactorError`]. Pivot faults are only reported when the caller keeps
//! the default [`PivotCheck::Strict`](crate::PivotCheck::Strict) policy.

use thiserror::Error;

/// Errors that can occur while configuring a scheduler or factorizing a matrix.
#[derive(Debug, Error)]
pub enum FactorError {
    /// The input matrix is not square.
    #[error("matrix is not square: {rows} rows, {cols} columns")]
    NotSquare {
        /// Number of rows of the input
        rows: usize,
        /// Number of columns of the input
        cols: usize,
    },

    /// An output buffer or right-hand side does not match the input dimension.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        got: usize,
    },

    /// `U[k][k]` vanished or became non-finite during LU elimination.
    #[error("singular pivot at step {step}: U[{step}][{step}] = {pivot:e}")]
    SingularPivot {
        /// Elimination step at which the pivot failed
        step: usize,
        /// The offending pivot value
        pivot: f64,
    },

    /// The Cholesky radicand of a diagonal entry was not positive.
    #[error("matrix is not positive definite: radicand {radicand:e} at column {step}")]
    NotPositiveDefinite {
        /// Column at which the factorization broke down
        step: usize,
        /// `A[j][j] - sum(L[j][k]^2)` at that column
        radicand: f64,
    },

    /// A scheduler was asked for zero worker threads.
    #[error("thread count must be >= 1")]
    InvalidThreadCount,

    /// A chunked schedule was given a zero chunk size.
    #[error("chunk size must be >= 1")]
    InvalidChunkSize,

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A specialized `Result` type for factorization operations.
pub type Result<T> = std::result::Result<T, FactorError>;

impl FactorError {
    /// Returns `true` if the factorization broke down on a pivot.
    ///
    /// This includes `SingularPivot` and `NotPositiveDefinite`.
    pub fn is_pivot_error(&self) -> bool {
        matches!(
            self,
            FactorError::SingularPivot { .. } | FactorError::NotPositiveDefinite { .. }
        )
    }

    /// Returns `true` if this is a shape error.
    pub fn is_dimension_error(&self) -> bool {
        matches!(
            self,
            FactorError::NotSquare { .. } | FactorError::DimensionMismatch { .. }
        )
    }

    /// Returns `true` if the scheduler could not be configured.
    pub fn is_scheduler_error(&self) -> bool {
        matches!(
            self,
            FactorError::InvalidThreadCount
                | FactorError::InvalidChunkSize
                | FactorError::ThreadPool(_)
        )
    }

    /// Elimination step at which a pivot fault occurred, if any.
    pub fn step(&self) -> Option<usize> {
        match self {
            FactorError::SingularPivot { step, .. }
            | FactorError::NotPositiveDefinite { step, .. } => Some(*step),
            _ => None,
        }
    }
}
