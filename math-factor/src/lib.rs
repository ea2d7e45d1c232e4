//! Dense LU and Cholesky factorizations with pluggable loop scheduling
//!
//! This crate factors dense square matrices with two classical recurrences and
//! runs their inner loops under interchangeable scheduling policies, so the
//! cost of static versus dynamic work distribution can be measured on the
//! same numerical code.
//!
//! # Features
//!
//! - **LU (Doolittle)**: `A = L·U`, unit lower `L`, no pivoting
//! - **Cholesky**: `A = L·Lᵗ` for symmetric positive-definite `A`
//! - **Schedulers**: sequential, static chunking, dynamic chunking over a fixed
//!   `rayon` worker pool
//! - **Pivot checks**: typed errors instead of silent NaN propagation (opt-out)
//! - **Benchmark harness**: size sweeps with per-variant timings
//!
//! All schedulers produce bit-identical factors for the same input: each
//! output cell is computed by one worker with a fixed summation order.
//!
//! # Example
//!
//! ```no_run
//! use math_audio_factor::{FactorConfig, LuFactorization, Schedule, SchedulerConfig};
//! use ndarray::array;
//!
//! let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
//! let scheduler = SchedulerConfig::new(Schedule::dynamic()).threads(4).build()?;
//! let lu = LuFactorization::compute(&a, &scheduler, &FactorConfig::default())?;
//! assert_eq!(lu.reconstruct(), a);
//! # Ok::<(), math_audio_factor::FactorError>(())
//! ```

pub mod bench;
pub mod dense;
pub mod direct;
pub mod error;
pub mod generate;
pub mod parallel;
pub mod schedule;
pub mod traits;

// Re-export main types
pub use error::{FactorError, Result};
pub use traits::Scalar;

// Re-export engines
pub use direct::{
    CholeskyFactorization, FactorConfig, LuFactorization, PivotCheck, cholesky_decompose,
    lu_decompose,
};

// Re-export scheduling
pub use parallel::{
    DynamicScheduler, LoopScheduler, Scheduler, SchedulerConfig, Sequential, StaticScheduler,
};
pub use schedule::{ChunkQueue, Schedule};

pub use bench::{Algorithm, BenchConfig, BenchHarness, BenchRecord};
