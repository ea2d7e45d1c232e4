//! Benchmark harness: time every scheduling variant over a sweep of sizes
//!
//! The harness owns one scheduler per policy, so worker pools are built once
//! and reused across the whole sweep. For each size it generates one input,
//! then runs every variant on that same input with outputs cleared in between.

use crate::dense::{clear, max_abs_diff};
use crate::direct::{FactorConfig, cholesky_decompose, lu_decompose};
use crate::error::Result;
use crate::generate::{random_positive, random_spd, seeded_rng};
use crate::parallel::{LoopScheduler, Scheduler};
use crate::schedule::Schedule;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Factorization being benchmarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Doolittle LU
    Lu,
    /// Cholesky
    Cholesky,
}

impl Algorithm {
    /// Name used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::Lu => "Doolittle",
            Algorithm::Cholesky => "Cholesky",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Benchmark sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Smallest size is `2^(start_exponent + 1)`
    pub start_exponent: u32,
    /// Largest size is `2^(end_exponent + 1)`
    pub end_exponent: u32,
    /// Factorizations to run at every size
    pub algorithms: Vec<Algorithm>,
    /// Policies to compare, in run order
    pub schedules: Vec<Schedule>,
    /// Workers for the parallel policies (None = rayon default)
    pub num_threads: Option<usize>,
    /// RNG seed for the inputs (None = random)
    pub seed: Option<u64>,
    /// Compute `max|A - L·U|` (or `max|A - L·Lᵗ|`) after each run
    pub check_residual: bool,
    /// Engine configuration
    pub factor: FactorConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            start_exponent: 6,
            end_exponent: 12,
            algorithms: vec![Algorithm::Lu, Algorithm::Cholesky],
            schedules: vec![
                Schedule::Sequential,
                Schedule::static_blocks(),
                Schedule::dynamic(),
            ],
            num_threads: None,
            seed: None,
            check_residual: false,
            factor: FactorConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Matrix sizes of the sweep: `2 << p` for `p` in `start..=end`.
    pub fn sizes(&self) -> Vec<usize> {
        (self.start_exponent..=self.end_exponent)
            .map(|p| 2usize << p)
            .collect()
    }
}

/// Outcome of one timed engine call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchRecord {
    /// Factorization
    pub algorithm: Algorithm,
    /// Matrix size
    pub n: usize,
    /// Policy used
    pub schedule: Schedule,
    /// Workers used
    pub threads: usize,
    /// Wall time of the engine call in milliseconds
    pub elapsed_ms: f64,
    /// Reconstruction residual, if requested and the run succeeded
    pub residual: Option<f64>,
    /// Error message if the engine failed
    pub error: Option<String>,
}

impl fmt::Display for BenchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total runtime for the {} {} algorithm of size {} is: {:.3} milliseconds",
            self.algorithm,
            self.schedule.name(),
            self.n,
            self.elapsed_ms
        )?;
        if let Some(residual) = self.residual {
            write!(f, " (residual {residual:.3e})")?;
        }
        if let Some(error) = &self.error {
            write!(f, " [failed: {error}]")?;
        }
        Ok(())
    }
}

/// Runs the configured sweep.
#[derive(Debug)]
pub struct BenchHarness {
    config: BenchConfig,
    schedulers: Vec<Scheduler>,
}

impl BenchHarness {
    /// Build one scheduler per configured policy.
    pub fn new(config: BenchConfig) -> Result<Self> {
        let threads = config
            .num_threads
            .unwrap_or_else(rayon::current_num_threads);
        let schedulers = config
            .schedules
            .iter()
            .map(|&schedule| Scheduler::new(schedule, threads))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, schedulers })
    }

    /// Configuration in use.
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run every algorithm at every size of the sweep.
    pub fn run(&self) -> Vec<BenchRecord> {
        let mut rng = seeded_rng(self.config.seed);
        let mut records = Vec::new();
        for n in self.config.sizes() {
            for &algorithm in &self.config.algorithms {
                records.extend(self.run_size(algorithm, n, &mut rng));
            }
        }
        records
    }

    /// Generate one input of size `n` and time every scheduler on it.
    pub fn run_size<R: Rng + ?Sized>(
        &self,
        algorithm: Algorithm,
        n: usize,
        rng: &mut R,
    ) -> Vec<BenchRecord> {
        let a = match algorithm {
            Algorithm::Lu => random_positive(n, rng),
            Algorithm::Cholesky => random_spd(n, rng),
        };
        log::info!("{algorithm}: n={n}");

        let mut l = Array2::zeros((n, n));
        let mut u = Array2::zeros((n, n));
        self.schedulers
            .iter()
            .map(|scheduler| self.time_one(algorithm, &a, &mut l, &mut u, scheduler))
            .collect()
    }

    fn time_one(
        &self,
        algorithm: Algorithm,
        a: &Array2<f64>,
        l: &mut Array2<f64>,
        u: &mut Array2<f64>,
        scheduler: &Scheduler,
    ) -> BenchRecord {
        clear(l);
        clear(u);

        let start = Instant::now();
        let outcome = match algorithm {
            Algorithm::Lu => lu_decompose(a, l, u, scheduler, &self.config.factor),
            Algorithm::Cholesky => cholesky_decompose(a, l, scheduler, &self.config.factor),
        };
        let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;

        let residual = match (&outcome, self.config.check_residual) {
            (Ok(()), true) => {
                let product = match algorithm {
                    Algorithm::Lu => l.dot(&*u),
                    Algorithm::Cholesky => l.dot(&l.t()),
                };
                max_abs_diff(&product, a).ok()
            }
            _ => None,
        };

        BenchRecord {
            algorithm,
            n: a.nrows(),
            schedule: scheduler.schedule(),
            threads: scheduler.num_threads(),
            elapsed_ms,
            residual,
            error: outcome.err().map(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_match_sweep() {
        let config = BenchConfig::default();
        assert_eq!(config.sizes(), vec![128, 256, 512, 1024, 2048, 4096, 8192]);

        let config = BenchConfig {
            start_exponent: 1,
            end_exponent: 2,
            ..BenchConfig::default()
        };
        assert_eq!(config.sizes(), vec![4, 8]);
    }

    #[test]
    fn test_small_sweep() {
        let config = BenchConfig {
            start_exponent: 1,
            end_exponent: 3,
            num_threads: Some(2),
            seed: Some(11),
            check_residual: true,
            algorithms: vec![Algorithm::Cholesky],
            ..BenchConfig::default()
        };
        let harness = BenchHarness::new(config).unwrap();
        let records = harness.run();

        // 3 sizes x 1 algorithm x 3 schedules
        assert_eq!(records.len(), 9);
        for record in &records {
            assert!(record.error.is_none(), "{record}");
            let residual = record.residual.expect("residual requested");
            assert!(residual < 1e-6 * record.n as f64 * 1e5, "{record}");
        }
        assert_eq!(records[0].schedule, Schedule::Sequential);
        assert_eq!(records[1].threads, 2);
    }

    #[test]
    fn test_record_display() {
        let record = BenchRecord {
            algorithm: Algorithm::Lu,
            n: 128,
            schedule: Schedule::dynamic(),
            threads: 4,
            elapsed_ms: 1.5,
            residual: None,
            error: None,
        };
        assert_eq!(
            record.to_string(),
            "Total runtime for the Doolittle dynamic algorithm of size 128 is: 1.500 milliseconds"
        );
    }

    #[test]
    fn test_record_serializes() {
        let record = BenchRecord {
            algorithm: Algorithm::Cholesky,
            n: 4,
            schedule: Schedule::Sequential,
            threads: 1,
            elapsed_ms: 0.25,
            residual: Some(0.0),
            error: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["algorithm"], "cholesky");
        assert_eq!(json["schedule"]["policy"], "sequential");
    }
}
