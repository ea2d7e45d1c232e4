//! Loop schedulers: how one inner loop of an elimination step is executed
//!
//! Both engines hand every parallelizable inner loop to a [`LoopScheduler`] as
//! a pure kernel `index -> value` plus the output slice the values go to. The
//! scheduler splits the slice into disjoint chunks according to its
//! [`Schedule`], runs them, and returns only once every chunk is written, which
//! is the barrier between inner loops.
//!
//! Parallel schedulers own a fixed `rayon` pool, built once and reused for
//! every inner loop they run. Each inner loop is a single
//! [`broadcast`](rayon::ThreadPool::broadcast) over the pool.

use crate::error::{FactorError, Result};
use crate::schedule::{ChunkQueue, Schedule, static_chunk_size, static_owner};
use std::sync::{Mutex, PoisonError};

/// Execution strategy for one inner parallel loop.
pub trait LoopScheduler: Send + Sync {
    /// Policy implemented by this scheduler.
    fn schedule(&self) -> Schedule;

    /// Number of workers participating in each inner loop.
    fn num_threads(&self) -> usize;

    /// Set `out[t] = kernel(first + t)` for every `t`.
    ///
    /// Returns after all values are written. The kernel must only read data
    /// that no iteration of this call writes.
    fn fill<T, K>(&self, first: usize, out: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(usize) -> T + Sync;
}

#[inline]
fn run_chunk<T, K>(start: usize, chunk: &mut [T], kernel: &K)
where
    K: Fn(usize) -> T,
{
    for (offset, slot) in chunk.iter_mut().enumerate() {
        *slot = kernel(start + offset);
    }
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    if threads == 0 {
        return Err(FactorError::InvalidThreadCount);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("factor-worker-{i}"))
        .build()?;
    Ok(pool)
}

/// Single-threaded baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl LoopScheduler for Sequential {
    fn schedule(&self) -> Schedule {
        Schedule::Sequential
    }

    fn num_threads(&self) -> usize {
        1
    }

    fn fill<T, K>(&self, first: usize, out: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(usize) -> T + Sync,
    {
        run_chunk(first, out, &kernel);
    }
}

/// Static chunking: every chunk's worker is fixed before the loop starts.
#[derive(Debug)]
pub struct StaticScheduler {
    pool: rayon::ThreadPool,
    chunk_size: Option<usize>,
}

impl StaticScheduler {
    /// Create a pool of `threads` workers using `chunk_size` iterations per
    /// chunk (`None` = one contiguous block per worker).
    pub fn new(threads: usize, chunk_size: Option<usize>) -> Result<Self> {
        Schedule::Static { chunk_size }.validate()?;
        let pool = build_pool(threads)?;
        log::debug!("static scheduler: {threads} workers, chunk size {chunk_size:?}");
        Ok(Self { pool, chunk_size })
    }
}

impl LoopScheduler for StaticScheduler {
    fn schedule(&self) -> Schedule {
        Schedule::Static {
            chunk_size: self.chunk_size,
        }
    }

    fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn fill<T, K>(&self, first: usize, out: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(usize) -> T + Sync,
    {
        if out.is_empty() {
            return;
        }
        let threads = self.num_threads();
        let size = static_chunk_size(out.len(), self.chunk_size, threads);

        let mut plan: Vec<Vec<(usize, &mut [T])>> = (0..threads).map(|_| Vec::new()).collect();
        for (c, chunk) in out.chunks_mut(size).enumerate() {
            plan[static_owner(c, threads)].push((first + c * size, chunk));
        }
        // Each worker takes its own list exactly once; the mutex only moves the
        // `&mut` chunks across the broadcast boundary.
        let plan: Vec<Mutex<Vec<(usize, &mut [T])>>> = plan.into_iter().map(Mutex::new).collect();

        self.pool.broadcast(|ctx| {
            let mine = std::mem::take(
                &mut *plan[ctx.index()]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            for (start, chunk) in mine {
                run_chunk(start, chunk, &kernel);
            }
        });
    }
}

/// Dynamic chunking: idle workers claim the next chunk from a shared queue.
#[derive(Debug)]
pub struct DynamicScheduler {
    pool: rayon::ThreadPool,
    chunk_size: usize,
}

impl DynamicScheduler {
    /// Create a pool of `threads` workers pulling `chunk_size` iterations at a time.
    pub fn new(threads: usize, chunk_size: usize) -> Result<Self> {
        Schedule::Dynamic { chunk_size }.validate()?;
        let pool = build_pool(threads)?;
        log::debug!("dynamic scheduler: {threads} workers, chunk size {chunk_size}");
        Ok(Self { pool, chunk_size })
    }
}

impl LoopScheduler for DynamicScheduler {
    fn schedule(&self) -> Schedule {
        Schedule::Dynamic {
            chunk_size: self.chunk_size,
        }
    }

    fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn fill<T, K>(&self, first: usize, out: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(usize) -> T + Sync,
    {
        if out.is_empty() {
            return;
        }
        let size = self.chunk_size;
        let queue = ChunkQueue::new(out.chunks_mut(size).enumerate());

        self.pool.broadcast(|_| {
            while let Some((c, chunk)) = queue.next_chunk() {
                run_chunk(first + c * size, chunk, &kernel);
            }
        });
    }
}

/// Scheduler selected at runtime from a [`Schedule`].
#[derive(Debug)]
pub enum Scheduler {
    /// See [`Sequential`]
    Sequential(Sequential),
    /// See [`StaticScheduler`]
    Static(StaticScheduler),
    /// See [`DynamicScheduler`]
    Dynamic(DynamicScheduler),
}

impl Scheduler {
    /// Build the scheduler for `schedule` with `threads` workers.
    ///
    /// `threads` is ignored by the sequential policy.
    pub fn new(schedule: Schedule, threads: usize) -> Result<Self> {
        schedule.validate()?;
        Ok(match schedule {
            Schedule::Sequential => Scheduler::Sequential(Sequential),
            Schedule::Static { chunk_size } => {
                Scheduler::Static(StaticScheduler::new(threads, chunk_size)?)
            }
            Schedule::Dynamic { chunk_size } => {
                Scheduler::Dynamic(DynamicScheduler::new(threads, chunk_size)?)
            }
        })
    }
}

impl LoopScheduler for Scheduler {
    fn schedule(&self) -> Schedule {
        match self {
            Scheduler::Sequential(s) => s.schedule(),
            Scheduler::Static(s) => s.schedule(),
            Scheduler::Dynamic(s) => s.schedule(),
        }
    }

    fn num_threads(&self) -> usize {
        match self {
            Scheduler::Sequential(s) => s.num_threads(),
            Scheduler::Static(s) => s.num_threads(),
            Scheduler::Dynamic(s) => s.num_threads(),
        }
    }

    fn fill<T, K>(&self, first: usize, out: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(usize) -> T + Sync,
    {
        match self {
            Scheduler::Sequential(s) => s.fill(first, out, kernel),
            Scheduler::Static(s) => s.fill(first, out, kernel),
            Scheduler::Dynamic(s) => s.fill(first, out, kernel),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Work-distribution policy
    pub schedule: Schedule,
    /// Number of workers (None = rayon's default, typically the number of cores)
    pub num_threads: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedule: Schedule::default(),
            num_threads: None,
        }
    }
}

impl SchedulerConfig {
    /// Configuration for `schedule` with the default thread count.
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            num_threads: None,
        }
    }

    /// Sets the number of workers.
    pub fn threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Worker count this configuration resolves to.
    pub fn resolved_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(rayon::current_num_threads)
    }

    /// Build the scheduler.
    pub fn build(&self) -> Result<Scheduler> {
        Scheduler::new(self.schedule, self.resolved_threads())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::static_assignment;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn all_schedulers(threads: usize) -> Vec<Scheduler> {
        [
            Schedule::Sequential,
            Schedule::static_blocks(),
            Schedule::Static {
                chunk_size: Some(3),
            },
            Schedule::dynamic(),
            Schedule::Dynamic { chunk_size: 5 },
        ]
        .into_iter()
        .map(|s| Scheduler::new(s, threads).expect("scheduler should build"))
        .collect()
    }

    #[test]
    fn test_fill_writes_kernel_values() {
        for scheduler in all_schedulers(4) {
            let mut out = vec![0usize; 37];
            scheduler.fill(10, &mut out, |i| i * i);
            let expected: Vec<usize> = (10..47).map(|i| i * i).collect();
            assert_eq!(out, expected, "schedule {}", scheduler.schedule());
        }
    }

    #[test]
    fn test_each_index_runs_once() {
        for scheduler in all_schedulers(3) {
            let hits: Vec<AtomicUsize> = (0..100).map(|_| AtomicUsize::new(0)).collect();
            let mut out = vec![0.0_f64; 100];
            scheduler.fill(0, &mut out, |i| {
                hits[i].fetch_add(1, Ordering::Relaxed);
                i as f64
            });
            assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
        }
    }

    #[test]
    fn test_more_threads_than_iterations() {
        for scheduler in all_schedulers(8) {
            let mut out = vec![0i64; 2];
            scheduler.fill(5, &mut out, |i| -(i as i64));
            assert_eq!(out, vec![-5, -6]);
        }
    }

    #[test]
    fn test_empty_loop() {
        for scheduler in all_schedulers(2) {
            let mut out: Vec<f64> = Vec::new();
            scheduler.fill(3, &mut out, |_| panic!("kernel must not run"));
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_static_chunks_run_on_their_owner() {
        for (threads, chunk) in [(4, Some(2)), (3, None), (3, Some(5)), (8, Some(1))] {
            let scheduler = StaticScheduler::new(threads, chunk).unwrap();
            let first = 7;
            let len = 41;
            let mut owners = vec![None; len];
            scheduler.fill(first, &mut owners, |_| rayon::current_thread_index());

            let plan = static_assignment(first..first + len, chunk, threads);
            for (worker, chunks) in plan.iter().enumerate() {
                for i in chunks.iter().flat_map(|r| r.clone()) {
                    assert_eq!(
                        owners[i - first],
                        Some(worker),
                        "iteration {i} with {threads} threads, chunk {chunk:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_dynamic_spreads_work_across_workers() {
        let scheduler = DynamicScheduler::new(4, 1).unwrap();
        let mut owners = vec![None; 64];
        scheduler.fill(0, &mut owners, |_| {
            std::thread::sleep(Duration::from_micros(200));
            rayon::current_thread_index()
        });

        assert!(owners.iter().all(|o| o.is_some_and(|w| w < 4)));
        let distinct: HashSet<_> = owners.iter().flatten().collect();
        assert!(distinct.len() > 1, "only workers {distinct:?} ran");
    }

    #[test]
    fn test_pool_is_reused() {
        let scheduler = DynamicScheduler::new(2, 1).unwrap();
        assert_eq!(scheduler.num_threads(), 2);
        for n in 0..50 {
            let mut out = vec![0usize; n];
            scheduler.fill(0, &mut out, |i| i + 1);
            assert_eq!(out, (1..=n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            Scheduler::new(Schedule::static_blocks(), 0),
            Err(FactorError::InvalidThreadCount)
        ));
        assert!(matches!(
            Scheduler::new(Schedule::Dynamic { chunk_size: 0 }, 2),
            Err(FactorError::InvalidChunkSize)
        ));
        assert!(Scheduler::new(Schedule::Sequential, 0).is_ok());
    }

    #[test]
    fn test_scheduler_config() {
        let config = SchedulerConfig::new(Schedule::dynamic()).threads(3);
        assert_eq!(config.resolved_threads(), 3);
        let scheduler = config.build().unwrap();
        assert_eq!(scheduler.num_threads(), 3);
        assert_eq!(scheduler.schedule(), Schedule::dynamic());

        let default = SchedulerConfig::default();
        assert!(default.resolved_threads() >= 1);
    }
}
