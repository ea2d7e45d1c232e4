//! Chunk planning for the inner parallel loops
//!
//! A [`Schedule`] decides how the iteration range `[lo, hi)` of one inner loop
//! is cut into chunks and which worker runs each chunk:
//!
//! - **Static**: chunks are computed up front and dealt round-robin, chunk `c`
//!   going to worker `c % threads`. Without an explicit chunk size every worker
//!   gets one contiguous block of `ceil(len / threads)` iterations.
//! - **Dynamic**: chunks of a fixed size sit behind a [`ChunkQueue`]; idle
//!   workers pop the next unclaimed chunk until the queue is drained.
//!
//! The plan only affects which worker computes an iteration, never the value
//! computed for it.

use crate::error::{FactorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::{Mutex, PoisonError};

/// Work-distribution policy for the inner loops of an elimination step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum Schedule {
    /// Single thread, no pool.
    Sequential,
    /// Precomputed round-robin assignment of contiguous chunks.
    Static {
        /// Iterations per chunk (`None` = one block per worker)
        chunk_size: Option<usize>,
    },
    /// Chunks pulled on demand from a shared cursor.
    Dynamic {
        /// Iterations per chunk
        chunk_size: usize,
    },
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::Static { chunk_size: None }
    }
}

impl Schedule {
    /// Static schedule with one block per worker.
    pub fn static_blocks() -> Self {
        Schedule::Static { chunk_size: None }
    }

    /// Dynamic schedule handing out one iteration at a time.
    pub fn dynamic() -> Self {
        Schedule::Dynamic { chunk_size: 1 }
    }

    /// Short lowercase name of the policy.
    pub fn name(&self) -> &'static str {
        match self {
            Schedule::Sequential => "sequential",
            Schedule::Static { .. } => "static",
            Schedule::Dynamic { .. } => "dynamic",
        }
    }

    /// Whether this policy runs on a worker pool.
    pub fn is_parallel(&self) -> bool {
        !matches!(self, Schedule::Sequential)
    }

    /// Reject zero chunk sizes.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Schedule::Static {
                chunk_size: Some(0),
            }
            | Schedule::Dynamic { chunk_size: 0 } => Err(FactorError::InvalidChunkSize),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Sequential => write!(f, "sequential"),
            Schedule::Static { chunk_size: None } => write!(f, "static"),
            Schedule::Static {
                chunk_size: Some(size),
            } => write!(f, "static({size})"),
            Schedule::Dynamic { chunk_size } => write!(f, "dynamic({chunk_size})"),
        }
    }
}

/// Split `range` into consecutive chunks of `chunk_size` iterations.
///
/// The last chunk may be shorter. A zero chunk size is treated as 1.
pub fn chunk_ranges(
    range: Range<usize>,
    chunk_size: usize,
) -> impl Iterator<Item = Range<usize>> {
    let size = chunk_size.max(1);
    let end = range.end;
    range
        .step_by(size)
        .map(move |start| start..(start + size).min(end))
}

/// Chunk size a static schedule uses for a loop of `len` iterations.
pub fn static_chunk_size(len: usize, chunk_size: Option<usize>, threads: usize) -> usize {
    chunk_size
        .unwrap_or_else(|| len.div_ceil(threads.max(1)))
        .max(1)
}

/// Worker that owns chunk number `chunk_index` under a static schedule.
#[inline]
pub fn static_owner(chunk_index: usize, threads: usize) -> usize {
    chunk_index % threads.max(1)
}

/// Full static plan: for every worker, the chunks it executes, in order.
///
/// Always returns `threads` lists (some possibly empty).
pub fn static_assignment(
    range: Range<usize>,
    chunk_size: Option<usize>,
    threads: usize,
) -> Vec<Vec<Range<usize>>> {
    let threads = threads.max(1);
    let size = static_chunk_size(range.len(), chunk_size, threads);
    let mut plan = vec![Vec::new(); threads];
    for (c, chunk) in chunk_ranges(range, size).enumerate() {
        plan[static_owner(c, threads)].push(chunk);
    }
    plan
}

/// Shared work queue of a dynamic schedule.
///
/// Wraps any iterator of chunks behind a mutex; each call to
/// [`next_chunk`](Self::next_chunk) claims one chunk, so every chunk is handed
/// out exactly once no matter how many workers pull from it.
#[derive(Debug)]
pub struct ChunkQueue<I> {
    cursor: Mutex<I>,
}

impl<I: Iterator> ChunkQueue<I> {
    /// Create a queue over `chunks`.
    pub fn new(chunks: I) -> Self {
        Self {
            cursor: Mutex::new(chunks),
        }
    }

    /// Claim the next unclaimed chunk, or `None` once the queue is drained.
    pub fn next_chunk(&self) -> Option<I::Item> {
        // A worker that panicked mid-chunk cannot leave the cursor half-advanced.
        self.cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }
}
