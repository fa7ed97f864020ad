//! Execution backends for the data-parallel stages.
//!
//! Every stage is expressed over an explicit index space (grid bins, middle
//! spacepoints, bottom doublets). An [`Executor`] runs one task per index
//! and returns results in index order, so the output never depends on how
//! tasks were scheduled.

use rayon::prelude::*;

use crate::error::Result;

/// Data-parallel backend.
///
/// Implementations must return results in index order and must call each
/// task exactly once.
pub trait Executor: Sync {
    /// Evaluate `f` for every index in `0..len`.
    fn map<T, F>(&self, len: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send;

    /// Run `f` once per disjoint lane slice, passing the lane index.
    fn for_each_lane<T, R, F>(&self, lanes: Vec<&mut [T]>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, &mut [T]) -> R + Sync + Send;

    fn name(&self) -> &'static str;
}

/// Runs every task on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl Executor for SequentialExecutor {
    fn map<T, F>(&self, len: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        (0..len).map(f).collect()
    }

    fn for_each_lane<T, R, F>(&self, lanes: Vec<&mut [T]>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, &mut [T]) -> R + Sync + Send,
    {
        lanes
            .into_iter()
            .enumerate()
            .map(|(lane, slots)| f(lane, slots))
            .collect()
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Runs tasks on rayon, either on the global pool or on a dedicated one.
#[derive(Debug, Default)]
pub struct RayonExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl RayonExecutor {
    /// Use rayon's global thread pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a dedicated pool with `num_threads` workers.
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("seeding-{i}"))
            .build()?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Executor for RayonExecutor {
    fn map<T, F>(&self, len: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        self.install(|| (0..len).into_par_iter().map(&f).collect())
    }

    fn for_each_lane<T, R, F>(&self, lanes: Vec<&mut [T]>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, &mut [T]) -> R + Sync + Send,
    {
        self.install(|| {
            lanes
                .into_par_iter()
                .enumerate()
                .map(|(lane, slots)| f(lane, slots))
                .collect()
        })
    }

    fn name(&self) -> &'static str {
        "rayon"
    }
}
