//! Chunked evaluation of analyzer states.
//!
//! A dataset is always split into fixed-size chunks whose states are merged in
//! chunk order. Parallel mode only changes where the chunk states are computed
//! (tokio's blocking pool), never how they are combined, so sequential and
//! parallel runs return identical results.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::options::{ExecutionOptions, MIN_CHUNK_SIZE};
use crate::core::result::AnalysisResult;
use crate::error::{LawkitError, Result};
use crate::input::NumericDataset;
use crate::laws::LawAnalyzer;

const BYTES_PER_VALUE: usize = std::mem::size_of::<f64>();

// One chunk may be copied a few times while its state is built; keep the
// working set to a fraction of the limit.
const WORKING_SET_FACTOR: usize = 4;
const LIMIT_FRACTION: usize = 8;

/// How one dataset is split and scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub chunk_size: usize,
    pub parallel: bool,
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::from_options(&ExecutionOptions::default(), 0)
    }
}

impl ExecutionPlan {
    /// Derives the plan for a dataset of `dataset_len` values.
    ///
    /// A memory limit lowers the chunk size (never below [`MIN_CHUNK_SIZE`]
    /// unless a smaller chunk was configured explicitly) and logs a warning
    /// when the dataset alone exceeds the limit.
    pub fn from_options(options: &ExecutionOptions, dataset_len: usize) -> Self {
        let mut chunk_size = options.chunk_size.max(1);

        if let Some(limit_mb) = options.memory_limit_mb {
            let budget = limit_mb.saturating_mul(1024 * 1024);
            let limited =
                (budget / (BYTES_PER_VALUE * WORKING_SET_FACTOR * LIMIT_FRACTION)).max(MIN_CHUNK_SIZE);
            if limited < chunk_size {
                debug!(
                    chunk_size = limited,
                    memory_limit_mb = limit_mb,
                    "Lowering chunk size for memory limit"
                );
                chunk_size = limited;
            }

            let dataset_bytes = dataset_len.saturating_mul(BYTES_PER_VALUE);
            if dataset_bytes > budget {
                warn!(
                    dataset_bytes,
                    memory_limit_mb = limit_mb,
                    "Dataset exceeds the configured memory limit"
                );
            }
        }

        Self {
            chunk_size,
            parallel: options.parallel,
        }
    }

    /// Number of chunks a dataset of `len` values is split into.
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    /// Computes and merges the analyzer state over all chunks.
    pub async fn compute_state<A>(&self, analyzer: &A, values: &[f64]) -> Result<A::State>
    where
        A: LawAnalyzer,
    {
        let states = if self.parallel && values.len() > self.chunk_size {
            self.compute_parallel(analyzer, values).await?
        } else {
            values
                .chunks(self.chunk_size)
                .map(|chunk| analyzer.compute_state(chunk))
                .collect::<Result<Vec<_>>>()?
        };
        analyzer.merge_states(states)
    }

    async fn compute_parallel<A>(&self, analyzer: &A, values: &[f64]) -> Result<Vec<A::State>>
    where
        A: LawAnalyzer,
    {
        let shared: Arc<[f64]> = Arc::from(values);
        let mut handles = Vec::with_capacity(self.chunk_count(values.len()));

        let mut start = 0;
        while start < shared.len() {
            let end = (start + self.chunk_size).min(shared.len());
            let analyzer = analyzer.clone();
            let shared = Arc::clone(&shared);

            let handle =
                tokio::task::spawn_blocking(move || analyzer.compute_state(&shared[start..end]));
            handles.push(handle);
            start = end;
        }

        let mut states = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Ok(state)) => states.push(state),
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(LawkitError::Internal(format!("Task join error: {e}"))),
            }
        }
        Ok(states)
    }

    /// Runs an analyzer over a dataset.
    pub async fn run<A>(&self, analyzer: &A, dataset: &NumericDataset) -> Result<AnalysisResult>
    where
        A: LawAnalyzer,
    {
        debug!(
            analyzer = analyzer.name(),
            chunks = self.chunk_count(dataset.len()),
            parallel = self.parallel,
            "Running analyzer"
        );
        let state = self.compute_state(analyzer, &dataset.values).await?;
        analyzer.compute_result(&dataset.label, state)
    }
}
