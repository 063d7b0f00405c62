use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::MatchError;
use crate::query::parser::Query;
use crate::query::scorer::{Candidate, ScoreContext, Scorer, ScoringWeights};
use crate::query::topk::{RankedMatch, TopKHeap, compare_ranked};

/// Candidate count below which matching stays on the calling thread
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2048;

/// Number of hardware threads, at least 1
pub fn hardware_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Runs one query over a candidate list
pub struct MatchExecutor<'a> {
    query: &'a Query,
    weights: &'a ScoringWeights,
    context: ScoreContext<'a>,
    limit: usize,
    max_threads: usize,
    parallel_threshold: usize,
}

impl<'a> MatchExecutor<'a> {
    pub fn new(query: &'a Query, weights: &'a ScoringWeights, context: ScoreContext<'a>) -> Self {
        Self {
            query,
            weights,
            context,
            limit: 0,
            max_threads: 0,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Maximum number of results, `0` for all
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Upper bound on worker threads, `0` for the hardware thread count
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Workers used for `candidates` items
    pub fn worker_count(&self, candidates: usize) -> usize {
        let hardware = hardware_threads();
        let configured = match self.max_threads {
            0 => hardware,
            n => n.min(hardware),
        };
        configured.min(candidates).max(1)
    }

    /// Match every item and return the best results, best first.
    ///
    /// The result depends only on the inputs: partitioning and thread count
    /// never change which results come back or their order.
    pub fn execute<S>(&self, items: &[S]) -> Result<Vec<RankedMatch>, MatchError>
    where
        S: AsRef<str> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let workers = self.worker_count(items.len());

        let partials = if workers <= 1 || items.len() < self.parallel_threshold {
            vec![self.scan_partition(items, 0)]
        } else {
            let chunk_size = items.len().div_ceil(workers);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("pathrank-worker-{i}"))
                .build()?;
            pool.install(|| {
                items
                    .par_chunks(chunk_size)
                    .enumerate()
                    .map(|(n, chunk)| self.scan_partition(chunk, n * chunk_size))
                    .collect::<Vec<_>>()
            })
        };

        let results = merge_ranked(partials, self.limit);
        debug!(
            items = items.len(),
            workers,
            results = results.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "match complete"
        );
        Ok(results)
    }

    /// Score one contiguous range of candidates starting at index `base`
    fn scan_partition<S: AsRef<str>>(&self, items: &[S], base: usize) -> TopKHeap {
        let mut scorer = Scorer::new(self.query, self.weights, self.context);
        let mut top = TopKHeap::with_expected(self.limit, items.len());
        let mut matched = 0usize;

        for (offset, item) in items.iter().enumerate() {
            let candidate = Candidate::new(
                base + offset,
                item.as_ref(),
                self.query.match_mode,
                self.context.syntax,
            );
            if let Some(score) = scorer.score(&candidate) {
                matched += 1;
                top.insert_with(score, candidate.index, |out| scorer.match_positions(out));
            }
        }

        trace!(base, len = items.len(), matched, kept = top.len(), "partition scanned");
        top
    }
}

/// Combine per-worker results into the final ranking
pub fn merge_ranked(partials: Vec<TopKHeap>, limit: usize) -> Vec<RankedMatch> {
    let mut all: Vec<RankedMatch> = partials.into_iter().flat_map(TopKHeap::into_vec).collect();

    if limit > 0 && all.len() > limit {
        all.select_nth_unstable_by(limit - 1, compare_ranked);
        all.truncate(limit);
    }
    all.sort_unstable_by(compare_ranked);
    all
}
