//! Map-reduce analysis over a review collection.
//!
//! Reviews are (optionally) labelled, partitioned into chunks, each chunk is
//! summarized independently, failed chunks get one recovery attempt
//! according to policy, and the chunk results are reduced into one
//! [`ComprehensiveSummary`].

mod dispatcher;
mod labeler;
mod planner;
mod recovery;
mod reducer;
mod sequential;
mod summarizer;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use dispatcher::ParallelDispatcher;
pub use labeler::ReviewLabeler;
pub use planner::plan_with;
pub use recovery::recover;
pub use reducer::Reducer;
pub use sequential::{per_review_chunks, summarize_each_review, summarize_sequential};
pub use summarizer::ChunkSummarizer;
pub use types::*;

use crate::classifier::Classifier;
use crate::config::{Config, ExecutionMode};
use crate::review::Review;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// How the chunk stage is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Planned chunks, dispatched per the configured mode
    Chunked(ExecutionMode),
    /// One chunk per review, sequentially
    PerReview,
}

pub struct Pipeline {
    config: Config,
    classifier: Arc<dyn Classifier>,
    strategy: Strategy,
}

impl Pipeline {
    pub fn new(config: &Config, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            config: config.clone(),
            classifier,
            strategy: Strategy::Chunked(config.mode),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Chunks the given reviews would be split into.
    pub fn plan(&self, reviews: Vec<Review>) -> Vec<Chunk> {
        plan_with(reviews, self.config.chunking())
    }

    pub async fn run(&self, reviews: Vec<Review>) -> AnalysisReport {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting analysis {} over {} reviews", run_id, reviews.len());

        let config = &self.config;
        let chunk_timeout = config.chunk_timeout();

        let (reviews, labeling) = if config.classify_unlabeled {
            ReviewLabeler::new(self.classifier.clone(), config.concurrency)
                .label_unlabeled(reviews)
                .await
        } else {
            (reviews, Vec::new())
        };

        let summarizer = ChunkSummarizer::new(self.classifier.clone());
        let (chunks, results) = match self.strategy {
            Strategy::Chunked(mode) => {
                let chunks = self.plan(reviews);
                info!("Planned {} chunks", chunks.len());
                let results = match mode {
                    ExecutionMode::Parallel => {
                        ParallelDispatcher::new(
                            summarizer.clone(),
                            config.concurrency,
                            chunk_timeout,
                            config.launch_delay(),
                        )
                        .dispatch(&chunks)
                        .await
                    }
                    ExecutionMode::Sequential => {
                        summarize_sequential(&summarizer, &chunks, chunk_timeout).await
                    }
                };
                (chunks, results)
            }
            Strategy::PerReview => {
                let results = summarize_each_review(&summarizer, &reviews, chunk_timeout).await;
                (per_review_chunks(reviews), results)
            }
        };

        let results = recover(
            config.failed_chunk_policy,
            &summarizer,
            &chunks,
            results,
            chunk_timeout,
        )
        .await;

        let reduction = Reducer::new(self.classifier.clone()).reduce(&results).await;
        let coverage = Coverage::new(&chunks, &reduction.excluded_chunk_ids);

        info!(
            "Analysis {} finished: {} reviews counted, {}/{} chunks failed, narrative {}",
            run_id,
            reduction.summary.total_reviews,
            coverage.chunks_failed,
            coverage.chunks_total,
            reduction.narrative
        );

        AnalysisReport {
            run_id,
            summary: reduction.summary,
            coverage,
            narrative: reduction.narrative,
            chunk_results: results,
            labeling,
            duration: start.elapsed(),
        }
    }
}
