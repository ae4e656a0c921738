//! Reducer: merges chunk results into the comprehensive summary.
//!
//! Counts are merged locally and exactly. Only the narrative goes back to
//! the classifier, as one synthesis call over the chunk summaries.

use super::types::{ChunkResult, ComprehensiveSummary, NarrativeStatus};
use crate::classifier::Classifier;
use crate::error::{AggregationError, ErrorKind, ErrorRecord};
use crate::review::{merge_categories, CategoryDistribution, SentimentCounts};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Reduction {
    pub summary: ComprehensiveSummary,
    /// Chunks left out of the totals because they failed
    pub excluded_chunk_ids: Vec<usize>,
    pub narrative: NarrativeStatus,
}

/// Totals over the non-failed results.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergedCounts {
    pub total_reviews: usize,
    pub sentiment_distribution: SentimentCounts,
    pub category_distribution: CategoryDistribution,
}

pub fn merge_counts(results: &[ChunkResult]) -> MergedCounts {
    let mut merged = MergedCounts::default();
    for result in results.iter().filter(|r| !r.is_failed()) {
        merged.total_reviews += result.total_reviews;
        merged
            .sentiment_distribution
            .add(&result.sentiment_distribution);
        merge_categories(
            &mut merged.category_distribution,
            &result.category_distribution,
        );
    }
    merged
}

pub struct Reducer {
    classifier: Arc<dyn Classifier>,
}

impl Reducer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub async fn reduce(&self, results: &[ChunkResult]) -> Reduction {
        let excluded_chunk_ids: Vec<usize> = results
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| r.chunk_id)
            .collect();

        if !excluded_chunk_ids.is_empty() {
            warn!(
                "Excluding {} failed chunk(s) from totals: {:?}",
                excluded_chunk_ids.len(),
                excluded_chunk_ids
            );
        }

        let merged = merge_counts(results);
        let mut summary = ComprehensiveSummary {
            total_reviews: merged.total_reviews,
            sentiment_distribution: merged.sentiment_distribution,
            category_distribution: merged.category_distribution,
            summary: String::new(),
            key_insights: Vec::new(),
        };

        let summaries: Vec<&str> = results
            .iter()
            .filter(|r| !r.is_failed())
            .map(|r| r.summary.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if summaries.is_empty() {
            info!("No chunk summaries to synthesize");
            return Reduction {
                summary,
                excluded_chunk_ids,
                narrative: NarrativeStatus::Skipped,
            };
        }

        let concatenated = summaries.join("\n");

        info!("Synthesizing {} chunk summaries", summaries.len());

        let narrative = match self.classifier.synthesize_summaries(&concatenated).await {
            Ok(synthesis) => {
                summary.summary = synthesis.summary;
                summary.key_insights = synthesis.key_insights;
                NarrativeStatus::Synthesized
            }
            Err(e) => {
                let err = AggregationError::from(e);
                warn!("{}", err);
                NarrativeStatus::Unavailable {
                    error: ErrorRecord::new(ErrorKind::Aggregation, err.to_string()),
                }
            }
        };

        Reduction {
            summary,
            excluded_chunk_ids,
            narrative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::StubClassifier;
    use crate::review::Category;

    fn ok(chunk_id: usize, counts: SentimentCounts, summary: &str) -> ChunkResult {
        let mut categories = CategoryDistribution::new();
        categories.insert(Category::Bugs, counts);
        ChunkResult {
            chunk_id,
            total_reviews: counts.total(),
            sentiment_distribution: counts,
            category_distribution: categories,
            summary: summary.to_string(),
            key_insights: vec![],
            error: None,
        }
    }

    fn failed(chunk_id: usize) -> ChunkResult {
        ChunkResult::failed(chunk_id, ErrorRecord::new(ErrorKind::Transport, "down"))
    }

    #[tokio::test]
    async fn test_reduce_empty_makes_no_call() {
        let stub = Arc::new(StubClassifier::counting());
        let reduction = Reducer::new(stub.clone()).reduce(&[]).await;

        assert_eq!(reduction.summary, ComprehensiveSummary::default());
        assert_eq!(reduction.narrative, NarrativeStatus::Skipped);
        assert!(reduction.excluded_chunk_ids.is_empty());
        assert_eq!(stub.synth_calls(), 0);
    }

    #[tokio::test]
    async fn test_all_failed_chunks_skip_synthesis() {
        let stub = Arc::new(StubClassifier::counting());
        let reduction = Reducer::new(stub.clone())
            .reduce(&[failed(0), failed(1)])
            .await;

        assert_eq!(reduction.summary.total_reviews, 0);
        assert_eq!(reduction.excluded_chunk_ids, vec![0, 1]);
        assert_eq!(reduction.narrative, NarrativeStatus::Skipped);
        assert_eq!(stub.synth_calls(), 0);
    }

    #[tokio::test]
    async fn test_totals_sum_non_failed_chunks() {
        let stub = Arc::new(StubClassifier::counting());
        let results = vec![
            ok(0, SentimentCounts::new(2, 1, 0), "first"),
            failed(1),
            ok(2, SentimentCounts::new(1, 0, 3), "third"),
        ];

        let reduction = Reducer::new(stub.clone()).reduce(&results).await;
        let summary = &reduction.summary;
        assert_eq!(summary.total_reviews, 7);
        assert_eq!(summary.sentiment_distribution, SentimentCounts::new(3, 1, 3));
        assert_eq!(
            summary.category_distribution[&Category::Bugs],
            SentimentCounts::new(3, 1, 3)
        );
        assert_eq!(reduction.excluded_chunk_ids, vec![1]);
        assert_eq!(reduction.narrative, NarrativeStatus::Synthesized);
        assert_eq!(summary.summary, "merged 2 summaries");
        assert_eq!(summary.key_insights, vec!["first", "third"]);
        assert_eq!(stub.synth_calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_summaries_are_not_synthesized() {
        let stub = Arc::new(StubClassifier::counting());
        let results = vec![
            ok(0, SentimentCounts::new(1, 0, 0), ""),
            ok(1, SentimentCounts::new(0, 1, 0), "  \n "),
        ];

        let reduction = Reducer::new(stub.clone()).reduce(&results).await;
        assert_eq!(reduction.summary.total_reviews, 2);
        assert_eq!(reduction.narrative, NarrativeStatus::Skipped);
        assert_eq!(stub.synth_calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_summaries_are_left_out_of_synthesis() {
        let stub = Arc::new(StubClassifier::counting());
        let results = vec![
            ok(0, SentimentCounts::new(1, 0, 0), ""),
            ok(1, SentimentCounts::new(0, 1, 0), "second"),
        ];

        let reduction = Reducer::new(stub.clone()).reduce(&results).await;
        assert_eq!(reduction.narrative, NarrativeStatus::Synthesized);
        assert_eq!(reduction.summary.key_insights, vec!["second"]);
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_counts() {
        let stub = Arc::new(StubClassifier::counting().failing_synthesis());
        let results = vec![ok(0, SentimentCounts::new(1, 1, 1), "only")];

        let reduction = Reducer::new(stub).reduce(&results).await;
        assert_eq!(reduction.summary.total_reviews, 3);
        assert!(reduction.summary.summary.is_empty());
        match reduction.narrative {
            NarrativeStatus::Unavailable { error } => {
                assert_eq!(error.kind, ErrorKind::Aggregation)
            }
            other => panic!("unexpected narrative: {:?}", other),
        }
    }

    #[test]
    fn test_merge_counts_ignores_failed() {
        let merged = merge_counts(&[failed(0), ok(1, SentimentCounts::new(0, 2, 0), "x")]);
        assert_eq!(merged.total_reviews, 2);
        assert_eq!(merged.sentiment_distribution.negative, 2);
    }
}
