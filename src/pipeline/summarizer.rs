use super::types::{Chunk, ChunkResult};
use crate::classifier::{BatchSummary, Classifier};
use crate::error::{ErrorKind, ErrorRecord};
use crate::review::{CategoryDistribution, Review, SentimentCounts};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;
use tracing::{debug, warn};

/// Summarizes one chunk through the classifier's batch capability.
///
/// Never fails: any error is recorded on the returned [`ChunkResult`].
#[derive(Clone)]
pub struct ChunkSummarizer {
    classifier: Arc<dyn Classifier>,
}

impl ChunkSummarizer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub async fn summarize(&self, chunk: &Chunk) -> ChunkResult {
        if chunk.is_empty() {
            return ChunkResult::failed(
                chunk.id,
                ErrorRecord::new(ErrorKind::InputValidation, "chunk has no reviews"),
            );
        }

        let formatted = format_reviews(&chunk.reviews);
        debug!(
            "Summarizing chunk {} ({} reviews, {} bytes)",
            chunk.id,
            chunk.len(),
            formatted.len()
        );

        match self.classifier.summarize_batch(&formatted).await {
            Ok(batch) => reconcile(chunk, batch),
            Err(e) => {
                warn!("Chunk {} failed: {}", chunk.id, e);
                ChunkResult::failed(chunk.id, ErrorRecord::from(&e))
            }
        }
    }

    /// Like [`summarize`](Self::summarize) but gives up after `limit`,
    /// recording a transport error for this chunk only.
    pub async fn summarize_within(&self, chunk: &Chunk, limit: Duration) -> ChunkResult {
        match tokio_timeout(limit, self.summarize(chunk)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Chunk {} timed out after {:?}", chunk.id, limit);
                ChunkResult::failed(
                    chunk.id,
                    ErrorRecord::new(
                        ErrorKind::Transport,
                        format!("chunk timed out after {:?}", limit),
                    ),
                )
            }
        }
    }
}

/// One line per review: text plus whatever labels are known.
pub fn format_reviews(reviews: &[Review]) -> String {
    reviews
        .iter()
        .enumerate()
        .map(|(i, review)| {
            let sentiment = review
                .sentiment()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let tags = if review.tags().is_empty() {
                "Unknown".to_string()
            } else {
                review
                    .tags()
                    .iter()
                    .map(|t| t.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let text = review.text().split_whitespace().collect::<Vec<_>>().join(" ");
            format!(
                "{}. Review: {} | Sentiment: {} | Tags: {}",
                i + 1,
                text,
                sentiment,
                tags
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn the model's answer into a result whose counts match the chunk.
///
/// The total always comes from the chunk itself. When the reported counts
/// disagree with it, they are rebuilt from the reviews' own labels if every
/// review has one; otherwise the chunk is failed.
fn reconcile(chunk: &Chunk, batch: BatchSummary) -> ChunkResult {
    let total = chunk.len();
    if batch.total_reviews != total {
        debug!(
            "Model reported {} reviews for chunk {}, chunk holds {}",
            batch.total_reviews, chunk.id, total
        );
    }

    let mut sentiment = batch.sentiment_distribution;
    let mut categories = batch.category_distribution;

    let sentiment_ok = sentiment.total() == total;
    let categories_ok = categories.values().all(|row| row.total() <= total);

    if !(sentiment_ok && categories_ok) {
        match local_counts(&chunk.reviews) {
            Some((local_sentiment, local_categories)) => {
                warn!(
                    "Chunk {}: model counts inconsistent with {} reviews, recounting from labels",
                    chunk.id, total
                );
                sentiment = local_sentiment;
                categories = local_categories;
            }
            None => {
                let message = if sentiment_ok {
                    format!(
                        "a category row exceeds the {} reviews in the chunk",
                        total
                    )
                } else {
                    format!(
                        "sentiment counts sum to {} but the chunk holds {} reviews",
                        sentiment.total(),
                        total
                    )
                };
                warn!("Chunk {} rejected: {}", chunk.id, message);
                return ChunkResult::failed(
                    chunk.id,
                    ErrorRecord::new(ErrorKind::Classification, message),
                );
            }
        }
    }

    ChunkResult {
        chunk_id: chunk.id,
        total_reviews: total,
        sentiment_distribution: sentiment,
        category_distribution: categories,
        summary: batch.summary,
        key_insights: batch.key_insights,
        error: None,
    }
}

/// Counts from the reviews' own labels, if every review is labelled.
fn local_counts(reviews: &[Review]) -> Option<(SentimentCounts, CategoryDistribution)> {
    let mut sentiment = SentimentCounts::default();
    let mut categories = CategoryDistribution::new();

    for review in reviews {
        let s = review.sentiment()?;
        sentiment.increment(s);
        for tag in review.tags() {
            categories.entry(*tag).or_default().increment(s);
        }
    }

    Some((sentiment, categories))
}
