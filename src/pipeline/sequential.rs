use super::summarizer::ChunkSummarizer;
use super::types::{Chunk, ChunkResult};
use crate::review::Review;
use std::time::Duration;
use tracing::info;

/// Summarize chunks one at a time. Same results as the parallel dispatcher.
pub async fn summarize_sequential(
    summarizer: &ChunkSummarizer,
    chunks: &[Chunk],
    chunk_timeout: Duration,
) -> Vec<ChunkResult> {
    if chunks.is_empty() {
        return Vec::new();
    }

    info!("Summarizing {} chunks sequentially", chunks.len());

    let mut results = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        results.push(summarizer.summarize_within(chunk, chunk_timeout).await);
    }
    results
}

/// Summarize every review as its own one-review chunk.
pub async fn summarize_each_review(
    summarizer: &ChunkSummarizer,
    reviews: &[Review],
    chunk_timeout: Duration,
) -> Vec<ChunkResult> {
    let chunks = per_review_chunks(reviews.to_vec());
    summarize_sequential(summarizer, &chunks, chunk_timeout).await
}

/// One chunk per review, ids following input order.
pub fn per_review_chunks(reviews: Vec<Review>) -> Vec<Chunk> {
    reviews
        .into_iter()
        .enumerate()
        .map(|(id, review)| Chunk {
            id,
            reviews: vec![review],
        })
        .collect()
}
