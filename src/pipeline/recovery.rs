use super::summarizer::ChunkSummarizer;
use super::types::{Chunk, ChunkResult};
use crate::config::FailedChunkPolicy;
use crate::error::{ErrorKind, ErrorRecord};
use crate::review::merge_categories;
use std::time::Duration;
use tracing::{info, warn};

/// Second attempt at failed chunks, after the dispatch barrier.
///
/// Returns the results with recovered chunks replaced in place. Chunk ids and
/// ordering are unchanged. Under [`FailedChunkPolicy::Drop`] this is a no-op.
pub async fn recover(
    policy: FailedChunkPolicy,
    summarizer: &ChunkSummarizer,
    chunks: &[Chunk],
    results: Vec<ChunkResult>,
    chunk_timeout: Duration,
) -> Vec<ChunkResult> {
    if policy == FailedChunkPolicy::Drop || results.iter().all(|r| !r.is_failed()) {
        return results;
    }

    let failed = results.iter().filter(|r| r.is_failed()).count();
    info!("Recovering {} failed chunk(s) with policy {}", failed, policy);

    let mut recovered = Vec::with_capacity(results.len());
    for result in results {
        if !result.is_failed() {
            recovered.push(result);
            continue;
        }
        let Some(chunk) = chunks.iter().find(|c| c.id == result.chunk_id) else {
            recovered.push(result);
            continue;
        };

        let parts = match policy {
            FailedChunkPolicy::Drop => {
                recovered.push(result);
                continue;
            }
            FailedChunkPolicy::RetryIndividually => split_each(chunk),
            FailedChunkPolicy::Split => match split_halves(chunk) {
                Some(parts) => parts,
                None => {
                    recovered.push(result);
                    continue;
                }
            },
        };

        let mut sub_results = Vec::with_capacity(parts.len());
        for part in &parts {
            sub_results.push(summarizer.summarize_within(part, chunk_timeout).await);
        }

        let merged = merge_parts(chunk.id, sub_results);
        if merged.is_failed() {
            warn!("Chunk {} still failing after recovery", chunk.id);
            recovered.push(result);
        } else {
            info!("Chunk {} recovered from {} parts", chunk.id, parts.len());
            recovered.push(merged);
        }
    }
    recovered
}

fn split_each(chunk: &Chunk) -> Vec<Chunk> {
    chunk
        .reviews
        .iter()
        .map(|review| Chunk {
            id: chunk.id,
            reviews: vec![review.clone()],
        })
        .collect()
}

/// Two halves; `None` when the chunk is too small to split.
fn split_halves(chunk: &Chunk) -> Option<Vec<Chunk>> {
    if chunk.len() < 2 {
        return None;
    }
    let (left, right) = chunk.reviews.split_at(chunk.len() / 2);
    Some(vec![
        Chunk {
            id: chunk.id,
            reviews: left.to_vec(),
        },
        Chunk {
            id: chunk.id,
            reviews: right.to_vec(),
        },
    ])
}

/// Combine sub-results under the original chunk id. Any failed part fails
/// the whole chunk.
fn merge_parts(chunk_id: usize, parts: Vec<ChunkResult>) -> ChunkResult {
    if parts.is_empty() {
        return ChunkResult::failed(
            chunk_id,
            ErrorRecord::new(ErrorKind::InputValidation, "chunk has no reviews"),
        );
    }
    if let Some(error) = parts.iter().find_map(|p| p.error.clone()) {
        return ChunkResult::failed(chunk_id, error);
    }

    let mut merged = ChunkResult {
        chunk_id,
        total_reviews: 0,
        sentiment_distribution: Default::default(),
        category_distribution: Default::default(),
        summary: String::new(),
        key_insights: Vec::new(),
        error: None,
    };
    let mut summaries = Vec::with_capacity(parts.len());
    for part in parts {
        merged.total_reviews += part.total_reviews;
        merged
            .sentiment_distribution
            .add(&part.sentiment_distribution);
        merge_categories(
            &mut merged.category_distribution,
            &part.category_distribution,
        );
        summaries.push(part.summary);
        merged.key_insights.extend(part.key_insights);
    }
    merged.summary = summaries.join(" ");
    merged
}
