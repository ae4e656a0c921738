use super::types::Chunk;
use crate::config::Chunking;
use crate::review::Review;

/// Plan chunks under either sizing rule.
pub fn plan_with(reviews: Vec<Review>, chunking: Chunking) -> Vec<Chunk> {
    match chunking {
        Chunking::Target(target) => plan(reviews, target),
        Chunking::MaxPerChunk(max) => plan_by_size(reviews, max),
    }
}

/// Split reviews into at most `target_chunk_count` contiguous chunks.
///
/// Every chunk holds `max(1, len / target)` reviews except the last, which
/// also takes the remainder. Chunk ids follow input order starting at 0.
pub fn plan(reviews: Vec<Review>, target_chunk_count: usize) -> Vec<Chunk> {
    if reviews.is_empty() {
        return Vec::new();
    }

    let target = target_chunk_count.max(1);
    let chunk_size = (reviews.len() / target).max(1);

    let mut chunks: Vec<Chunk> = Vec::with_capacity(target);
    let mut rest = reviews.into_iter().peekable();

    while rest.peek().is_some() {
        let id = chunks.len();
        let reviews: Vec<Review> = if id + 1 == target {
            rest.by_ref().collect()
        } else {
            rest.by_ref().take(chunk_size).collect()
        };
        chunks.push(Chunk { id, reviews });
    }

    chunks
}

/// Contiguous chunks of `max_per_chunk` reviews; only the last may be shorter.
pub fn plan_by_size(reviews: Vec<Review>, max_per_chunk: usize) -> Vec<Chunk> {
    reviews
        .chunks(max_per_chunk.max(1))
        .enumerate()
        .map(|(id, slice)| Chunk {
            id,
            reviews: slice.to_vec(),
        })
        .collect()
}
