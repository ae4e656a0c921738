use super::summarizer::ChunkSummarizer;
use super::types::{Chunk, ChunkResult};
use crate::error::{ErrorKind, ErrorRecord};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Runs chunk summaries concurrently and waits for all of them.
pub struct ParallelDispatcher {
    summarizer: ChunkSummarizer,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    chunk_timeout: Duration,
    launch_delay: Duration,
}

impl ParallelDispatcher {
    pub fn new(
        summarizer: ChunkSummarizer,
        concurrency: usize,
        chunk_timeout: Duration,
        launch_delay: Duration,
    ) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            summarizer,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            chunk_timeout,
            launch_delay,
        }
    }

    /// Summarize every chunk and return one result per chunk, in input
    /// order, regardless of completion order.
    pub async fn dispatch(&self, chunks: &[Chunk]) -> Vec<ChunkResult> {
        if chunks.is_empty() {
            return Vec::new();
        }

        info!(
            "Dispatching {} chunks with concurrency {}",
            chunks.len(),
            self.concurrency
        );

        let mut futures = FuturesUnordered::new();

        for (position, chunk) in chunks.iter().enumerate() {
            // Small delay between launches to avoid burst rate limits
            if position > 0 && self.launch_delay > Duration::ZERO {
                sleep(self.launch_delay).await;
            }

            let semaphore = self.semaphore.clone();
            let summarizer = self.summarizer.clone();
            let chunk = chunk.clone();
            let chunk_id = chunk.id;
            let limit = self.chunk_timeout;

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return ChunkResult::failed(
                            chunk.id,
                            ErrorRecord::new(ErrorKind::Internal, e.to_string()),
                        )
                    }
                };
                summarizer.summarize_within(&chunk, limit).await
            });

            futures.push(async move { (position, chunk_id, handle.await) });
        }

        // Barrier: nothing is returned until every task has settled.
        let mut slots: Vec<Option<ChunkResult>> = vec![None; chunks.len()];
        while let Some((position, chunk_id, joined)) = futures.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Chunk {} task failed: {}", chunk_id, e);
                    ChunkResult::failed(
                        chunk_id,
                        ErrorRecord::new(ErrorKind::Internal, format!("task failed: {}", e)),
                    )
                }
            };
            debug!(
                "Chunk {} settled ({})",
                chunk_id,
                if result.is_failed() { "failed" } else { "ok" }
            );
            slots[position] = Some(result);
        }

        slots
            .into_iter()
            .zip(chunks)
            .map(|(slot, chunk)| {
                slot.unwrap_or_else(|| {
                    ChunkResult::failed(
                        chunk.id,
                        ErrorRecord::new(ErrorKind::Internal, "no result recorded"),
                    )
                })
            })
            .collect()
    }
}
