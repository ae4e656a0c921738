use super::types::ReviewOutcome;
use crate::classifier::Classifier;
use crate::error::{ErrorKind, ErrorRecord};
use crate::review::Review;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Classifies individual reviews through [`Classifier::classify_review`].
pub struct ReviewLabeler {
    classifier: Arc<dyn Classifier>,
    semaphore: Arc<Semaphore>,
}

impl ReviewLabeler {
    pub fn new(classifier: Arc<dyn Classifier>, concurrency: usize) -> Self {
        Self {
            classifier,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Classify the given reviews. One outcome per review, in input order.
    pub async fn classify_all(&self, reviews: &[Review]) -> Vec<ReviewOutcome> {
        self.classify_indices(reviews, (0..reviews.len()).collect())
            .await
    }

    /// Fill in labels for reviews that arrived without a sentiment.
    ///
    /// Reviews that fail to classify are kept unlabelled; their failures are
    /// in the returned outcomes. Already-labelled reviews are untouched and
    /// produce no outcome.
    pub async fn label_unlabeled(&self, reviews: Vec<Review>) -> (Vec<Review>, Vec<ReviewOutcome>) {
        let pending: Vec<usize> = reviews
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_labelled())
            .map(|(i, _)| i)
            .collect();

        if pending.is_empty() {
            return (reviews, Vec::new());
        }

        info!("Labelling {} unlabelled reviews", pending.len());
        let outcomes = self.classify_indices(&reviews, pending).await;

        let mut reviews = reviews;
        for outcome in &outcomes {
            if let Some(classification) = &outcome.classification {
                let review = reviews[outcome.index].clone();
                reviews[outcome.index] = review.labelled(
                    Some(classification.sentiment),
                    classification.tags.iter().copied(),
                );
            }
        }

        let failures = outcomes.iter().filter(|o| o.error.is_some()).count();
        if failures > 0 {
            warn!("{} reviews could not be labelled", failures);
        }

        (reviews, outcomes)
    }

    async fn classify_indices(
        &self,
        reviews: &[Review],
        indices: Vec<usize>,
    ) -> Vec<ReviewOutcome> {
        let mut futures = FuturesUnordered::new();

        for index in indices {
            let semaphore = self.semaphore.clone();
            let classifier = self.classifier.clone();
            let text = reviews[index].text().to_string();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|e| {
                    ErrorRecord::new(ErrorKind::Internal, e.to_string())
                })?;
                classifier
                    .classify_review(&text)
                    .await
                    .map_err(|e| ErrorRecord::from(&e))
            });
            futures.push(async move { (index, handle.await) });
        }

        let mut outcomes = Vec::new();
        while let Some((index, joined)) = futures.next().await {
            let outcome = match joined {
                Ok(Ok(classification)) => ReviewOutcome {
                    index,
                    classification: Some(classification),
                    error: None,
                },
                Ok(Err(error)) => ReviewOutcome {
                    index,
                    classification: None,
                    error: Some(error),
                },
                Err(e) => ReviewOutcome {
                    index,
                    classification: None,
                    error: Some(ErrorRecord::new(
                        ErrorKind::Internal,
                        format!("task failed: {}", e),
                    )),
                },
            };
            outcomes.push(outcome);
        }

        outcomes.sort_by_key(|o| o.index);
        outcomes
    }
}
