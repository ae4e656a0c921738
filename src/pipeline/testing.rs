//! Deterministic in-process classifier for pipeline tests.

use crate::classifier::{BatchSummary, Classification, Classifier, Synthesis};
use crate::error::{ClassifierError, ProviderError};
use crate::review::{Category, CategoryDistribution, Review, Sentiment, SentimentCounts};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn labelled(text: &str, sentiment: Sentiment, tags: &[Category]) -> Review {
    Review::new(text)
        .unwrap()
        .labelled(Some(sentiment), tags.iter().copied())
}

/// Counts the labels in the formatted block it is handed, the way a
/// well-behaved model would.
#[derive(Default)]
pub struct StubClassifier {
    batch_calls: AtomicUsize,
    classify_calls: AtomicUsize,
    synth_calls: AtomicUsize,
    fail_marker: Option<String>,
    skewed: bool,
    delay: Option<Duration>,
    slow_marker: Option<(String, Duration)>,
    fail_synthesis: bool,
    max_batch: Option<usize>,
}

impl StubClassifier {
    pub fn counting() -> Self {
        Self::default()
    }

    /// Batches whose text contains `marker` fail with a transport error.
    /// Single reviews containing it fail classification the same way.
    pub fn failing_batches_containing(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    /// Report one extra positive review so the sum never matches.
    pub fn with_skewed_counts(mut self) -> Self {
        self.skewed = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Only batches containing `marker` are delayed.
    pub fn slow_when_containing(mut self, marker: &str, delay: Duration) -> Self {
        self.slow_marker = Some((marker.to_string(), delay));
        self
    }

    /// Batches of more than `max` reviews fail with a transport error.
    pub fn failing_batches_larger_than(mut self, max: usize) -> Self {
        self.max_batch = Some(max);
        self
    }

    pub fn failing_synthesis(mut self) -> Self {
        self.fail_synthesis = true;
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn synth_calls(&self) -> usize {
        self.synth_calls.load(Ordering::SeqCst)
    }

    fn transport_failure() -> ClassifierError {
        ClassifierError::Transport(ProviderError::Timeout(Duration::from_secs(1)))
    }

    fn hits_marker(&self, text: &str) -> bool {
        self.fail_marker
            .as_deref()
            .is_some_and(|marker| text.contains(marker))
    }
}

fn field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.split(" | ")
        .find_map(|part| part.strip_prefix(name))
        .map(str::trim)
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify_review(&self, text: &str) -> Result<Classification, ClassifierError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        if self.hits_marker(text) {
            return Err(Self::transport_failure());
        }
        let lower = text.to_lowercase();
        let sentiment = if lower.contains("love") || lower.contains("great") {
            Sentiment::Positive
        } else if lower.contains("hate") || lower.contains("broken") {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };
        let tags = if lower.contains("crash") {
            BTreeSet::from([Category::Bugs])
        } else {
            BTreeSet::from([Category::Other])
        };
        Ok(Classification {
            summary: text.to_string(),
            sentiment,
            tags,
        })
    }

    async fn summarize_batch(
        &self,
        formatted_reviews: &str,
    ) -> Result<BatchSummary, ClassifierError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((marker, delay)) = &self.slow_marker {
            if formatted_reviews.contains(marker.as_str()) {
                tokio::time::sleep(*delay).await;
            }
        }
        if self.hits_marker(formatted_reviews) {
            return Err(Self::transport_failure());
        }
        if self
            .max_batch
            .is_some_and(|max| formatted_reviews.lines().count() > max)
        {
            return Err(Self::transport_failure());
        }

        let mut sentiment = SentimentCounts::default();
        let mut categories = CategoryDistribution::new();
        let mut total = 0;
        for line in formatted_reviews.lines() {
            total += 1;
            let s = field(line, "Sentiment:")
                .and_then(|s| s.parse::<Sentiment>().ok())
                .unwrap_or(Sentiment::Neutral);
            sentiment.increment(s);
            if let Some(tags) = field(line, "Tags:") {
                for tag in tags.split(", ").filter_map(|t| t.parse::<Category>().ok()) {
                    categories.entry(tag).or_default().increment(s);
                }
            }
        }
        if self.skewed {
            sentiment.positive += 1;
        }

        Ok(BatchSummary {
            total_reviews: total,
            sentiment_distribution: sentiment,
            category_distribution: categories,
            summary: format!("{} reviews", total),
            key_insights: vec![format!("insight over {} reviews", total)],
        })
    }

    async fn synthesize_summaries(
        &self,
        concatenated_summaries: &str,
    ) -> Result<Synthesis, ClassifierError> {
        self.synth_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_synthesis {
            return Err(Self::transport_failure());
        }
        Ok(Synthesis {
            summary: format!("merged {} summaries", concatenated_summaries.lines().count()),
            key_insights: concatenated_summaries.lines().map(String::from).collect(),
        })
    }
}
