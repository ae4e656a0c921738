//! Classification capability used by the pipeline.
//!
//! The pipeline never talks to a model directly. It depends on the three
//! operations of [`Classifier`]; [`LlmClassifier`] implements them by
//! rendering a prompt, sending it through a provider [`Runner`], and
//! validating the JSON that comes back.
//!
//! [`Runner`]: crate::provider::Runner

mod llm;
mod parse;
mod prompts;
mod retry;

pub use llm::LlmClassifier;

use crate::error::ClassifierError;
use crate::review::{Category, CategoryDistribution, Sentiment, SentimentCounts};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structured label for one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub summary: String,
    pub sentiment: Sentiment,
    pub tags: BTreeSet<Category>,
}

/// Aggregate answer for a block of already-labelled reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_reviews: usize,
    pub sentiment_distribution: SentimentCounts,
    #[serde(default)]
    pub category_distribution: CategoryDistribution,
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
}

/// Second-stage narrative merged from many chunk summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    #[serde(rename = "Final_summary", alias = "summary")]
    pub summary: String,
    #[serde(rename = "Final_key_insights", alias = "key_insights", default)]
    pub key_insights: Vec<String>,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Label a single review text.
    async fn classify_review(&self, text: &str) -> Result<Classification, ClassifierError>;

    /// Count and summarize a pre-formatted block of labelled reviews.
    async fn summarize_batch(&self, formatted_reviews: &str)
        -> Result<BatchSummary, ClassifierError>;

    /// Merge newline-separated chunk summaries into one narrative.
    async fn synthesize_summaries(
        &self,
        concatenated_summaries: &str,
    ) -> Result<Synthesis, ClassifierError>;
}
