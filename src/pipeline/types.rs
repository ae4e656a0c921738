use crate::classifier::Classification;
use crate::error::ErrorRecord;
use crate::review::{CategoryDistribution, Review, SentimentCounts};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A contiguous run of reviews summarized as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: usize,
    pub reviews: Vec<Review>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunk_id: usize,
    pub total_reviews: usize,
    pub sentiment_distribution: SentimentCounts,
    pub category_distribution: CategoryDistribution,
    pub summary: String,
    pub key_insights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
}

impl ChunkResult {
    /// Result for a chunk that could not be summarized. Counts stay at zero.
    pub fn failed(chunk_id: usize, error: ErrorRecord) -> Self {
        Self {
            chunk_id,
            total_reviews: 0,
            sentiment_distribution: SentimentCounts::default(),
            category_distribution: CategoryDistribution::new(),
            summary: String::new(),
            key_insights: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// The final report. Serializes to exactly the five documented keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComprehensiveSummary {
    pub total_reviews: usize,
    pub sentiment_distribution: SentimentCounts,
    pub category_distribution: CategoryDistribution,
    pub summary: String,
    pub key_insights: Vec<String>,
}

/// How much of the input made it into the final report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub chunks_total: usize,
    pub chunks_failed: usize,
    pub failed_chunk_ids: Vec<usize>,
    pub reviews_total: usize,
    pub reviews_excluded: usize,
    pub partial: bool,
}

impl Coverage {
    pub fn new(chunks: &[Chunk], excluded_chunk_ids: &[usize]) -> Self {
        let reviews_total = chunks.iter().map(Chunk::len).sum();
        let reviews_excluded = chunks
            .iter()
            .filter(|c| excluded_chunk_ids.contains(&c.id))
            .map(Chunk::len)
            .sum();
        Self {
            chunks_total: chunks.len(),
            chunks_failed: excluded_chunk_ids.len(),
            failed_chunk_ids: excluded_chunk_ids.to_vec(),
            reviews_total,
            reviews_excluded,
            partial: !excluded_chunk_ids.is_empty(),
        }
    }
}

/// Outcome of the narrative merge step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NarrativeStatus {
    Synthesized,
    /// Nothing to synthesize: no chunk succeeded with a non-blank summary
    Skipped,
    /// Synthesis failed; counts are still valid
    Unavailable { error: ErrorRecord },
}

impl std::fmt::Display for NarrativeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NarrativeStatus::Synthesized => write!(f, "synthesized"),
            NarrativeStatus::Skipped => write!(f, "skipped"),
            NarrativeStatus::Unavailable { error } => write!(f, "unavailable ({})", error),
        }
    }
}

/// Per-review result of the labelling stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
}

#[derive(Debug)]
pub struct AnalysisReport {
    pub run_id: String,
    pub summary: ComprehensiveSummary,
    pub coverage: Coverage,
    pub narrative: NarrativeStatus,
    pub chunk_results: Vec<ChunkResult>,
    pub labeling: Vec<ReviewOutcome>,
    pub duration: Duration,
}

impl AnalysisReport {
    pub fn labeling_failures(&self) -> usize {
        self.labeling.iter().filter(|o| o.error.is_some()).count()
    }
}
