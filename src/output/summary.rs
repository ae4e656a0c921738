use crate::error::OutputError;
use crate::pipeline::{AnalysisReport, Coverage, NarrativeStatus};
use crate::review::{Category, Sentiment};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Contents of `coverage.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CoverageReport {
    pub run_id: String,
    pub timestamp: String,
    pub duration_sec: f64,
    pub coverage: Coverage,
    pub narrative: NarrativeStatus,
    pub labeling_failures: usize,
}

/// Write `summary.json`, `chunks.json`, `coverage.json` and `summary.md`.
pub fn write_report(report_dir: &Path, report: &AnalysisReport) -> Result<(), OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let json = serde_json::to_string_pretty(&report.summary)?;
    fs::write(report_dir.join("summary.json"), json).map_err(OutputError::WriteReport)?;

    let json = serde_json::to_string_pretty(&report.chunk_results)?;
    fs::write(report_dir.join("chunks.json"), json).map_err(OutputError::WriteReport)?;

    let coverage = CoverageReport {
        run_id: report.run_id.clone(),
        timestamp: Utc::now().to_rfc3339(),
        duration_sec: report.duration.as_secs_f64(),
        coverage: report.coverage.clone(),
        narrative: report.narrative.clone(),
        labeling_failures: report.labeling_failures(),
    };
    let json = serde_json::to_string_pretty(&coverage)?;
    fs::write(report_dir.join("coverage.json"), json).map_err(OutputError::WriteReport)?;

    fs::write(report_dir.join("summary.md"), build_summary_markdown(report))
        .map_err(OutputError::WriteReport)?;

    Ok(())
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

pub fn build_summary_markdown(report: &AnalysisReport) -> String {
    let summary = &report.summary;
    let coverage = &report.coverage;
    let mut md = String::new();

    md.push_str("# Review Analysis\n\n");
    md.push_str(&format!("**Run:** `{}`\n\n", report.run_id));
    md.push_str(&format!(
        "**Duration:** {:.1}s\n\n",
        report.duration.as_secs_f64()
    ));

    if coverage.partial {
        md.push_str(&format!(
            "> ⚠️ Partial coverage: {} of {} chunks failed ({} reviews excluded, chunk ids {:?})\n\n",
            coverage.chunks_failed,
            coverage.chunks_total,
            coverage.reviews_excluded,
            coverage.failed_chunk_ids
        ));
    }

    // Sentiment
    md.push_str("## Sentiment\n\n");
    md.push_str("| Sentiment | Count | Share |\n");
    md.push_str("|-----------|-------|-------|\n");
    for sentiment in Sentiment::ALL {
        let count = summary.sentiment_distribution.get(sentiment);
        md.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            sentiment,
            count,
            percent(count, summary.total_reviews)
        ));
    }
    md.push_str(&format!("| **Total** | {} | |\n\n", summary.total_reviews));

    // Categories
    if !summary.category_distribution.is_empty() {
        md.push_str("## Categories\n\n");
        md.push_str("| Category | Positive | Negative | Neutral |\n");
        md.push_str("|----------|----------|----------|---------|\n");
        for category in Category::ALL {
            if let Some(counts) = summary.category_distribution.get(&category) {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    category, counts.positive, counts.negative, counts.neutral
                ));
            }
        }
        md.push('\n');
    }

    // Narrative
    md.push_str("## Summary\n\n");
    match &report.narrative {
        NarrativeStatus::Synthesized => {
            md.push_str(&format!("{}\n\n", summary.summary));
            if !summary.key_insights.is_empty() {
                md.push_str("## Key Insights\n\n");
                for insight in &summary.key_insights {
                    md.push_str(&format!("- {}\n", insight));
                }
                md.push('\n');
            }
        }
        NarrativeStatus::Skipped => md.push_str("*No chunk summaries to synthesize*\n\n"),
        NarrativeStatus::Unavailable { error } => {
            md.push_str(&format!("*Narrative unavailable: {}*\n\n", error));
        }
    }

    // Chunks
    md.push_str("## Chunks\n\n");
    md.push_str("| Chunk | Reviews | Status |\n");
    md.push_str("|-------|---------|--------|\n");
    for result in &report.chunk_results {
        let status = match &result.error {
            None => "✅ ok".to_string(),
            Some(error) => format!("❌ {}", error),
        };
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            result.chunk_id, result.total_reviews, status
        ));
    }

    md
}
