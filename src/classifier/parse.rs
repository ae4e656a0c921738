use super::{BatchSummary, Classification, Synthesis};
use crate::error::ClassifierError;
use crate::review::{Category, Sentiment, TagsField};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;

#[derive(Deserialize)]
struct RawClassification {
    #[serde(default)]
    summary: String,
    sentiment: Sentiment,
    #[serde(alias = "segment", alias = "category")]
    tags: TagsField,
}

pub fn parse_classification(raw: &str) -> Result<Classification, ClassifierError> {
    let parsed: RawClassification = parse_model_json(raw, "classification")?;
    let mut tags: BTreeSet<Category> = parsed.tags.into_set();
    if tags.is_empty() {
        tags.insert(Category::Other);
    }
    Ok(Classification {
        summary: parsed.summary,
        sentiment: parsed.sentiment,
        tags,
    })
}

pub fn parse_batch_summary(raw: &str) -> Result<BatchSummary, ClassifierError> {
    parse_model_json(raw, "batch summary")
}

pub fn parse_synthesis(raw: &str) -> Result<Synthesis, ClassifierError> {
    let synthesis: Synthesis = parse_model_json(raw, "synthesis")?;
    if synthesis.summary.trim().is_empty() {
        return Err(ClassifierError::Classification(
            "synthesis returned an empty summary".to_string(),
        ));
    }
    Ok(synthesis)
}

/// Pull the JSON object out of a model answer and deserialize it into `T`.
fn parse_model_json<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, ClassifierError> {
    let body = unwrap_envelope(raw);
    let json_str = extract_json(&body).ok_or_else(|| {
        ClassifierError::Classification(format!("no JSON object found in {} output", what))
    })?;

    serde_json::from_str::<T>(&json_str).map_err(|e| {
        tracing::debug!("Rejected {} JSON: {}", what, json_str);
        ClassifierError::Classification(format!("{} does not match schema: {}", what, e))
    })
}

/// Claude wraps the answer in {"result": "...", ...}
fn unwrap_envelope(raw: &str) -> String {
    #[derive(Deserialize)]
    struct ClaudeOutput {
        result: String,
    }

    match serde_json::from_str::<ClaudeOutput>(raw.trim()) {
        Ok(out) => out.result,
        Err(_) => raw.to_string(),
    }
}

/// Extract JSON object from a string that might contain markdown code blocks
fn extract_json(s: &str) -> Option<String> {
    // First try: the whole string is valid JSON
    if s.trim().starts_with('{') && serde_json::from_str::<serde_json::Value>(s.trim()).is_ok() {
        return Some(s.trim().to_string());
    }

    // Second try: extract from markdown code block
    let re = regex::Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").ok()?;
    for cap in re.captures_iter(s) {
        let potential_json = cap.get(1)?.as_str().trim();
        if serde_json::from_str::<serde_json::Value>(potential_json).is_ok() {
            return Some(potential_json.to_string());
        }
    }

    // Third try: first balanced object
    let brace_start = s.find('{')?;
    let mut depth = 0;
    let mut end = brace_start;

    for (i, c) in s[brace_start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = brace_start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > brace_start {
        let potential_json = &s[brace_start..end];
        if serde_json::from_str::<serde_json::Value>(potential_json).is_ok() {
            return Some(potential_json.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::SentimentCounts;

    #[test]
    fn test_classification_with_single_tag() {
        let raw = r#"{"summary": "Slow app", "sentiment": "Negative", "tags": "Performance"}"#;
        let c = parse_classification(raw).unwrap();
        assert_eq!(c.sentiment, Sentiment::Negative);
        assert_eq!(c.tags, BTreeSet::from([Category::Performance]));
    }

    #[test]
    fn test_classification_legacy_segment_key() {
        let raw = r#"{"summary": "s", "sentiment": "positive", "segment": ["UI/UX", "Mobile"]}"#;
        let c = parse_classification(raw).unwrap();
        assert_eq!(c.sentiment, Sentiment::Positive);
        assert_eq!(c.tags.len(), 2);
    }

    #[test]
    fn test_classification_empty_tags_become_other() {
        let raw = r#"{"summary": "s", "sentiment": "Neutral", "tags": []}"#;
        let c = parse_classification(raw).unwrap();
        assert_eq!(c.tags, BTreeSet::from([Category::Other]));
    }

    #[test]
    fn test_classification_unknown_sentiment_is_schema_violation() {
        let raw = r#"{"summary": "s", "sentiment": "Mixed", "tags": "Bugs"}"#;
        let err = parse_classification(raw).unwrap_err();
        assert!(matches!(err, ClassifierError::Classification(_)));
    }

    #[test]
    fn test_batch_summary_inside_claude_envelope_and_fence() {
        let inner = "Here you go:\n```json\n{\"total_reviews\": 2, \"sentiment_distribution\": {\"Positive\": 1, \"Negative\": 1, \"Neutral\": 0}, \"category_distribution\": {\"Bugs\": {\"Positive\": 0, \"Negative\": 1, \"Neutral\": 0}}, \"summary\": \"Mixed\", \"key_insights\": [\"crashes\"]}\n```";
        let raw = serde_json::json!({"type": "result", "result": inner}).to_string();

        let batch = parse_batch_summary(&raw).unwrap();
        assert_eq!(batch.total_reviews, 2);
        assert_eq!(batch.sentiment_distribution, SentimentCounts::new(1, 1, 0));
        assert_eq!(
            batch.category_distribution[&Category::Bugs],
            SentimentCounts::new(0, 1, 0)
        );
        assert_eq!(batch.key_insights, vec!["crashes".to_string()]);
    }

    #[test]
    fn test_batch_summary_missing_counts_rejected() {
        let raw = r#"{"summary": "no numbers here"}"#;
        assert!(matches!(
            parse_batch_summary(raw),
            Err(ClassifierError::Classification(_))
        ));
    }

    #[test]
    fn test_synthesis_keys() {
        let raw = r#"Sure. {"Final_summary": "Users like it", "Final_key_insights": ["fast"]} Done."#;
        let s = parse_synthesis(raw).unwrap();
        assert_eq!(s.summary, "Users like it");
        assert_eq!(s.key_insights, vec!["fast".to_string()]);
    }

    #[test]
    fn test_no_json_is_classification_error() {
        let err = parse_synthesis("I cannot help with that").unwrap_err();
        assert!(err.to_string().contains("no JSON object"));
    }
}
