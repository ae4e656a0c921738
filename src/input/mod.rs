//! Review dataset loading.
//!
//! Accepts a JSON array of records, or one record per line. A line may carry
//! a prefix before its object (`review_12 = {...}`) and may use single
//! quotes. Lines without an object are taken as plain review text.

use crate::error::InputError;
use crate::review::{Review, Sentiment, TagsField};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(alias = "review")]
    text: String,
    #[serde(default)]
    sentiment: Option<Sentiment>,
    #[serde(default, alias = "segment", alias = "category")]
    tags: Option<TagsField>,
}

/// Running tally of what the loader had to fix or drop.
#[derive(Debug, Default)]
struct LoadStats {
    normalized_tags: usize,
    skipped: usize,
}

pub fn load_reviews(path: &Path) -> Result<Vec<Review>, InputError> {
    let content = std::fs::read_to_string(path).map_err(|e| InputError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut stats = LoadStats::default();
    let reviews = if content.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(&content)?;
        parse_array(values, &mut stats)
    } else {
        parse_lines(&content, &mut stats)
    };

    if stats.normalized_tags > 0 {
        info!(
            "Normalized {} single-label tag field(s) to tag lists",
            stats.normalized_tags
        );
    }
    if stats.skipped > 0 {
        warn!("Skipped {} unusable record(s)", stats.skipped);
    }

    if reviews.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }

    debug!("Loaded {} reviews from {}", reviews.len(), path.display());
    Ok(reviews)
}

/// Array elements are records or bare review strings. A bad element is
/// skipped on its own.
fn parse_array(values: Vec<Value>, stats: &mut LoadStats) -> Vec<Review> {
    let mut reviews = Vec::with_capacity(values.len());

    for (i, value) in values.into_iter().enumerate() {
        let record_no = i + 1;
        let record = match value {
            Value::String(text) => Ok(RawRecord {
                text,
                sentiment: None,
                tags: None,
            }),
            other => serde_json::from_value::<RawRecord>(other),
        };

        match record {
            Ok(record) => {
                if let Some(review) = into_review(record, record_no, stats) {
                    reviews.push(review);
                }
            }
            Err(e) => {
                warn!("Skipping record {}: {}", record_no, e);
                stats.skipped += 1;
            }
        }
    }

    reviews
}

fn parse_lines(content: &str, stats: &mut LoadStats) -> Vec<Review> {
    let mut reviews = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(object) = object_slice(line) else {
            match Review::new(line) {
                Ok(review) => reviews.push(review),
                Err(e) => {
                    warn!("Line {}: {}", line_no, e);
                    stats.skipped += 1;
                }
            }
            continue;
        };

        match parse_record(object, line_no) {
            Ok(record) => {
                if let Some(review) = into_review(record, line_no, stats) {
                    reviews.push(review);
                }
            }
            Err(e) => {
                warn!("Skipping bad JSON line ({}): {}", e, preview(line));
                stats.skipped += 1;
            }
        }
    }

    reviews
}

/// The `{...}` part of a line, from the first `{` to the last `}`.
fn object_slice(line: &str) -> Option<&str> {
    let start = line.find('{')?;
    let end = line.rfind('}')?;
    (end > start).then(|| &line[start..=end])
}

fn parse_record(object: &str, line: usize) -> Result<RawRecord, InputError> {
    match serde_json::from_str(object) {
        Ok(record) => Ok(record),
        // Python-style dict literals
        Err(first) => serde_json::from_str(&single_to_double_quotes(object))
            .map_err(|_| InputError::Json { line, source: first }),
    }
}

/// Rewrite single-quoted strings as JSON strings. Double-quoted strings pass
/// through, so apostrophes inside them survive.
fn single_to_double_quotes(object: &str) -> String {
    let mut out = String::with_capacity(object.len());
    let mut open: Option<char> = None;
    let mut chars = object.chars();

    while let Some(c) = chars.next() {
        match (open, c) {
            (None, '\'' | '"') => {
                open = Some(c);
                out.push('"');
            }
            (Some(q), c) if c == q => {
                open = None;
                out.push('"');
            }
            (Some(_), '\\') => match chars.next() {
                Some('\'') => out.push('\''),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            (Some('\''), '"') => out.push_str("\\\""),
            (_, c) => out.push(c),
        }
    }
    out
}

fn preview(line: &str) -> String {
    const MAX: usize = 80;
    if line.chars().count() <= MAX {
        line.to_string()
    } else {
        format!("{}...", line.chars().take(MAX).collect::<String>())
    }
}

fn into_review(record: RawRecord, line: usize, stats: &mut LoadStats) -> Option<Review> {
    let tags = match record.tags {
        Some(field) => {
            if field.is_single() {
                stats.normalized_tags += 1;
            }
            field.into_set()
        }
        None => Default::default(),
    };

    match Review::new(record.text) {
        Ok(review) => Some(review.labelled(record.sentiment, tags)),
        Err(e) => {
            warn!("Record {}: {}", line, e);
            stats.skipped += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::Category;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_json_array() {
        let f = file(
            r#"[
                {"text": "Great support", "sentiment": "Positive", "tags": "Customer Support"},
                {"review": "Slow on my phone", "sentiment": "Negative", "tags": ["Performance", "Mobile"]}
            ]"#,
        );
        let reviews = load_reviews(f.path()).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].tags().len(), 1);
        assert!(reviews[0].tags().contains(&Category::CustomerSupport));
        assert_eq!(reviews[1].text(), "Slow on my phone");
        assert_eq!(reviews[1].tags().len(), 2);
    }

    #[test]
    fn test_lines_with_prefix_and_single_quotes() {
        let f = file(
            "review_1 = {\"text\": \"Love it\", \"sentiment\": \"Positive\", \"tags\": [\"UI/UX\"]}\n\
             \n\
             review_2 = {'text': 'Checkout failed', 'sentiment': 'Negative', 'tags': 'Checkout'}\n",
        );
        let reviews = load_reviews(f.path()).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].sentiment(), Some(Sentiment::Positive));
        assert_eq!(reviews[1].sentiment(), Some(Sentiment::Negative));
        assert!(reviews[1].tags().contains(&Category::Checkout));
    }

    #[test]
    fn test_plain_text_lines_are_unlabelled() {
        let f = file("The app is fine\nSearch never finds anything\n");
        let reviews = load_reviews(f.path()).unwrap();
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|r| !r.is_labelled()));
    }

    #[test]
    fn test_bad_and_empty_records_are_skipped() {
        let f = file(
            "{\"text\": \"ok\", \"sentiment\": \"Positive\"}\n\
             {\"text\": \"   \"}\n\
             {\"text\": \"unknown tag\", \"tags\": \"Billing\"}\n\
             {not json at all}\n",
        );
        let reviews = load_reviews(f.path()).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text(), "ok");
    }

    #[test]
    fn test_bad_array_record_is_skipped() {
        let f = file(
            r#"[
                {"text": "ok", "sentiment": "Positive"},
                {"text": "x", "tags": "Billing"},
                {"sentiment": "Negative"},
                "just a plain review"
            ]"#,
        );
        let reviews = load_reviews(f.path()).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].text(), "ok");
        assert_eq!(reviews[1].text(), "just a plain review");
        assert!(!reviews[1].is_labelled());
    }

    #[test]
    fn test_malformed_array_is_an_error() {
        let f = file("[{\"text\": \"ok\"},");
        let err = load_reviews(f.path()).unwrap_err();
        assert!(matches!(err, InputError::Document(_)));
    }

    #[test]
    fn test_single_quoted_dict_with_apostrophes() {
        let f = file(
            "{'text': \"I don't like it\", 'sentiment': 'Negative', 'tags': ['Bugs']}\n\
             {'text': 'it\\'s fine', 'sentiment': 'Neutral'}\n\
             {'text': 'they said \"wow\"', 'sentiment': 'Positive'}\n",
        );
        let reviews = load_reviews(f.path()).unwrap();
        assert_eq!(reviews.len(), 3);
        assert_eq!(reviews[0].text(), "I don't like it");
        assert!(reviews[0].tags().contains(&Category::Bugs));
        assert_eq!(reviews[1].text(), "it's fine");
        assert_eq!(reviews[2].text(), "they said \"wow\"");
    }

    #[test]
    fn test_single_to_double_quotes() {
        assert_eq!(
            single_to_double_quotes(r#"{'a': "b'c", 'd': 'e"f'}"#),
            r#"{"a": "b'c", "d": "e\"f"}"#
        );
    }

    #[test]
    fn test_nothing_usable_is_an_error() {
        let f = file("\n{\"text\": \"\"}\n");
        let err = load_reviews(f.path()).unwrap_err();
        assert!(matches!(err, InputError::Empty(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_reviews(Path::new("/nonexistent/reviews.jsonl")).unwrap_err();
        assert!(matches!(err, InputError::ReadFile { .. }));
    }
}
