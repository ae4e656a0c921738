use crate::error::OutputError;
use crate::pipeline::ReviewOutcome;
use crate::review::Review;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ClassifiedReview<'a> {
    text: &'a str,
    #[serde(flatten)]
    outcome: &'a ReviewOutcome,
}

/// Write per-review results to `classifications.json` and a Markdown table.
pub fn write_classifications(
    report_dir: &Path,
    reviews: &[Review],
    outcomes: &[ReviewOutcome],
) -> Result<(), OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let rows: Vec<ClassifiedReview> = outcomes
        .iter()
        .filter_map(|outcome| {
            reviews.get(outcome.index).map(|review| ClassifiedReview {
                text: review.text(),
                outcome,
            })
        })
        .collect();

    let json = serde_json::to_string_pretty(&rows)?;
    fs::write(report_dir.join("classifications.json"), json).map_err(OutputError::WriteReport)?;

    let mut content = String::new();
    content.push_str("# Classifications\n\n");
    content.push_str("| # | Sentiment | Tags | Summary |\n");
    content.push_str("|---|-----------|------|---------|\n");
    for row in &rows {
        let line = match (&row.outcome.classification, &row.outcome.error) {
            (Some(c), _) => format!(
                "| {} | {} | {} | {} |\n",
                row.outcome.index + 1,
                c.sentiment,
                c.tags
                    .iter()
                    .map(|t| t.label())
                    .collect::<Vec<_>>()
                    .join(", "),
                c.summary.replace('|', "\\|")
            ),
            (None, Some(error)) => format!("| {} | ❌ | | {} |\n", row.outcome.index + 1, error),
            (None, None) => format!("| {} | | | |\n", row.outcome.index + 1),
        };
        content.push_str(&line);
    }

    fs::write(report_dir.join("classifications.md"), content)
        .map_err(OutputError::WriteReport)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use crate::error::{ErrorKind, ErrorRecord};
    use crate::review::{Category, Sentiment};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    #[test]
    fn test_write_classifications() {
        let dir = TempDir::new().unwrap();
        let reviews = vec![
            Review::new("Great | fast").unwrap(),
            Review::new("???").unwrap(),
        ];
        let outcomes = vec![
            ReviewOutcome {
                index: 0,
                classification: Some(Classification {
                    summary: "Fast | great".to_string(),
                    sentiment: Sentiment::Positive,
                    tags: BTreeSet::from([Category::Performance]),
                }),
                error: None,
            },
            ReviewOutcome {
                index: 1,
                classification: None,
                error: Some(ErrorRecord::new(ErrorKind::Classification, "no JSON")),
            },
        ];

        write_classifications(dir.path(), &reviews, &outcomes).unwrap();

        let json: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("classifications.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json[0]["text"], "Great | fast");
        assert_eq!(json[0]["classification"]["sentiment"], "Positive");
        assert_eq!(json[0]["classification"]["tags"][0], "Performance");
        assert_eq!(json[1]["error"]["kind"], "classification");

        let md = fs::read_to_string(dir.path().join("classifications.md")).unwrap();
        assert!(md.contains("| 1 | Positive | Performance | Fast \\| great |"));
        assert!(md.contains("classification: no JSON"));
    }
}
