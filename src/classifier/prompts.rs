use crate::review::Category;

const CLASSIFY_PROMPT: &str = r#"You are an assistant that analyzes app reviews.
Analyze the review below and provide a brief summary, an overall sentiment, and the parts of the app it is about.

The sentiment must be exactly one of: "Positive", "Negative", "Neutral".
Each tag must be exactly one of: {{CATEGORIES}}.
Use "Other" when the review fits none of them.

Output valid JSON only, with no markdown and no text outside the object:
{"summary": "<brief summary>", "sentiment": "<sentiment>", "tags": ["<tag>", ...]}

## Review

{{REVIEW}}"#;

const SUMMARIZE_PROMPT: &str = r#"You are an assistant that analyzes app reviews.
Each review below is already labelled with a sentiment and one or more tags.

Your task:
1. Count the total number of reviews, the sentiment distribution across all reviews,
   and for every tag the sentiment distribution of the reviews carrying it.
2. Write "summary": a holistic overview of the feedback.
3. Write "key_insights": short points highlighting patterns and important observations.

Output valid JSON only, with no markdown and no text outside the object. It must match:
{
  "total_reviews": <int>,
  "sentiment_distribution": {"Positive": <int>, "Negative": <int>, "Neutral": <int>},
  "category_distribution": {"<tag>": {"Positive": <int>, "Negative": <int>, "Neutral": <int>}},
  "summary": "<overall summary>",
  "key_insights": ["point1", "point2"]
}
Valid tags: {{CATEGORIES}}.

## Reviews

{{REVIEWS}}"#;

const SYNTHESIZE_PROMPT: &str = r#"You are an assistant that analyzes app reviews.
Below are summaries of separate batches of reviews, one per line.

Your task: reconcile them into one comprehensive analysis. Merge repeated points,
resolve conflicting observations, and do not simply list the batches.

Output valid JSON only, with no markdown and no text outside the object. It must match:
{"Final_summary": "<overall summary>", "Final_key_insights": ["point1", "point2"]}

## Batch summaries

{{SUMMARIES}}"#;

fn category_list() -> String {
    Category::ALL
        .iter()
        .map(|c| format!("\"{}\"", c.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn classify_prompt(review: &str) -> String {
    CLASSIFY_PROMPT
        .replace("{{CATEGORIES}}", &category_list())
        .replace("{{REVIEW}}", review)
}

pub fn summarize_prompt(formatted_reviews: &str) -> String {
    SUMMARIZE_PROMPT
        .replace("{{CATEGORIES}}", &category_list())
        .replace("{{REVIEWS}}", formatted_reviews)
}

pub fn synthesize_prompt(summaries: &str) -> String {
    SYNTHESIZE_PROMPT.replace("{{SUMMARIES}}", summaries)
}
