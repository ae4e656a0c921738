use crate::error::ClassifierError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Sentiment {
    #[serde(alias = "positive", alias = "POSITIVE")]
    Positive,
    #[serde(alias = "negative", alias = "NEGATIVE")]
    Negative,
    #[serde(alias = "neutral", alias = "NEUTRAL")]
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Neutral => write!(f, "Neutral"),
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(format!("Unknown sentiment: {}", s)),
        }
    }
}

/// Part of the app a review talks about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, JsonSchema,
)]
pub enum Category {
    #[serde(rename = "UI/UX")]
    UiUx,
    Performance,
    Bugs,
    Features,
    #[serde(rename = "Privacy/Security")]
    PrivacySecurity,
    #[serde(rename = "Customer Support")]
    CustomerSupport,
    Checkout,
    #[serde(rename = "Feature_request")]
    FeatureRequest,
    Mobile,
    Search,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::UiUx,
        Category::Performance,
        Category::Bugs,
        Category::Features,
        Category::PrivacySecurity,
        Category::CustomerSupport,
        Category::Checkout,
        Category::FeatureRequest,
        Category::Mobile,
        Category::Search,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::UiUx => "UI/UX",
            Category::Performance => "Performance",
            Category::Bugs => "Bugs",
            Category::Features => "Features",
            Category::PrivacySecurity => "Privacy/Security",
            Category::CustomerSupport => "Customer Support",
            Category::Checkout => "Checkout",
            Category::FeatureRequest => "Feature_request",
            Category::Mobile => "Mobile",
            Category::Search => "Search",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Per-sentiment counters. Always serialized with all three keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct SentimentCounts {
    #[serde(rename = "Positive", default)]
    pub positive: usize,
    #[serde(rename = "Negative", default)]
    pub negative: usize,
    #[serde(rename = "Neutral", default)]
    pub neutral: usize,
}

impl SentimentCounts {
    #[cfg(test)]
    pub fn new(positive: usize, negative: usize, neutral: usize) -> Self {
        Self {
            positive,
            negative,
            neutral,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    pub fn get(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    pub fn increment(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn add(&mut self, other: &SentimentCounts) {
        self.positive += other.positive;
        self.negative += other.negative;
        self.neutral += other.neutral;
    }
}

pub type CategoryDistribution = BTreeMap<Category, SentimentCounts>;

/// Element-wise sum of `other` into `into`.
pub fn merge_categories(into: &mut CategoryDistribution, other: &CategoryDistribution) {
    for (category, counts) in other {
        into.entry(*category).or_default().add(counts);
    }
}

/// Tags as they appear on the wire: a single label or a list of labels.
///
/// The canonical in-memory form is a set; this type only exists at the
/// deserialization boundary so callers can tell when a record used the
/// single-label form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsField {
    One(Category),
    Many(Vec<Category>),
}

impl TagsField {
    pub fn is_single(&self) -> bool {
        matches!(self, TagsField::One(_))
    }

    pub fn into_set(self) -> BTreeSet<Category> {
        match self {
            TagsField::One(c) => BTreeSet::from([c]),
            TagsField::Many(cs) => cs.into_iter().collect(),
        }
    }
}

/// A single user review. The text is never empty; labels are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<Category>,
}

impl Review {
    pub fn new(text: impl Into<String>) -> Result<Self, ClassifierError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ClassifierError::InputValidation(
                "review text is empty".to_string(),
            ));
        }
        Ok(Self {
            text,
            sentiment: None,
            tags: BTreeSet::new(),
        })
    }

    /// Returns a copy of this review carrying the given labels.
    pub fn labelled(
        self,
        sentiment: Option<Sentiment>,
        tags: impl IntoIterator<Item = Category>,
    ) -> Self {
        Self {
            text: self.text,
            sentiment,
            tags: tags.into_iter().collect(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        self.sentiment
    }

    pub fn tags(&self) -> &BTreeSet<Category> {
        &self.tags
    }

    pub fn is_labelled(&self) -> bool {
        self.sentiment.is_some()
    }
}
