//! Keyword classifier for feedback sentences.
//!
//! The keyword lists and the order in which they are tried are fixed. A sentence
//! that hits several lists belongs to the first one in `CLASSIFICATION_ORDER`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Strength,
    Improvement,
    Concern,
}

pub const STRENGTH_KEYWORDS: &[&str] = &[
    "strong",
    "excellent",
    "impressive",
    "good fit",
    "well-suited",
    "demonstrates",
    "experience",
    "skilled",
];

pub const CONCERN_KEYWORDS: &[&str] = &[
    "major gap",
    "significantly lacks",
    "does not have",
    "critical missing",
    "inadequate",
];

pub const IMPROVEMENT_KEYWORDS: &[&str] = &[
    "however",
    "lacks",
    "missing",
    "could improve",
    "should develop",
    "limited",
    "insufficient",
];

/// Strength, then Concern, then Improvement.
const CLASSIFICATION_ORDER: [(InsightCategory, &[&str]); 3] = [
    (InsightCategory::Strength, STRENGTH_KEYWORDS),
    (InsightCategory::Concern, CONCERN_KEYWORDS),
    (InsightCategory::Improvement, IMPROVEMENT_KEYWORDS),
];

/// Returns the category of a sentence, or `None` when no keyword matches.
pub fn classify(sentence: &str) -> Option<InsightCategory> {
    let lower = sentence.to_lowercase();
    CLASSIFICATION_ORDER
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| *category)
}
