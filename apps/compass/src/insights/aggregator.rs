use serde::Serialize;

use crate::insights::classifier::{classify, InsightCategory};
use crate::insights::segmenter::split_sentences;

/// Upper bound on insights shown for one analysis.
pub const MAX_INSIGHTS: usize = 5;

/// A categorised excerpt of the feedback text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub text: String,
}

/// Classifies sentences in order and keeps the first `MAX_INSIGHTS` that match.
///
/// `_fit_score` is accepted so callers always pass the pair that produced the
/// feedback; classification does not depend on it.
pub fn aggregate(sentences: &[String], _fit_score: u8) -> Vec<Insight> {
    sentences
        .iter()
        .filter_map(|sentence| {
            classify(sentence).map(|category| Insight {
                category,
                text: sentence.clone(),
            })
        })
        .take(MAX_INSIGHTS)
        .collect()
}

/// Segments `feedback` and aggregates the result. Recomputed from scratch on every call.
pub fn extract_insights(feedback: Option<&str>, fit_score: u8) -> Vec<Insight> {
    aggregate(&split_sentences(feedback), fit_score)
}
