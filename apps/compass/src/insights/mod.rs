//! Insight extraction — turns free-form analysis feedback into a short list of
//! categorised excerpts.
//!
//! Pipeline: `segmenter` (sentences) → `classifier` (one category per sentence)
//! → `aggregator` (ordered, capped list).

pub mod aggregator;
pub mod classifier;
pub mod segmenter;

pub use aggregator::{extract_insights, Insight};
