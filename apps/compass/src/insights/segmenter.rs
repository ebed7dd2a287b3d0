use once_cell::sync::Lazy;
use regex::Regex;

/// Segments whose trimmed length is at or below this are headers or fragments.
pub const MIN_SENTENCE_CHARS: usize = 20;

static SENTENCE_TERMINATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence terminator pattern is valid"));

/// Splits feedback text into trimmed candidate sentences, dropping short fragments.
pub fn split_sentences(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };

    SENTENCE_TERMINATORS
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}
