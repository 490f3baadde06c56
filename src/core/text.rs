use std::collections::HashSet;

use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};

lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Split text on whitespace and ASCII punctuation, lowercase each word and
/// reduce it to its English stem, so "Refunds" and "refund" are one token
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| STEMMER.stem(&s.to_lowercase()).into_owned())
        .collect()
}

pub fn word_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// First `max_chars` characters of `text`, with "..." appended when truncated
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
