//! Paragraph-based document chunking
//!
//! Chunks are cut only between paragraphs. A paragraph longer than the chunk
//! limit becomes its own chunk, truncated to the limit.

use lazy_static::lazy_static;
use regex::Regex;

/// Default chunk limit in characters
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 500;

const PARAGRAPH_JOINER: &str = "\n\n";

lazy_static! {
    static ref PARAGRAPH_BREAK_RE: Regex = Regex::new(r"\r?\n[ \t]*\r?\n").unwrap();
}

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chars: usize,
}

impl Chunker {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Split text into non-overlapping chunks of at most `max_chars` characters
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for paragraph in PARAGRAPH_BREAK_RE.split(text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            let (paragraph, para_len) = self.truncate(paragraph);

            if current_len > 0 && current_len + PARAGRAPH_JOINER.len() + para_len > self.max_chars {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if current_len > 0 {
                current.push_str(PARAGRAPH_JOINER);
                current_len += PARAGRAPH_JOINER.len();
            }
            current.push_str(paragraph);
            current_len += para_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        if chunks.is_empty() {
            chunks.push(text.chars().take(self.max_chars).collect());
        }

        chunks
    }

    /// Hard-truncate to `max_chars` characters; returns the slice and its char count
    fn truncate<'a>(&self, paragraph: &'a str) -> (&'a str, usize) {
        match paragraph.char_indices().nth(self.max_chars) {
            Some((byte_idx, _)) => (&paragraph[..byte_idx], self.max_chars),
            None => (paragraph, paragraph.chars().count()),
        }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        let chunker = Chunker::default();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("  \n\n\t \n ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = Chunker::default().split("Refunds are processed within 14 days.");
        assert_eq!(chunks, vec!["Refunds are processed within 14 days."]);
    }

    #[test]
    fn test_paragraphs_accumulate_until_limit() {
        let chunker = Chunker::new(30);
        let text = "first para here\n\nsecond one\n\nthird paragraph text";

        let chunks = chunker.split(text);

        assert_eq!(chunks, vec!["first para here\n\nsecond one", "third paragraph text"]);
        assert!(chunks.iter().all(|c| char_len(c) <= 30));
    }

    #[test]
    fn test_blank_line_with_spaces_and_crlf() {
        let chunker = Chunker::new(10);
        let chunks = chunker.split("alpha beta\r\n  \r\ngamma\n\t\ndelta");
        assert_eq!(chunks, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn test_oversized_paragraph_is_truncated() {
        let chunker = Chunker::default();
        let long = "x".repeat(1200);
        let text = format!("intro\n\n{}\n\noutro", long);

        let chunks = chunker.split(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "intro");
        assert_eq!(char_len(&chunks[1]), DEFAULT_MAX_CHUNK_CHARS);
        assert_eq!(chunks[2], "outro");
    }

    #[test]
    fn test_truncation_respects_multibyte_chars() {
        let chunker = Chunker::new(4);
        let chunks = chunker.split("가나다라마바");
        assert_eq!(chunks, vec!["가나다라"]);
    }

    #[test]
    fn test_every_chunk_within_limit() {
        let chunker = Chunker::default();
        let paragraphs: Vec<String> = (0..40)
            .map(|i| format!("Paragraph {} {}", i, "lorem ipsum ".repeat(i % 7 + 1)))
            .collect();
        let text = paragraphs.join("\n\n");

        let chunks = chunker.split(&text);

        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.is_empty() && char_len(c) <= DEFAULT_MAX_CHUNK_CHARS));
    }
}
