//! Sentence-aware text chunking.
//!
//! Splits document text into overlapping windows measured in characters,
//! nudging each cut onto a nearby sentence or paragraph boundary.

use std::ops::Range;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{normalize_whitespace, ChunkingConfig};

/// Delimiters tried in priority order at each window boundary.
const BREAK_PATTERNS: [&str; 6] = [". ", ".\n", "\n\n", "; ", "? ", "! "];

/// How far past / before the boundary a delimiter may be.
const DELIMITER_WINDOW: usize = 100;

/// How far past the boundary a plain space may be.
const SPACE_WINDOW: usize = 50;

/// Splits text into overlapping fragments.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. Fails unless `chunk_size > 0` and `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> DomainResult<Self> {
        if chunk_size == 0 {
            return Err(DomainError::Configuration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(DomainError::Configuration(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> DomainResult<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    /// Split `text` into normalized, non-empty fragments.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let fragments: Vec<String> = self
            .spans(&chars)
            .into_iter()
            .map(|span| normalize_whitespace(&chars[span].iter().collect::<String>()))
            .filter(|fragment| !fragment.is_empty())
            .collect();

        tracing::debug!(
            chars = chars.len(),
            chunk_size = self.chunk_size,
            overlap = self.overlap,
            fragments = fragments.len(),
            "chunked text"
        );
        fragments
    }

    /// Character ranges of each window before normalization.
    ///
    /// Consecutive spans never leave a gap, starts strictly increase and the
    /// last span ends at the end of the text.
    pub fn spans(&self, chars: &[char]) -> Vec<Range<usize>> {
        let len = chars.len();
        if chars.iter().all(|c| c.is_whitespace()) {
            return Vec::new();
        }

        let mut spans = Vec::new();
        let mut start = 0;
        while start < len {
            let boundary = (start + self.chunk_size).min(len);
            let end = if boundary < len {
                find_break(chars, start, boundary)
            } else {
                boundary
            };

            spans.push(start..end);
            if end >= len {
                break;
            }
            start = (start + 1).max(end.saturating_sub(self.overlap));
        }
        spans
    }
}

/// Convenience wrapper over [`TextChunker`].
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> DomainResult<Vec<String>> {
    Ok(TextChunker::new(chunk_size, overlap)?.chunk(text))
}

/// Pick the end of the window that starts at `start` and nominally ends at
/// `boundary`. The result is always in `start + 1..=boundary + DELIMITER_WINDOW`.
fn find_break(chars: &[char], start: usize, boundary: usize) -> usize {
    let len = chars.len();

    let ahead_end = (boundary + DELIMITER_WINDOW).min(len);
    for pattern in BREAK_PATTERNS {
        if let Some(pos) = find_forward(&chars[boundary..ahead_end], pattern) {
            return boundary + pos + pattern.chars().count();
        }
    }

    let behind_start = boundary.saturating_sub(DELIMITER_WINDOW).max(start);
    for pattern in BREAK_PATTERNS {
        if let Some(pos) = find_backward(&chars[behind_start..boundary], pattern) {
            return behind_start + pos + pattern.chars().count();
        }
    }

    let space_end = (boundary + SPACE_WINDOW).min(len);
    if let Some(pos) = chars[boundary..space_end].iter().position(|c| *c == ' ') {
        return boundary + pos + 1;
    }

    boundary
}

fn find_forward(haystack: &[char], pattern: &str) -> Option<usize> {
    let needle: Vec<char> = pattern.chars().collect();
    haystack.windows(needle.len()).position(|w| w == needle.as_slice())
}

fn find_backward(haystack: &[char], pattern: &str) -> Option<usize> {
    let needle: Vec<char> = pattern.chars().collect();
    haystack.windows(needle.len()).rposition(|w| w == needle.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(TextChunker::new(0, 0), Err(DomainError::Configuration(_))));
        assert!(matches!(TextChunker::new(10, 10), Err(DomainError::Configuration(_))));
        assert!(TextChunker::new(10, 9).is_ok());
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        assert!(chunk("", 100, 10).unwrap().is_empty());
        assert!(chunk(" \n\t  ", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_short_text_is_one_fragment() {
        let fragments = chunk("  Hello   world.\n\nSecond  line. ", 800, 100).unwrap();
        assert_eq!(fragments, vec!["Hello world. Second line."]);
    }

    #[test]
    fn test_prefers_forward_sentence_break() {
        // Boundary falls inside "sentence two"; the next ". " is ahead of it.
        let text = "Sentence one is here. Sentence two runs on a bit. Tail.";
        let fragments = chunk(text, 30, 0).unwrap();
        assert_eq!(fragments[0], "Sentence one is here. Sentence two runs on a bit.");
    }

    #[test]
    fn test_cuts_at_space_without_delimiters() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunker = TextChunker::new(8, 0).unwrap();
        let chars: Vec<char> = text.chars().collect();
        let spans = chunker.spans(&chars);
        // "alpha be|ta" -> next space after "beta"
        assert_eq!(spans[0], 0..11);
    }

    #[test]
    fn test_hard_cut_without_spaces() {
        let text = "x".repeat(250);
        let fragments = chunk(&text, 100, 10).unwrap();
        assert_eq!(fragments[0].len(), 100);
        assert!(fragments.iter().all(|f| f.len() <= 100));
        assert_eq!(fragments.last().unwrap().len(), 70);
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let text = "x".repeat(250);
        let chunker = TextChunker::new(100, 10).unwrap();
        let chars: Vec<char> = text.chars().collect();
        assert_eq!(chunker.spans(&chars), vec![0..100, 90..190, 180..250]);
    }

    #[test]
    fn test_multibyte_text() {
        let text = "¿Qué pasó? Nadie sabe. ".repeat(20);
        let fragments = chunk(&text, 50, 10).unwrap();
        assert!(!fragments.is_empty());
        assert!(fragments.iter().all(|f| f.chars().count() <= 150));
    }

    #[test]
    fn test_backward_break_stays_inside_window() {
        let chunker = TextChunker::new(5, 0).unwrap();
        let chars: Vec<char> = "ab. cdefghijklmnopqrstuvwxyz".chars().collect();
        let spans = chunker.spans(&chars);
        assert_eq!(spans[0], 0..4);
        assert!(spans.windows(2).all(|w| w[1].start > w[0].start));
    }
}
