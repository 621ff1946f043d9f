//! Text chunking with exact overlap and page tracking
//!
//! Chunks are exact substrings of the page text. Lengths and offsets are
//! counted in characters so multi-byte scripts are never cut inside a code
//! point. Each chunk after the first starts `overlap` characters before the
//! end of the previous one, which makes the split lossless: dropping the
//! leading overlap of every chunk but the first and concatenating the rest
//! gives back the page text.

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, PageText};

/// Preferred split points, strongest first. Within a tier the latest
/// occurrence in the window wins.
const BOUNDARY_TIERS: &[&[&str]] = &[
    &["\n\n"],
    &["\n"],
    &[". ", "! ", "? ", "؟ ", "。"],
    &[" "],
];

/// A chunk position within a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Character offset of the first character
    pub start: usize,
    /// Character offset one past the last character
    pub end: usize,
    /// Byte offsets matching `start`/`end`
    pub byte_start: usize,
    pub byte_end: usize,
}

impl Span {
    /// Length in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The text this span covers
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.byte_start..self.byte_end]
    }
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than a positive chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk every page, in order. Pages without text contribute nothing.
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            let source = ChunkSource::from(page);
            let spans = self.split_spans(&page.content);

            tracing::debug!(
                "{} page {}: {} chars -> {} chunks",
                page.filename,
                page.page_number,
                page.content.chars().count(),
                spans.len()
            );

            chunks.extend(spans.iter().enumerate().map(|(index, span)| {
                Chunk::new(
                    span.slice(&page.content).to_string(),
                    source.clone(),
                    span.start,
                    span.end,
                    index as u32,
                )
            }));
        }

        chunks
    }

    /// Compute chunk spans for a single text
    pub fn split_spans(&self, text: &str) -> Vec<Span> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // offsets[i] is the byte offset of character i; the last entry is text.len()
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;

        let span = |start: usize, end: usize| Span {
            start,
            end,
            byte_start: offsets[start],
            byte_end: offsets[end],
        };

        let mut spans = Vec::new();
        let mut start = 0usize;

        loop {
            if total - start <= self.chunk_size {
                spans.push(span(start, total));
                break;
            }

            let hard_end = start + self.chunk_size;
            // Stay past start + overlap so the next chunk moves forward, and
            // past the window midpoint so chunks do not shrink to slivers.
            let min_end = start + (self.overlap + 1).max(self.chunk_size / 2);
            let end = self
                .find_boundary(text, &offsets, start, min_end, hard_end)
                .unwrap_or(hard_end);

            spans.push(span(start, end));
            start = end - self.overlap;
        }

        spans
    }

    /// Latest split point in `min_end..=hard_end` after a separator of the
    /// strongest tier that has one
    fn find_boundary(
        &self,
        text: &str,
        offsets: &[usize],
        start: usize,
        min_end: usize,
        hard_end: usize,
    ) -> Option<usize> {
        let window_start = offsets[start];
        let window = &text[window_start..offsets[hard_end]];
        let min_byte = offsets[min_end];

        for tier in BOUNDARY_TIERS {
            let best = tier
                .iter()
                .filter_map(|sep| {
                    window
                        .rfind(sep)
                        .map(|pos| window_start + pos + sep.len())
                        .filter(|&split| split >= min_byte)
                })
                .max();

            if let Some(split) = best {
                // Separators end on a char boundary, so the lookup always succeeds
                if let Ok(index) = offsets.binary_search(&split) {
                    return Some(index);
                }
            }
        }

        None
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Drop each chunk's leading overlap (except the first) and concatenate
    fn rebuild(text: &str, spans: &[Span], overlap: usize) -> String {
        let mut out = String::new();
        for (i, span) in spans.iter().enumerate() {
            let piece = span.slice(text);
            if i == 0 {
                out.push_str(piece);
            } else {
                out.extend(piece.chars().skip(overlap));
            }
        }
        out
    }

    fn page(content: &str) -> PageText {
        PageText {
            filename: "doc.pdf".to_string(),
            page_number: 1,
            page_count: 1,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_short_text_is_single_unmodified_chunk() {
        let chunker = TextChunker::default();
        let text = "  A short page.\n\nWith two paragraphs.  ";
        let chunks = chunker.chunk_pages(&[page(text)]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].char_start, 0);
        assert_eq!(chunks[0].char_end, text.chars().count());
    }

    #[test]
    fn test_exactly_max_size_is_single_chunk() {
        let chunker = TextChunker::new(100, 20).unwrap();
        let text = "y".repeat(100);
        assert_eq!(chunker.split_spans(&text).len(), 1);
    }

    #[test]
    fn test_empty_and_blank_pages_yield_nothing() {
        let chunker = TextChunker::default();
        assert!(chunker.chunk_pages(&[]).is_empty());
        assert!(chunker.chunk_pages(&[page(""), page(" \n\n\t ")]).is_empty());
    }

    #[test]
    fn test_paragraph_scenario_yields_four_chunks() {
        // 8 paragraphs of 300 chars (298 + "\n\n") plus a 100 char tail = 2500 chars
        let body: String = "abcd ".repeat(60).chars().take(298).collect();
        let mut text = format!("{}\n\n", body).repeat(8);
        text.push_str(&"abcd ".repeat(20));
        assert_eq!(text.chars().count(), 2500);

        let chunker = TextChunker::new(1000, 200).unwrap();
        let spans = chunker.split_spans(&text);

        assert_eq!(spans.len(), 4);
        for span in &spans {
            assert!(span.len() <= 1000);
        }
        for pair in spans.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!(b.start, a.end - 200);
            let suffix: String = a.slice(&text).chars().skip(a.len() - 200).collect();
            let prefix: String = b.slice(&text).chars().take(200).collect();
            assert_eq!(suffix, prefix);
        }
        // Every non-final chunk ends right after a paragraph break
        for span in &spans[..3] {
            assert!(span.slice(&text).ends_with("\n\n"));
        }
        assert_eq!(rebuild(&text, &spans, 200), text);
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let text = "x".repeat(2500);
        let chunker = TextChunker::new(1000, 200).unwrap();
        let spans = chunker.split_spans(&text);

        let bounds: Vec<(usize, usize)> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0, 1000), (800, 1800), (1600, 2500)]);
    }

    #[test]
    fn test_prefers_sentence_over_word_boundary() {
        let chunker = TextChunker::new(60, 10).unwrap();
        let text = "The first sentence is right here. Then comes some more text that keeps going on";
        let spans = chunker.split_spans(text);

        assert!(spans.len() > 1);
        assert_eq!(spans[0].slice(text), "The first sentence is right here. ");
    }

    #[test]
    fn test_persian_text_respects_char_limits() {
        let text = "این یک جمله فارسی است. ".repeat(80);
        let chunker = TextChunker::new(120, 30).unwrap();
        let chunks = chunker.chunk_pages(&[page(&text)]);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 120);
            assert_eq!(chunk.content.chars().count(), chunk.char_len());
        }
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].char_start, pair[0].char_end - 30);
        }
        let spans = chunker.split_spans(&text);
        assert_eq!(rebuild(&text, &spans, 30), text);
    }

    #[test]
    fn test_chunk_metadata_is_inherited_per_page() {
        let chunker = TextChunker::new(50, 10).unwrap();
        let mut second = page(&"word ".repeat(30));
        second.page_number = 2;
        second.page_count = 2;
        let mut first = page("tiny");
        first.page_count = 2;

        let chunks = chunker.chunk_pages(&[first, second]);
        assert_eq!(chunks[0].source.page_number, 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert!(chunks[1..].iter().all(|c| c.source.page_number == 2));
        assert_eq!(chunks[1].chunk_index, 0);
        assert_eq!(chunks[2].chunk_index, 1);
    }

    proptest! {
        #[test]
        fn prop_chunks_are_bounded_overlapping_and_lossless(
            text in "[a-zA-Zابپ .!?\n]{0,2000}",
            size in 8usize..400,
            overlap_pct in 0usize..100,
        ) {
            let overlap = size * overlap_pct / 100;
            let chunker = TextChunker::new(size, overlap).unwrap();
            let spans = chunker.split_spans(&text);

            if text.trim().is_empty() {
                prop_assert!(spans.is_empty());
                return Ok(());
            }

            prop_assert_eq!(spans[0].start, 0);
            prop_assert_eq!(spans[spans.len() - 1].end, text.chars().count());
            for span in &spans {
                prop_assert!(span.len() <= size);
                prop_assert_eq!(span.slice(&text).chars().count(), span.len());
            }
            for pair in spans.windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].end - overlap);
            }
            prop_assert_eq!(rebuild(&text, &spans, overlap), text);
        }
    }
}
