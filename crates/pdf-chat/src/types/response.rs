//! Results returned by the ingestion and answering pipelines

use serde::{Deserialize, Serialize};

use super::document::Chunk;
use super::language::Language;

/// Maximum characters of chunk text echoed back as a snippet
const SNIPPET_CHARS: usize = 240;

/// A retrieved chunk that was given to the model as context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Source filename
    pub filename: String,
    /// Page number
    pub page_number: u32,
    /// Cosine similarity to the question (-1.0..=1.0)
    pub score: f32,
    /// Leading part of the chunk text
    pub snippet: String,
}

impl Source {
    /// Create a source entry from a chunk and its similarity score
    pub fn from_chunk(chunk: &Chunk, score: f32) -> Self {
        let snippet = if chunk.content.chars().count() > SNIPPET_CHARS {
            let mut s: String = chunk.content.chars().take(SNIPPET_CHARS).collect();
            s.push('…');
            s
        } else {
            chunk.content.clone()
        };

        Self {
            filename: chunk.source.filename.clone(),
            page_number: chunk.source.page_number,
            score,
            snippet,
        }
    }
}

/// Answer produced by the answering pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub text: String,
    /// Chunks used as context, best first
    pub sources: Vec<Source>,
    /// Time spent retrieving and generating
    pub processing_time_ms: u64,
}

/// Summary of a successful "Process Documents" run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Language the batch was processed in
    pub language: Language,
    /// Number of uploaded files
    pub files: usize,
    /// Number of extracted pages
    pub pages: usize,
    /// Number of chunks embedded and stored
    pub chunks: usize,
    /// Embedding model used
    pub embedding_model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Wall-clock time of the whole run
    pub processing_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkSource;

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let content = "ب".repeat(300);
        let chunk = Chunk::new(
            content,
            ChunkSource {
                filename: "fa.pdf".into(),
                page_number: 1,
                page_count: 1,
            },
            0,
            300,
            0,
        );
        let source = Source::from_chunk(&chunk, 0.5);
        assert_eq!(source.snippet.chars().count(), SNIPPET_CHARS + 1);
        assert!(source.snippet.ends_with('…'));
    }
}
