//! Uploaded files, extracted pages and chunks with source tracking

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A PDF as received from the UI shell
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename as uploaded by user
    pub filename: String,
    /// Raw file bytes
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// SHA-256 of the file bytes, hex encoded
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        hex::encode(hasher.finalize())
    }
}

/// Text of one page plus where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// Source filename
    pub filename: String,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Total pages in the file
    pub page_count: u32,
    /// Extracted text
    pub content: String,
}

/// Source information for a chunk (used for citations)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Original filename as uploaded
    pub filename: String,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Total pages in document
    pub page_count: u32,
}

impl ChunkSource {
    /// Format source for display
    pub fn format_citation(&self) -> String {
        format!("{}, Page {}", self.filename, self.page_number)
    }
}

impl From<&PageText> for ChunkSource {
    fn from(page: &PageText) -> Self {
        Self {
            filename: page.filename.clone(),
            page_number: page.page_number,
            page_count: page.page_count,
        }
    }
}

/// A chunk of page text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Text content, an exact substring of the page text
    pub content: String,
    /// Source information for citations
    pub source: ChunkSource,
    /// Character (not byte) span within the page
    pub char_start: usize,
    pub char_end: usize,
    /// Chunk index within its page
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        content: String,
        source: ChunkSource,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            source,
            char_start,
            char_end,
            chunk_index,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// A chunk together with its embedding, as persisted by the vector store
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}
