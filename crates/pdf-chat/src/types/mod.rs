//! Core types for the PDF chat service

pub mod document;
pub mod language;
pub mod message;
pub mod response;

pub use document::{Chunk, ChunkSource, PageText, UploadedFile, VectorRecord};
pub use language::{Language, LanguageProfile, LanguageTable};
pub use message::{ChatMessage, Role};
pub use response::{Answer, IngestReport, Source};
