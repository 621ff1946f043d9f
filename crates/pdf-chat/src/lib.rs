//! pdf-chat: chat with your PDFs
//!
//! Upload PDFs, choose their language, and ask questions. Page text is split
//! into overlapping chunks, embedded with a language-specific model, stored
//! in an on-disk vector store, and the best matches are handed to a hosted
//! chat model as context for the answer.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod service;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use service::RagService;
pub use session::Session;
pub use types::{
    Answer, ChatMessage, Chunk, ChunkSource, IngestReport, Language, LanguageTable, UploadedFile,
};
