//! Storage module for the persistent vector store
//!
//! Provides SQLite-based persistence for embedded chunks plus in-memory
//! snapshots used for similarity search.

mod vector_store;

pub use vector_store::{SearchResult, StoreInfo, StoreSnapshot, VectorStore, INDEX_FILE};
