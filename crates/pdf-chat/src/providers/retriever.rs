//! Retriever trait and the vector-store backed implementation

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::storage::{SearchResult, StoreSnapshot};

use super::embedding::Embedder;

/// Trait for finding the chunks most relevant to a question
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `top_k` results, best first
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;
}

/// Embeds the question and searches a fixed store snapshot
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    snapshot: StoreSnapshot,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, snapshot: StoreSnapshot) -> Self {
        Self { embedder, snapshot }
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        self.snapshot.search(&query_embedding, top_k)
    }
}
