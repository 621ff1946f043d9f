//! Embedding provider traits

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::LanguageProfile;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `HttpEmbedder`: remote embedding service (Ollama or OpenAI-compatible)
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Model name, recorded in the store info
    fn model(&self) -> &str;
}

/// Produces the embedder for a language profile
pub trait EmbedderFactory: Send + Sync {
    fn embedder_for(&self, profile: &LanguageProfile) -> Result<Arc<dyn Embedder>>;
}
