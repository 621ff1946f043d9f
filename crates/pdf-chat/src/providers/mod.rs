//! Capability interfaces for embeddings, retrieval and generation
//!
//! The pipelines only see these traits, so tests can swap the remote
//! services for in-process fakes.

pub mod chat_completion;
pub mod embedding;
pub(crate) mod http;
pub mod http_embedder;
pub mod llm;
pub mod retriever;

pub use chat_completion::ChatCompletionClient;
pub use embedding::{Embedder, EmbedderFactory};
pub use http_embedder::{HttpEmbedder, HttpEmbedderFactory};
pub use llm::Generator;
pub use retriever::{Retriever, VectorRetriever};
