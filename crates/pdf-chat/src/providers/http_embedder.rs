//! Remote embedding service client (Ollama or OpenAI-compatible wire format)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{EmbeddingApi, EmbeddingConfig};
use crate::error::{Error, Result};
use crate::types::LanguageProfile;

use super::embedding::{Embedder, EmbedderFactory};
use super::http::{build_client, is_rejection, retry_request};

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding client bound to one model
pub struct HttpEmbedder {
    client: Client,
    config: EmbeddingConfig,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    /// Create a client for `model` using a shared HTTP client
    pub fn new(client: Client, config: EmbeddingConfig, model: impl Into<String>) -> Self {
        let api_key = config
            .api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty());

        Self {
            client,
            config,
            model: model.into(),
            api_key,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.config.api {
            EmbeddingApi::Ollama => {
                // Ollama's /api/embeddings takes one prompt per request
                let url = format!("{}/api/embeddings", self.config.base_url.trim_end_matches('/'));
                let mut embeddings = Vec::with_capacity(texts.len());
                for text in texts {
                    let response = self
                        .authorize(self.client.post(&url))
                        .json(&OllamaEmbedRequest {
                            model: &self.model,
                            prompt: text,
                        })
                        .send()
                        .await
                        .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(status_error(status, &body));
                    }

                    let body: OllamaEmbedResponse = response.json().await.map_err(|e| {
                        Error::embedding(format!("Failed to parse embedding response: {}", e))
                    })?;
                    embeddings.push(body.embedding);
                }
                Ok(embeddings)
            }
            EmbeddingApi::OpenAi => {
                let url = format!("{}/v1/embeddings", self.config.base_url.trim_end_matches('/'));
                let response = self
                    .authorize(self.client.post(&url))
                    .json(&OpenAiEmbedRequest {
                        model: &self.model,
                        input: texts,
                    })
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(status_error(status, &body));
                }

                let body: OpenAiEmbedResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse embedding response: {}", e))
                })?;
                order_openai_embeddings(body, texts.len())
            }
        }
    }
}

/// The OpenAI format does not promise ordering; sort by index and check the count
fn order_openai_embeddings(body: OpenAiEmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = body.data;
    if data.len() != expected {
        return Err(Error::embedding(format!(
            "Embedding service returned {} vectors for {} inputs",
            data.len(),
            expected
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut embeddings = self.embed_batch(&texts).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::embedding("Embedding service returned no vectors"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        retry_request("Embedding request", self.config.max_retries, || {
            self.send_once(texts)
        })
        .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Builds `HttpEmbedder`s that share one connection pool
pub struct HttpEmbedderFactory {
    client: Client,
    config: EmbeddingConfig,
}

impl HttpEmbedderFactory {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            config: config.clone(),
        })
    }
}

impl EmbedderFactory for HttpEmbedderFactory {
    fn embedder_for(&self, profile: &LanguageProfile) -> Result<Arc<dyn Embedder>> {
        tracing::debug!("Using embedding model {}", profile.embedding_model);
        Ok(Arc::new(HttpEmbedder::new(
            self.client.clone(),
            self.config.clone(),
            profile.embedding_model.clone(),
        )))
    }
}

/// Map a non-2xx response to a permanent or a retryable error
fn status_error(status: StatusCode, body: &str) -> Error {
    if is_rejection(status) {
        Error::Config(format!("Embedding rejected: HTTP {} - {}", status, body))
    } else {
        Error::embedding(format!("Embedding failed: HTTP {} - {}", status, body))
    }
}
