//! OpenAI-compatible chat completion client (OpenRouter by default)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::http::{build_client, is_rejection, retry_request};
use super::llm::Generator;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatRequestMessage<'a>; 1],
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat completion client with timeout and automatic retry
pub struct ChatCompletionClient {
    client: Client,
    config: LlmConfig,
    api_key: String,
}

impl ChatCompletionClient {
    /// Create a client; the API key is read from the configured environment variable
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            config: config.clone(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatRequestMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_rejection(status) {
                return Err(Error::Config(format!(
                    "Generation rejected: HTTP {} - {}",
                    status, body
                )));
            }
            return Err(Error::llm(format!("Generation failed: HTTP {} - {}", status, body)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e)))?;

        extract_answer(body)
    }
}

fn extract_answer(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::llm("Invalid response format: no message content"))
}

#[async_trait]
impl Generator for ChatCompletionClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.config.model);
        retry_request("Generation request", self.config.max_retries, || {
            self.send_once(prompt)
        })
        .await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_answer() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "id": "gen-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "42"}}]
        }))
        .unwrap();
        assert_eq!(extract_answer(body).unwrap(), "42");
    }

    #[test]
    fn test_missing_content_is_llm_error() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": []
        }))
        .unwrap();
        assert!(matches!(extract_answer(body), Err(Error::Llm(_))));
    }

    #[test]
    fn test_endpoint_and_request_shape() {
        let config = LlmConfig {
            base_url: "https://openrouter.ai/api/v1/".to_string(),
            ..LlmConfig::default()
        };
        let client = ChatCompletionClient::with_api_key(&config, "test-key").unwrap();
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");

        let request = ChatRequest {
            model: "openai/gpt-oss-20b:free",
            messages: [ChatRequestMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.3,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["model"], "openai/gpt-oss-20b:free");
        assert_eq!(json["stream"], false);
    }
}
