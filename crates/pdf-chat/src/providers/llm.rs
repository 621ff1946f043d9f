//! Generator trait for producing answers from a composed prompt

use async_trait::async_trait;

use crate::error::Result;

/// Trait for remote text generation
///
/// Implementations:
/// - `ChatCompletionClient`: OpenAI-compatible chat completions (OpenRouter by default)
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate an answer for a fully rendered prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model being used
    fn model(&self) -> &str;
}
