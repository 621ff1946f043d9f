//! Retrieval + prompt + generation, bound to one language and one store snapshot

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::{Generator, Retriever};
use crate::types::{Answer, Language, Source};

use super::prompt::PromptBuilder;

/// Answers questions against a fixed set of processed documents
pub struct AnswerPipeline {
    language: Language,
    template: String,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl AnswerPipeline {
    pub fn new(
        language: Language,
        template: impl Into<String>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        top_k: usize,
    ) -> Self {
        Self {
            language,
            template: template.into(),
            retriever,
            generator,
            top_k,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve context for `question`, render the language template and generate
    pub async fn invoke(&self, question: &str) -> Result<Answer> {
        let start = Instant::now();
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("Question cannot be empty".to_string()));
        }

        tracing::info!("Answering {} question: {}", self.language, question);

        let results = self.retriever.retrieve(question, self.top_k).await?;
        tracing::debug!("Retrieved {} chunks", results.len());

        let context = PromptBuilder::build_context(&results);
        let prompt = PromptBuilder::render(&self.template, question, &context);
        let text = self.generator.generate(&prompt).await?;

        let sources = results
            .iter()
            .map(|r| Source::from_chunk(&r.chunk, r.similarity))
            .collect();

        Ok(Answer {
            text,
            sources,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
