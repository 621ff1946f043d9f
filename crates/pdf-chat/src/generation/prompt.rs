//! Prompt templates for RAG generation

use crate::storage::SearchResult;

const QUESTION_PLACEHOLDER: &str = "{question}";
const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from search results: chunk texts separated by blank lines
    pub fn build_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Fill `{question}` and `{context}` in a single pass, so placeholder-like
    /// text inside the question or the documents is left alone
    pub fn render(template: &str, question: &str, context: &str) -> String {
        let mut prompt = String::with_capacity(template.len() + question.len() + context.len());
        let mut rest = template;

        while let Some(pos) = rest.find('{') {
            prompt.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
                prompt.push_str(question);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
                prompt.push_str(context);
                rest = after;
            } else {
                prompt.push('{');
                rest = &tail[1..];
            }
        }
        prompt.push_str(rest);

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::language::{ENGLISH_TEMPLATE, PERSIAN_TEMPLATE};
    use crate::types::{Chunk, ChunkSource};

    fn result(text: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk::new(
                text.to_string(),
                ChunkSource {
                    filename: "a.pdf".into(),
                    page_number: 1,
                    page_count: 1,
                },
                0,
                text.chars().count(),
                0,
            ),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_render_english_template() {
        let prompt = PromptBuilder::render(ENGLISH_TEMPLATE, "What is RAG?", "RAG is retrieval.");
        assert!(prompt.contains("Question: What is RAG?\n"));
        assert!(prompt.contains("Context: RAG is retrieval.\n"));
        assert!(prompt.ends_with("Answer:"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_render_persian_template() {
        let prompt = PromptBuilder::render(PERSIAN_TEMPLATE, "پایتخت ایران کجاست؟", "تهران");
        assert!(prompt.contains("سوال: پایتخت ایران کجاست؟"));
        assert!(prompt.contains("متن: تهران"));
    }

    #[test]
    fn test_render_does_not_expand_placeholders_in_inputs() {
        let prompt = PromptBuilder::render("Q={question} C={context}", "{context}?", "{x} text");
        assert_eq!(prompt, "Q={context}? C={x} text");
    }

    #[test]
    fn test_build_context_joins_with_blank_lines() {
        let context = PromptBuilder::build_context(&[result("first"), result("second")]);
        assert_eq!(context, "first\n\nsecond");
        assert_eq!(PromptBuilder::build_context(&[]), "");
    }
}
