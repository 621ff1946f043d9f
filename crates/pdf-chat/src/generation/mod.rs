//! Answer generation: prompt rendering and the retrieval-augmented pipeline

pub mod chain;
pub mod prompt;

pub use chain::AnswerPipeline;
pub use prompt::PromptBuilder;
