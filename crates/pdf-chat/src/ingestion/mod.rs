//! Document ingestion: PDF text extraction, chunking and store building

mod chunker;
mod parser;
mod processor;

pub use chunker::{Span, TextChunker};
pub use parser::FileParser;
pub use processor::IngestPipeline;
