//! In-process fakes for the capability traits, shared by unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{Embedder, EmbedderFactory, Generator};
use crate::service::RagService;
use crate::types::LanguageProfile;

const FAKE_DIMENSIONS: usize = 32;

/// Bag-of-words embedder: texts sharing words get similar vectors
pub struct FakeEmbedder {
    model: String,
    fail: bool,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(model: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(model)
        }
    }
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; FAKE_DIMENSIONS];
    for word in text.split_whitespace() {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.is_empty() {
            continue;
        }
        let bucket = word
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
            % FAKE_DIMENSIONS;
        vector[bucket] += 1.0;
    }
    vector
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::embedding("embedding service unavailable"));
        }
        Ok(bag_of_words(text))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Hands out `FakeEmbedder`s named after the profile's model
#[derive(Default)]
pub struct FakeEmbedderFactory {
    pub fail: bool,
}

impl EmbedderFactory for FakeEmbedderFactory {
    fn embedder_for(&self, profile: &LanguageProfile) -> Result<Arc<dyn Embedder>> {
        let embedder = if self.fail {
            FakeEmbedder::failing(profile.embedding_model.clone())
        } else {
            FakeEmbedder::new(profile.embedding_model.clone())
        };
        Ok(Arc::new(embedder))
    }
}

/// Generator that records every prompt and answers with a canned reply
pub struct FakeGenerator {
    reply: String,
    fail: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.fail {
            return Err(Error::llm("generation service unavailable"));
        }
        Ok(self.reply.clone())
    }

    fn model(&self) -> &str {
        "fake-llm"
    }
}

/// Service with fake providers and its store under `dir`
pub fn fake_service(dir: &std::path::Path, generator: Arc<FakeGenerator>) -> RagService {
    let mut config = RagConfig::default();
    config.vector_db.storage_path = dir.join("vector_store");
    RagService::new(config, Arc::new(FakeEmbedderFactory::default()), generator).unwrap()
}

/// Minimal PDF with one Courier text line per page
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
