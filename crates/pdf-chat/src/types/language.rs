//! Document languages and the per-language model/prompt table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Languages a document batch can be processed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Persian,
}

impl Language {
    /// Every supported language, in display order
    pub const ALL: [Language; 2] = [Language::English, Language::Persian];

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Persian => "Persian",
        }
    }

    /// Stable lowercase tag used in URLs, config keys and the store info
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Persian => "persian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "persian" | "farsi" | "fa" => Ok(Self::Persian),
            other => Err(Error::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Models and prompt used for one language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageProfile {
    /// Embedding model name sent to the embedding service
    pub embedding_model: String,
    /// Prompt template with `{question}` and `{context}` placeholders
    pub prompt_template: String,
}

pub const ENGLISH_TEMPLATE: &str = "You are an assistant for question-answering tasks. Use the following pieces of retrieved context to answer the question. If you don't know the answer, just say that you don't know. Keep the answer concise.
Question: {question}
Context: {context}
Answer:";

pub const PERSIAN_TEMPLATE: &str = "شما یک دستیار برای پاسخ به پرسش‌ها هستید. از قطعات متنی بازیابی شده زیر برای پاسخ به سوال استفاده کنید. اگر جواب را نمی‌دانید، فقط بگویید که نمی‌دانید. پاسخ را مختصر نگه دارید.
سوال: {question}
متن: {context}
پاسخ:";

/// Lookup table from language to profile, resolved once per pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LanguageTable {
    profiles: HashMap<Language, LanguageProfile>,
}

impl LanguageTable {
    /// Build a table from explicit profiles
    pub fn new(profiles: HashMap<Language, LanguageProfile>) -> Self {
        Self { profiles }
    }

    /// Resolve the profile for a language
    pub fn get(&self, language: Language) -> Result<&LanguageProfile> {
        self.profiles
            .get(&language)
            .ok_or_else(|| Error::UnsupportedLanguage(language.as_tag().to_string()))
    }

    /// Resolve a raw language tag, failing before any other work happens
    pub fn resolve(&self, tag: &str) -> Result<(Language, &LanguageProfile)> {
        let language: Language = tag.parse()?;
        Ok((language, self.get(language)?))
    }

    /// Languages with a configured profile, in display order
    pub fn languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|l| self.profiles.contains_key(l))
            .collect()
    }

    /// Override or add a profile
    pub fn insert(&mut self, language: Language, profile: LanguageProfile) {
        self.profiles.insert(language, profile);
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            Language::English,
            LanguageProfile {
                embedding_model: "all-MiniLM-L6-v2".to_string(),
                prompt_template: ENGLISH_TEMPLATE.to_string(),
            },
        );
        profiles.insert(
            Language::Persian,
            LanguageProfile {
                embedding_model: "heydariAI/persian-embeddings".to_string(),
                prompt_template: PERSIAN_TEMPLATE.to_string(),
            },
        );
        Self { profiles }
    }
}
