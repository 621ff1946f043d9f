//! Explicit per-user session state: language, processed documents and chat history

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::AnswerPipeline;
use crate::service::RagService;
use crate::types::{Answer, ChatMessage, IngestReport, Language, UploadedFile};

/// One user's interaction state
pub struct Session {
    id: Uuid,
    language: Option<Language>,
    pipeline: Option<Arc<AnswerPipeline>>,
    messages: Vec<ChatMessage>,
    last_report: Option<IngestReport>,
    created_at: DateTime<Utc>,
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub language: Option<Language>,
    pub processed: bool,
    pub messages: Vec<ChatMessage>,
    pub last_report: Option<IngestReport>,
    pub created_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            language: None,
            pipeline: None,
            messages: Vec::new(),
            last_report: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn is_processed(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_report(&self) -> Option<&IngestReport> {
        self.last_report.as_ref()
    }

    /// Choose the document language. Switching to another language drops
    /// the processed documents and the history.
    pub fn select_language(&mut self, language: Language) {
        if self.language == Some(language) {
            return;
        }
        if self.language.is_some() {
            tracing::info!("Session {} switched language to {}", self.id, language);
        }
        self.language = Some(language);
        self.pipeline = None;
        self.messages.clear();
        self.last_report = None;
    }

    /// Process a batch in the selected language. On failure the session is
    /// left exactly as it was.
    pub async fn process_documents(
        &mut self,
        service: &RagService,
        uploads: &[UploadedFile],
    ) -> Result<IngestReport> {
        let language = self.language.ok_or(Error::LanguageNotSelected)?;
        self.process_documents_in(service, uploads, language).await
    }

    /// Process a batch in `language`. The session only switches to that
    /// language once processing succeeds.
    pub async fn process_documents_in(
        &mut self,
        service: &RagService,
        uploads: &[UploadedFile],
        language: Language,
    ) -> Result<IngestReport> {
        let (report, pipeline) = service.process(uploads, language).await?;

        if self.language.is_some_and(|current| current != language) {
            tracing::info!("Session {} switched language to {}", self.id, language);
        }
        self.language = Some(language);
        self.pipeline = Some(Arc::new(pipeline));
        self.messages.clear();
        self.last_report = Some(report.clone());

        Ok(report)
    }

    /// Bind to the store left by an earlier run instead of processing again
    pub async fn resume(&mut self, service: &RagService) -> Result<()> {
        let language = self.language.ok_or(Error::LanguageNotSelected)?;
        let pipeline = service.answer_pipeline(language).await?;
        self.pipeline = Some(Arc::new(pipeline));
        self.messages.clear();
        Ok(())
    }

    /// Ask a question; history grows by one user and one assistant message
    /// only when an answer comes back
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let pipeline = self.pipeline.clone().ok_or(Error::NotProcessed)?;
        let answer = pipeline.invoke(question).await?;

        self.messages.push(ChatMessage::user(question.trim()));
        self.messages.push(ChatMessage::assistant(answer.text.clone()));

        Ok(answer)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            language: self.language,
            processed: self.is_processed(),
            messages: self.messages.clone(),
            last_report: self.last_report.clone(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_service, pdf_with_pages, FakeGenerator};
    use crate::types::Role;

    fn uploads(text: &str) -> Vec<UploadedFile> {
        vec![UploadedFile::new("doc.pdf", pdf_with_pages(&[text]))]
    }

    #[tokio::test]
    async fn test_full_flow() {
        let dir = tempfile::tempdir().unwrap();
        let service = fake_service(dir.path(), Arc::new(FakeGenerator::new("Blue.")));
        let mut session = Session::new();
        assert!(!session.is_processed());

        session.select_language(Language::English);
        let report = session
            .process_documents(&service, &uploads("The sky is blue"))
            .await
            .unwrap();
        assert_eq!(report.files, 1);
        assert!(session.is_processed());
        assert!(session.messages().is_empty());

        let answer = session.ask("What colour is the sky?").await.unwrap();
        assert_eq!(answer.text, "Blue.");

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What colour is the sky?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Blue.");
    }

    #[tokio::test]
    async fn test_process_requires_language() {
        let dir = tempfile::tempdir().unwrap();
        let service = fake_service(dir.path(), Arc::new(FakeGenerator::new("x")));
        let mut session = Session::new();
        let err = session
            .process_documents(&service, &uploads("text"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LanguageNotSelected));
    }

    #[tokio::test]
    async fn test_ask_before_processing() {
        let mut session = Session::new();
        session.select_language(Language::Persian);
        let err = session.ask("سلام؟").await.unwrap_err();
        assert!(matches!(err, Error::NotProcessed));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_processing_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let service = fake_service(dir.path(), Arc::new(FakeGenerator::new("ok")));
        let mut session = Session::new();
        session.select_language(Language::English);
        session
            .process_documents(&service, &uploads("Original content"))
            .await
            .unwrap();
        session.ask("What content?").await.unwrap();

        let err = session
            .process_documents(&service, &uploads(""))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyExtraction));
        assert!(session.is_processed());
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.last_report().unwrap().chunks, 1);
    }

    #[tokio::test]
    async fn test_failed_processing_in_other_language_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let service = fake_service(dir.path(), Arc::new(FakeGenerator::new("ok")));
        let mut session = Session::new();
        session.select_language(Language::English);
        session
            .process_documents(&service, &uploads("English content"))
            .await
            .unwrap();
        session.ask("What content?").await.unwrap();

        let err = session
            .process_documents_in(&service, &uploads(""), Language::Persian)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyExtraction));
        assert_eq!(session.language(), Some(Language::English));
        assert!(session.is_processed());
        assert_eq!(session.messages().len(), 2);

        session
            .process_documents_in(&service, &uploads("Persian content"), Language::Persian)
            .await
            .unwrap();
        assert_eq!(session.language(), Some(Language::Persian));
        assert!(session.messages().is_empty());
        assert_eq!(session.last_report().unwrap().language, Language::Persian);
    }

    #[tokio::test]
    async fn test_failed_answer_leaves_history_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let service = fake_service(dir.path(), Arc::new(FakeGenerator::failing()));
        let mut session = Session::new();
        session.select_language(Language::English);
        session
            .process_documents(&service, &uploads("Some content"))
            .await
            .unwrap();

        let err = session.ask("Anything?").await.unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_resume_uses_existing_store() {
        let dir = tempfile::tempdir().unwrap();
        let service = fake_service(dir.path(), Arc::new(FakeGenerator::new("ok")));

        let mut first = Session::new();
        first.select_language(Language::English);
        assert!(matches!(
            first.resume(&service).await.unwrap_err(),
            Error::NotProcessed
        ));
        first
            .process_documents(&service, &uploads("Stored content"))
            .await
            .unwrap();

        let mut second = Session::new();
        second.select_language(Language::English);
        second.resume(&service).await.unwrap();
        assert!(second.is_processed());
        assert_eq!(second.ask("What is stored?").await.unwrap().text, "ok");

        let mut persian = Session::new();
        persian.select_language(Language::Persian);
        assert!(matches!(
            persian.resume(&service).await.unwrap_err(),
            Error::Config(_)
        ));
    }

    #[tokio::test]
    async fn test_language_change_resets() {
        let dir = tempfile::tempdir().unwrap();
        let service = fake_service(dir.path(), Arc::new(FakeGenerator::new("ok")));
        let mut session = Session::new();
        session.select_language(Language::English);
        session
            .process_documents(&service, &uploads("Some content"))
            .await
            .unwrap();
        session.ask("What?").await.unwrap();

        session.select_language(Language::English);
        assert!(session.is_processed());
        assert_eq!(session.messages().len(), 2);

        session.select_language(Language::Persian);
        assert!(!session.is_processed());
        assert!(session.messages().is_empty());
        assert_eq!(session.language(), Some(Language::Persian));
        assert!(session.view().last_report.is_none());
    }
}
