//! RAG service: owns configuration, providers and the vector store location,
//! and builds the ingestion and answering pipelines

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::AnswerPipeline;
use crate::ingestion::IngestPipeline;
use crate::providers::{
    ChatCompletionClient, Embedder, EmbedderFactory, Generator, HttpEmbedderFactory,
    VectorRetriever,
};
use crate::storage::{StoreInfo, StoreSnapshot, VectorStore};
use crate::types::{IngestReport, Language, LanguageTable, UploadedFile};

/// Shared by every session. Processing runs are serialized because they
/// replace the single on-disk store.
pub struct RagService {
    config: RagConfig,
    ingest: IngestPipeline,
    embedders: Arc<dyn EmbedderFactory>,
    generator: Arc<dyn Generator>,
    ingest_lock: Mutex<()>,
}

impl RagService {
    pub fn new(
        config: RagConfig,
        embedders: Arc<dyn EmbedderFactory>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        config.validate()?;
        let ingest = IngestPipeline::from_config(&config)?;
        Ok(Self {
            config,
            ingest,
            embedders,
            generator,
            ingest_lock: Mutex::new(()),
        })
    }

    /// Wire up the remote embedding and chat completion services.
    /// Fails when the generation credential is missing from the environment.
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let embedders = Arc::new(HttpEmbedderFactory::new(&config.embeddings)?);
        let generator = Arc::new(ChatCompletionClient::new(&config.llm)?);
        tracing::info!(
            "Using embedding service at {} and generation model {}",
            config.embeddings.base_url,
            config.llm.model
        );
        Self::new(config, embedders, generator)
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.config.languages
    }

    pub fn generator_model(&self) -> &str {
        self.generator.model()
    }

    /// Process a batch of PDFs in `language` and bind an answering pipeline
    /// to the resulting store
    pub async fn process(
        &self,
        uploads: &[UploadedFile],
        language: Language,
    ) -> Result<(IngestReport, AnswerPipeline)> {
        let profile = self.languages().get(language)?;
        let embedder = self.embedders.embedder_for(profile)?;

        let _guard = self.ingest_lock.lock().await;
        let report = self.ingest.ingest(uploads, language, embedder.as_ref()).await?;
        let pipeline = self.bind_pipeline(language, embedder).await?;

        Ok((report, pipeline))
    }

    /// Answering pipeline over whatever store is currently on disk
    pub async fn answer_pipeline(&self, language: Language) -> Result<AnswerPipeline> {
        let profile = self.languages().get(language)?;
        let embedder = self.embedders.embedder_for(profile)?;
        self.bind_pipeline(language, embedder).await
    }

    /// Metadata of the current store, if one has been built
    pub async fn store_info(&self) -> Result<Option<StoreInfo>> {
        match self.load_snapshot().await {
            Ok(snapshot) => Ok(snapshot.info().cloned()),
            Err(Error::NotProcessed) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn bind_pipeline(
        &self,
        language: Language,
        embedder: Arc<dyn Embedder>,
    ) -> Result<AnswerPipeline> {
        let profile = self.languages().get(language)?;
        let snapshot = self.load_snapshot().await?;

        let info = snapshot.info().ok_or(Error::NotProcessed)?;
        if info.language != language || info.embedding_model != embedder.model() {
            return Err(Error::Config(format!(
                "The vector store was built for {} with {}, not {} with {}; process the documents again",
                info.language,
                info.embedding_model,
                language,
                embedder.model()
            )));
        }

        tracing::info!(
            "Answering pipeline ready: {} chunks, {} ({})",
            snapshot.len(),
            language,
            embedder.model()
        );

        let retriever = VectorRetriever::new(embedder, snapshot);
        Ok(AnswerPipeline::new(
            language,
            profile.prompt_template.clone(),
            Arc::new(retriever),
            self.generator.clone(),
            self.config.retrieval.top_k,
        ))
    }

    async fn load_snapshot(&self) -> Result<StoreSnapshot> {
        let path = self.ingest.store_path().to_path_buf();
        tokio::task::spawn_blocking(move || VectorStore::open(&path)?.snapshot())
            .await
            .map_err(|e| Error::internal(format!("Vector store task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_service as service, pdf_with_pages, FakeEmbedderFactory, FakeGenerator};

    #[tokio::test]
    async fn test_process_binds_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(FakeGenerator::new("Paris"));
        let service = service(dir.path(), generator.clone());

        let uploads = vec![UploadedFile::new("geo.pdf", pdf_with_pages(&["Paris is in France"]))];
        let (report, pipeline) = service.process(&uploads, Language::English).await.unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(report.embedding_model, "all-MiniLM-L6-v2");

        let answer = pipeline.invoke("Where is Paris?").await.unwrap();
        assert_eq!(answer.text, "Paris");
        assert_eq!(answer.sources[0].filename, "geo.pdf");
        assert_eq!(service.generator_model(), "fake-llm");
    }

    #[tokio::test]
    async fn test_answer_pipeline_before_processing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), Arc::new(FakeGenerator::new("x")));
        let err = service.answer_pipeline(Language::English).await.err().unwrap();
        assert!(matches!(err, Error::NotProcessed));
        assert!(service.store_info().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_language_mismatch_with_store_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), Arc::new(FakeGenerator::new("x")));
        let uploads = vec![UploadedFile::new("a.pdf", pdf_with_pages(&["Some English text"]))];
        service.process(&uploads, Language::English).await.unwrap();

        let err = service.answer_pipeline(Language::Persian).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert!(service.answer_pipeline(Language::English).await.is_ok());

        let info = service.store_info().await.unwrap().unwrap();
        assert_eq!(info.language, Language::English);
    }

    #[tokio::test]
    async fn test_embedding_outage_fails_processing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.vector_db.storage_path = dir.path().join("vector_store");
        let service = RagService::new(
            config,
            Arc::new(FakeEmbedderFactory { fail: true }),
            Arc::new(FakeGenerator::new("x")),
        )
        .unwrap();

        let uploads = vec![UploadedFile::new("a.pdf", pdf_with_pages(&["text"]))];
        let err = service.process(&uploads, Language::English).await.err().unwrap();
        assert!(err.is_retryable());
    }
}
