//! Ingestion pipeline: extract, chunk, embed, then replace the vector store

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::Embedder;
use crate::storage::VectorStore;
use crate::types::{Chunk, IngestReport, Language, PageText, UploadedFile, VectorRecord};

use super::chunker::TextChunker;
use super::parser::FileParser;

/// Turns a batch of uploaded PDFs into a fresh vector store
pub struct IngestPipeline {
    chunker: TextChunker,
    store_path: PathBuf,
    batch_size: usize,
}

impl IngestPipeline {
    pub fn new(chunker: TextChunker, store_path: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            chunker,
            store_path: store_path.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        Ok(Self::new(
            chunker,
            &config.vector_db.storage_path,
            config.embeddings.batch_size,
        ))
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Extract page text from every upload; the first unreadable file fails the batch.
    /// A file whose bytes repeat an earlier upload is skipped.
    pub async fn extract(&self, uploads: &[UploadedFile]) -> Result<Vec<PageText>> {
        let mut pages = Vec::new();
        let mut seen = HashSet::new();

        for upload in uploads {
            if !seen.insert(upload.content_hash()) {
                tracing::warn!("Skipping {}: same content as an earlier upload", upload.filename);
                continue;
            }

            tracing::info!("Extracting {} ({} bytes)", upload.filename, upload.data.len());
            let filename = upload.filename.clone();
            let data = upload.data.clone();

            let file_pages = tokio::task::spawn_blocking(move || FileParser::parse_pdf(&filename, &data))
                .await
                .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))??;

            pages.extend(file_pages);
        }

        Ok(pages)
    }

    /// Run the whole batch. The store on disk is only touched after every
    /// chunk has been embedded, so any failure leaves the previous store intact.
    pub async fn ingest(
        &self,
        uploads: &[UploadedFile],
        language: Language,
        embedder: &dyn Embedder,
    ) -> Result<IngestReport> {
        let start = Instant::now();
        if uploads.is_empty() {
            tracing::warn!("No files in batch");
            return Err(Error::EmptyExtraction);
        }

        let pages = self.extract(uploads).await?;
        let chunks = self.chunker.chunk_pages(&pages);
        if chunks.is_empty() {
            tracing::warn!("No text extracted from {} file(s)", uploads.len());
            return Err(Error::EmptyExtraction);
        }

        tracing::info!(
            "Embedding {} chunks from {} pages with {}",
            chunks.len(),
            pages.len(),
            embedder.model()
        );
        let records = self.embed_chunks(chunks, embedder).await?;
        let chunk_count = records.len();
        let dimensions = records.first().map(|r| r.embedding.len()).unwrap_or(0);

        let store_path = self.store_path.clone();
        let model = embedder.model().to_string();
        tokio::task::spawn_blocking(move || {
            VectorStore::rebuild(&store_path, language, &model, &records).map(|_| ())
        })
        .await
        .map_err(|e| Error::internal(format!("Vector store task failed: {}", e)))??;

        let report = IngestReport {
            language,
            files: uploads.len(),
            pages: pages.len(),
            chunks: chunk_count,
            embedding_model: embedder.model().to_string(),
            dimensions,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Processed {} file(s) into {} chunks in {}ms",
            report.files,
            report.chunks,
            report.processing_time_ms
        );

        Ok(report)
    }

    async fn embed_chunks(
        &self,
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
    ) -> Result<Vec<VectorRecord>> {
        let mut records = Vec::with_capacity(chunks.len());
        let total_batches = chunks.len().div_ceil(self.batch_size);

        for (batch_num, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            tracing::debug!("Embedded batch {}/{}", batch_num + 1, total_batches);
            records.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| VectorRecord { chunk, embedding }),
            );
        }

        Ok(records)
    }
}
