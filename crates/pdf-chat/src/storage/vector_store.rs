//! On-disk vector store: one SQLite file inside a directory that is
//! deleted and recreated on every processing run.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Language, VectorRecord};

/// Database file inside the store directory
pub const INDEX_FILE: &str = "index.sqlite3";

/// Describes what a store was built with
#[derive(Debug, Clone, PartialEq)]
pub struct StoreInfo {
    pub language: Language,
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (-1.0..=1.0, higher is better)
    pub similarity: f32,
}

/// SQLite-backed vector store
pub struct VectorStore {
    dir: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl VectorStore {
    /// Open an existing store; `NotProcessed` when nothing was built yet
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let file = dir.join(INDEX_FILE);
        if !file.exists() {
            return Err(Error::NotProcessed);
        }

        let conn = Connection::open(&file)
            .map_err(|e| Error::vector_db(format!("Failed to open {}: {}", file.display(), e)))?;
        let store = Self {
            dir: Some(dir.to_path_buf()),
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Delete whatever is at `dir` and start an empty store there
    pub fn recreate<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if dir.exists() {
            tracing::info!("Removing previous vector store at {}", dir.display());
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;

        let file = dir.join(INDEX_FILE);
        let conn = Connection::open(&file)
            .map_err(|e| Error::vector_db(format!("Failed to create {}: {}", file.display(), e)))?;
        let store = Self {
            dir: Some(dir.to_path_buf()),
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Replace the store at `dir` with `records`, all or nothing.
    /// The new store is written to a sibling staging directory and only
    /// swapped in once it is complete.
    pub fn rebuild<P: AsRef<Path>>(
        dir: P,
        language: Language,
        embedding_model: &str,
        records: &[VectorRecord],
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let dimensions = check_dimensions(records)?;
        let staging = staging_dir(dir);

        let built = Self::recreate(&staging).and_then(|store| {
            store.insert_records(records)?;
            store.write_info(&StoreInfo {
                language,
                embedding_model: embedding_model.to_string(),
                dimensions,
                chunk_count: records.len(),
                created_at: Utc::now(),
            })
        });
        if let Err(e) = built {
            if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                tracing::warn!("Failed to remove {}: {}", staging.display(), cleanup);
            }
            return Err(e);
        }

        if dir.exists() {
            tracing::info!("Removing previous vector store at {}", dir.display());
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::rename(&staging, dir)?;
        Self::open(dir)
    }

    /// Create an in-memory store (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            dir: None,
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Store directory, if backed by disk
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS vectors (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL,
                page_number INTEGER NOT NULL,
                page_count INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                char_start INTEGER NOT NULL,
                char_end INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS store_info (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                language TEXT NOT NULL,
                embedding_model TEXT NOT NULL,
                dimensions INTEGER NOT NULL,
                chunk_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| Error::vector_db(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    /// Insert records in a single transaction; all embeddings must share one dimension
    pub fn insert_records(&self, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        check_dimensions(records)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO vectors (id, filename, page_number, page_count, chunk_index,
                                      char_start, char_end, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for record in records {
                let chunk = &record.chunk;
                stmt.execute(params![
                    chunk.id.to_string(),
                    chunk.source.filename,
                    chunk.source.page_number,
                    chunk.source.page_count,
                    chunk.chunk_index,
                    chunk.char_start as i64,
                    chunk.char_end as i64,
                    chunk.content,
                    encode_embedding(&record.embedding),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Inserted {} vector records", records.len());
        Ok(records.len())
    }

    pub fn write_info(&self, info: &StoreInfo) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO store_info (id, language, embedding_model, dimensions, chunk_count, created_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)",
            params![
                info.language.as_tag(),
                info.embedding_model,
                info.dimensions as i64,
                info.chunk_count as i64,
                info.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn info(&self) -> Result<Option<StoreInfo>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT language, embedding_model, dimensions, chunk_count, created_at
                 FROM store_info WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, DateTime<Utc>>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(language, embedding_model, dimensions, chunk_count, created_at)| {
            Ok(StoreInfo {
                language: language.parse()?,
                embedding_model,
                dimensions: dimensions as usize,
                chunk_count: chunk_count as usize,
                created_at,
            })
        })
        .transpose()
    }

    /// Number of stored vectors
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM vectors", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Load every record into memory. The snapshot is unaffected by later rebuilds.
    pub fn snapshot(&self) -> Result<StoreSnapshot> {
        let info = self.info()?;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, filename, page_number, page_count, chunk_index,
                    char_start, char_end, content, embedding
             FROM vectors ORDER BY seq",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ChunkSource {
                    filename: row.get(1)?,
                    page_number: row.get(2)?,
                    page_count: row.get(3)?,
                },
                row.get::<_, u32>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, Vec<u8>>(8)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, source, chunk_index, char_start, char_end, content, blob) = row?;
            let id = Uuid::parse_str(&id)
                .map_err(|e| Error::vector_db(format!("Corrupt chunk id {}: {}", id, e)))?;
            records.push(VectorRecord {
                chunk: Chunk {
                    id,
                    content,
                    source,
                    char_start: char_start as usize,
                    char_end: char_end as usize,
                    chunk_index,
                },
                embedding: decode_embedding(&blob)?,
            });
        }

        Ok(StoreSnapshot {
            records: Arc::new(records),
            info,
        })
    }
}

/// Immutable in-memory copy of a store, searched by brute-force cosine similarity
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    records: Arc<Vec<VectorRecord>>,
    info: Option<StoreInfo>,
}

impl StoreSnapshot {
    pub fn info(&self) -> Option<&StoreInfo> {
        self.info.as_ref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Top `top_k` records by cosine similarity, best first
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if let Some(record) = self.records.first() {
            if record.embedding.len() != query.len() {
                return Err(Error::vector_db(format!(
                    "Query has {} dimensions but the store holds {}-dimensional vectors",
                    query.len(),
                    record.embedding.len()
                )));
            }
        }

        let mut results: Vec<SearchResult> = self
            .records
            .iter()
            .map(|record| SearchResult {
                chunk: record.chunk.clone(),
                similarity: cosine_similarity(query, &record.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(top_k);
        Ok(results)
    }
}

/// Shared embedding length of `records` (0 when there are none)
fn check_dimensions(records: &[VectorRecord]) -> Result<usize> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let dimensions = first.embedding.len();
    if dimensions == 0 {
        return Err(Error::vector_db("Record has an empty embedding"));
    }
    if let Some(bad) = records.iter().find(|r| r.embedding.len() != dimensions) {
        return Err(Error::vector_db(format!(
            "Embedding dimension mismatch: expected {}, got {} for chunk {}",
            dimensions,
            bad.embedding.len(),
            bad.chunk.id
        )));
    }
    Ok(dimensions)
}

fn staging_dir(dir: &Path) -> PathBuf {
    let mut name = dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "vector_store".into());
    name.push(".staging");
    dir.with_file_name(name)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::vector_db("Corrupt embedding blob"));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
