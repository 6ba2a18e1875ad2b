//! Flat k-nearest-neighbor index over short text documents.
//!
//! Documents live in the `knowledge_documents` table. Search embeds the query
//! and scans every stored vector, ordering by cosine distance. The corpus is
//! small (pricing and policy snippets), so a flat scan is the whole index.

use std::sync::Arc;
use std::time::Duration;

use raahi_db::DbPool;
use raahi_types::KnowledgeDocument;
use rusqlite::{params, Connection, OptionalExtension};

use crate::embedding::{cosine_distance, Embedder};
use crate::error::KnowledgeError;

/// Separator placed between retrieved documents.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Embedding dimension of the default embedding model.
pub const DEFAULT_DIMENSION: usize = 768;

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Inserts or replaces the document stored under `id`.
///
/// # Errors
///
/// Returns `KnowledgeError::Database` on SQL failure.
pub fn upsert_document(
    conn: &Connection,
    id: &str,
    content: &str,
    embedding: &[f32],
) -> Result<(), KnowledgeError> {
    conn.execute(
        "INSERT INTO knowledge_documents (id, content, embedding, dimension, updated_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
            content = excluded.content,
            embedding = excluded.embedding,
            dimension = excluded.dimension,
            updated_at = excluded.updated_at",
        params![id, content, encode_embedding(embedding), embedding.len() as i64],
    )?;
    Ok(())
}

/// Fetches a stored document by id.
///
/// # Errors
///
/// Returns `KnowledgeError::Database` on SQL failure.
pub fn get_document(conn: &Connection, id: &str) -> Result<Option<KnowledgeDocument>, KnowledgeError> {
    let row = conn
        .query_row(
            "SELECT id, content, embedding FROM knowledge_documents WHERE id = ?1",
            params![id],
            |row| {
                Ok(KnowledgeDocument {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    embedding: decode_embedding(&row.get::<_, Vec<u8>>(2)?),
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Returns up to `k` `(distance, content)` pairs nearest to `query`,
/// ascending by cosine distance. Rows with a different dimension are skipped.
///
/// # Errors
///
/// Returns `KnowledgeError::Database` on SQL failure.
pub fn nearest_documents(
    conn: &Connection,
    query: &[f32],
    k: usize,
) -> Result<Vec<(f32, String)>, KnowledgeError> {
    let mut stmt =
        conn.prepare("SELECT content, embedding FROM knowledge_documents WHERE dimension = ?1")?;
    let rows = stmt.query_map(params![query.len() as i64], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
    })?;

    let mut scored = Vec::new();
    for row in rows {
        let (content, blob) = row?;
        let distance = cosine_distance(query, &decode_embedding(&blob));
        scored.push((distance, content));
    }

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(k);
    Ok(scored)
}

/// Vector-similarity store with upsert and KNN retrieval.
#[derive(Clone)]
pub struct KnowledgeIndex {
    pool: DbPool,
    embedder: Arc<dyn Embedder>,
    dimension: usize,
    embed_timeout: Duration,
}

impl KnowledgeIndex {
    pub fn new(
        pool: DbPool,
        embedder: Arc<dyn Embedder>,
        dimension: usize,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            embedder,
            dimension,
            embed_timeout,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let embedding = tokio::time::timeout(self.embed_timeout, self.embedder.embed(text))
            .await
            .map_err(|_| KnowledgeError::Timeout(self.embed_timeout))??;

        if embedding.len() != self.dimension {
            return Err(KnowledgeError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    /// Embeds `text` and stores it under `id`, replacing any prior value.
    ///
    /// Ingestion is an explicit administrative action, so failures are
    /// returned to the caller for retry.
    pub async fn upsert(&self, id: &str, text: &str) -> Result<(), KnowledgeError> {
        if id.trim().is_empty() {
            return Err(KnowledgeError::InvalidDocument("id is empty".to_string()));
        }
        if text.trim().is_empty() {
            return Err(KnowledgeError::InvalidDocument("text is empty".to_string()));
        }

        let embedding = self.embed(text).await?;

        let pool = self.pool.clone();
        let id_owned = id.to_string();
        let content = text.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            upsert_document(&conn, &id_owned, &content, &embedding)
        })
        .await
        .map_err(|e| KnowledgeError::Task(e.to_string()))??;

        tracing::info!(doc_id = id, "saved knowledge document");
        Ok(())
    }

    /// Returns the contents of the `k` nearest documents to `query`, nearest
    /// first, joined by a blank line.
    ///
    /// Never fails: any retrieval problem is logged and yields an empty
    /// string, which callers treat as "no relevant knowledge".
    pub async fn search(&self, query: &str, k: usize) -> String {
        match self.try_search(query, k).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(error = %e, "knowledge search failed, continuing without context");
                String::new()
            }
        }
    }

    async fn try_search(&self, query: &str, k: usize) -> Result<String, KnowledgeError> {
        if k == 0 || query.trim().is_empty() {
            return Ok(String::new());
        }

        let embedding = self.embed(query).await?;

        let pool = self.pool.clone();
        let nearest = tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            nearest_documents(&conn, &embedding, k)
        })
        .await
        .map_err(|e| KnowledgeError::Task(e.to_string()))??;

        tracing::debug!(hits = nearest.len(), "knowledge search complete");

        Ok(nearest
            .into_iter()
            .map(|(_, content)| content)
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR))
    }

    /// Fetches a stored document by id.
    pub async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>, KnowledgeError> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            get_document(&conn, &id)
        })
        .await
        .map_err(|e| KnowledgeError::Task(e.to_string()))?
    }
}
