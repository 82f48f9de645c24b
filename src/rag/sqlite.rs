//! SQLite-backed knowledge index.
//!
//! In-process store using SQLite for passage metadata and brute-force
//! cosine distance for search. Fine at knowledge-base scale (hundreds of
//! passages); the `RagStore` seam exists so a vector database can replace
//! it without touching the retriever.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteRagStore {
    pool: SqlitePool,
}

impl SqliteRagStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.knowledge_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS knowledge_chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                metadata TEXT DEFAULT '{}',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON knowledge_chunks(source)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// Cosine distance: 0 = identical direction, 1 = orthogonal or
    /// unusable (mismatched/zero vectors).
    fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 1.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            1.0
        } else {
            1.0 - (dot / denom).clamp(-1.0, 1.0)
        }
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        let metadata_str: String = row.get("metadata");
        let metadata = serde_json::from_str::<Value>(&metadata_str).ok();

        StoredChunk {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            source: row.get("source"),
            metadata,
        }
    }

    fn metadata_str(chunk: &StoredChunk) -> String {
        chunk
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m).unwrap_or_default())
            .unwrap_or_else(|| "{}".to_string())
    }
}

#[async_trait]
impl RagStore for SqliteRagStore {
    async fn insert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<(), ApiError> {
        let blob = Self::serialize_embedding(&embedding);
        let metadata_str = Self::metadata_str(&chunk);

        sqlx::query(
            "INSERT OR REPLACE INTO knowledge_chunks (chunk_id, content, source, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&chunk.chunk_id)
        .bind(&chunk.content)
        .bind(&chunk.source)
        .bind(&metadata_str)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (chunk, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);
            let metadata_str = Self::metadata_str(chunk);

            sqlx::query(
                "INSERT OR REPLACE INTO knowledge_chunks (chunk_id, content, source, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&chunk.chunk_id)
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        if limit == 0 || query_embedding.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT chunk_id, content, source, metadata, embedding
             FROM knowledge_chunks WHERE embedding IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut results: Vec<ChunkSearchResult> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let embedding = Self::deserialize_embedding(&blob);
                ChunkSearchResult {
                    chunk: Self::row_to_chunk(row),
                    distance: Self::cosine_distance(query_embedding, &embedding),
                }
            })
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM knowledge_chunks")
            .fetch_one(&self.pool)
            .await
            .map(|row| row.get(0))
            .map_err(ApiError::internal)?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<usize, ApiError> {
        let result = sqlx::query("DELETE FROM knowledge_chunks")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(result.rows_affected() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, content: &str) -> StoredChunk {
        StoredChunk {
            chunk_id: id.to_string(),
            content: content.to_string(),
            source: "test.md".to_string(),
            metadata: None,
        }
    }

    async fn temp_store() -> (tempfile::TempDir, SqliteRagStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteRagStore::with_path(dir.path().join("knowledge.db"))
            .await
            .expect("store");
        (dir, store)
    }

    #[tokio::test]
    async fn search_orders_ascending_by_distance() {
        let (_dir, store) = temp_store().await;

        store
            .insert_batch(vec![
                (chunk("a", "far"), vec![0.0, 1.0, 0.0]),
                (chunk("b", "near"), vec![0.9, 0.1, 0.0]),
                (chunk("c", "middle"), vec![0.5, 0.5, 0.0]),
            ])
            .await
            .expect("insert");

        let results = store.search(&[1.0, 0.0, 0.0], 3).await.expect("search");

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.content, "near");
        assert_eq!(results[2].chunk.content, "far");
        assert!(results[0].distance <= results[1].distance);
        assert!(results[1].distance <= results[2].distance);
    }

    #[tokio::test]
    async fn search_respects_limit_and_empty_store() {
        let (_dir, store) = temp_store().await;

        assert!(store.search(&[1.0, 0.0], 3).await.expect("search").is_empty());

        store
            .insert(chunk("a", "one"), vec![1.0, 0.0])
            .await
            .expect("insert");
        store
            .insert(chunk("b", "two"), vec![0.0, 1.0])
            .await
            .expect("insert");

        let results = store.search(&[1.0, 0.0], 1).await.expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "one");
    }

    #[tokio::test]
    async fn upsert_replaces_by_chunk_id() {
        let (_dir, store) = temp_store().await;

        store
            .insert(chunk("a", "old"), vec![1.0, 0.0])
            .await
            .expect("insert");
        store
            .insert(chunk("a", "new"), vec![1.0, 0.0])
            .await
            .expect("insert");

        assert_eq!(store.count().await.expect("count"), 1);
        let results = store.search(&[1.0, 0.0], 1).await.expect("search");
        assert_eq!(results[0].chunk.content, "new");
    }

    #[tokio::test]
    async fn clear_empties_the_index() {
        let (_dir, store) = temp_store().await;

        store
            .insert(chunk("a", "one"), vec![1.0, 0.0])
            .await
            .expect("insert");
        assert_eq!(store.clear().await.expect("clear"), 1);
        assert_eq!(store.count().await.expect("count"), 0);
    }
}
