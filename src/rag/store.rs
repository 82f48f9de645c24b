//! RagStore trait — abstract interface for the knowledge index.
//!
//! The retriever only reads; the ingest binary is the only writer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A stored knowledge-base passage with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the passage.
    pub content: String,
    /// Source identifier (filename, URL).
    pub source: String,
    /// Optional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

/// Result of a similarity search.
///
/// `distance` is a cosine distance: lower = more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    pub distance: f32,
}

/// Abstract trait for knowledge-index backends.
#[async_trait]
pub trait RagStore: Send + Sync {
    /// Insert a chunk with its embedding vector.
    async fn insert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<(), ApiError>;

    /// Insert multiple chunks in one transaction.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError>;

    /// Search for chunks near the query embedding, ascending by distance.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError>;

    /// Total chunk count.
    async fn count(&self) -> Result<usize, ApiError>;

    /// Remove every chunk (used before a full re-ingest).
    async fn clear(&self) -> Result<usize, ApiError>;
}
