//! Retrieval pipeline over the private knowledge base.
//!
//! This module provides:
//! - `RagStore`: abstract interface over the embedding-indexed chunk store
//! - `SqliteRagStore`: the in-process SQLite implementation
//! - `KnowledgeRetriever`: query → ranked passages → bounded context + confidence
//! - `Chunker`: splits source documents into overlapping passages for ingestion

mod chunker;
mod retriever;
mod sqlite;
mod store;

pub use chunker::Chunker;
pub use retriever::{KnowledgeRetriever, RetrievedContext, RetrievedPassage};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};
