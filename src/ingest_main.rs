//! Knowledge-base ingestion.
//!
//! Chunks source documents into overlapping passages, embeds them and
//! upserts them into the index the retriever reads:
//!
//! ```text
//! ingest <file> [file...]
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::json;
use uuid::Uuid;

use admitflow_backend::core::config::{AppConfig, AppPaths};
use admitflow_backend::llm::{LlmProvider, OpenAiProvider};
use admitflow_backend::rag::{Chunker, RagStore, SqliteRagStore, StoredChunk};

const EMBED_BATCH: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let files: Vec<String> = env::args().skip(1).collect();
    if files.is_empty() {
        bail!("usage: ingest <file> [file...]");
    }

    let paths = AppPaths::new();
    let config = AppConfig::load(&paths);
    admitflow_backend::core::logging::init(&paths);

    let provider = Arc::new(OpenAiProvider::new(&config.llm)?);
    let store = SqliteRagStore::new(&paths).await?;
    let chunker = Chunker::new(&config.ingest);

    for file in &files {
        let text = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
        let source = Path::new(file)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| file.clone());

        let drafts = chunker.split(&text, &source);
        if drafts.is_empty() {
            tracing::warn!("{} produced no passages, skipping", file);
            continue;
        }
        tracing::info!("{}: {} passages", file, drafts.len());

        for batch in drafts.chunks(EMBED_BATCH) {
            let inputs: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let embeddings = provider
                .embed(&inputs, &config.llm.embedding_model)
                .await
                .context("Embedding request failed")?;

            if embeddings.len() != batch.len() {
                bail!(
                    "embedding count mismatch: {} passages, {} vectors",
                    batch.len(),
                    embeddings.len()
                );
            }

            let items: Vec<(StoredChunk, Vec<f32>)> = batch
                .iter()
                .zip(embeddings)
                .map(|(draft, embedding)| {
                    (
                        StoredChunk {
                            chunk_id: Uuid::new_v4().to_string(),
                            content: draft.text.clone(),
                            source: draft.source.clone(),
                            metadata: Some(json!({
                                "chunk_index": draft.chunk_index,
                                "start_offset": draft.start_offset,
                            })),
                        },
                        embedding,
                    )
                })
                .collect();

            store.insert_batch(items).await?;
        }
    }

    let total = store.count().await?;
    tracing::info!("Ingestion complete, index holds {} passages", total);

    Ok(())
}
