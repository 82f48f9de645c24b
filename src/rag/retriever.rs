//! Query → ranked passages → bounded context + confidence.

use std::sync::Arc;

use super::store::RagStore;
use crate::core::config::RetrievalConfig;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

/// A passage returned by the knowledge index; lower distance = more
/// relevant. Ephemeral, recomputed per query.
#[derive(Debug, Clone)]
pub struct RetrievedPassage {
    pub text: String,
    pub distance: f32,
}

/// The assembled context for one open-chat turn.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    /// Selected passages joined by blank lines; empty when nothing was
    /// retrievable.
    pub context: String,
    /// `1 / (1 + mean distance)` over the selected passages, in (0,1];
    /// exactly 0 when no passage was selected.
    pub confidence: f64,
    pub passage_count: usize,
}

impl RetrievedContext {
    pub fn empty() -> Self {
        Self {
            context: String::new(),
            confidence: 0.0,
            passage_count: 0,
        }
    }
}

/// Wraps the embedding-indexed store; turns a user question into ranked
/// passages and a bounded context block.
#[derive(Clone)]
pub struct KnowledgeRetriever {
    store: Arc<dyn RagStore>,
    provider: Arc<dyn LlmProvider>,
    embedding_model: String,
    config: RetrievalConfig,
}

impl KnowledgeRetriever {
    pub fn new(
        store: Arc<dyn RagStore>,
        provider: Arc<dyn LlmProvider>,
        embedding_model: String,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            provider,
            embedding_model,
            config,
        }
    }

    /// Ranked passages for a query, ascending by distance. `k` bounds the
    /// result count.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, ApiError> {
        let embeddings = self
            .provider
            .embed(&[query.to_string()], &self.embedding_model)
            .await?;
        let query_embedding = embeddings
            .first()
            .ok_or_else(|| ApiError::Internal("embedding provider returned no vector".to_string()))?;

        let results = self.store.search(query_embedding, k).await?;

        Ok(results
            .into_iter()
            .map(|r| RetrievedPassage {
                text: r.chunk.content,
                distance: r.distance,
            })
            .collect())
    }

    /// Full retrieval step for an open-chat turn.
    ///
    /// A store or embedding failure is acceptable degradation: the turn
    /// proceeds with an empty context rather than failing.
    pub async fn retrieve(&self, query: &str) -> RetrievedContext {
        match self.search(query, self.config.top_k).await {
            Ok(passages) => assemble_context(&passages, &self.config),
            Err(err) => {
                tracing::warn!("Knowledge index unavailable, proceeding without context: {}", err);
                RetrievedContext::empty()
            }
        }
    }
}

/// Selects the closest passages under the configured caps and derives the
/// confidence signal from their distances.
///
/// Passages must already be sorted ascending by distance.
pub fn assemble_context(passages: &[RetrievedPassage], config: &RetrievalConfig) -> RetrievedContext {
    let mut selected: Vec<&RetrievedPassage> = Vec::new();
    let mut used_chars = 0;

    for passage in passages.iter().take(config.max_passages) {
        let addition = passage.text.len() + 2;
        if !selected.is_empty() && used_chars + addition > config.max_context_chars {
            break;
        }
        used_chars += addition;
        selected.push(passage);
    }

    if selected.is_empty() {
        return RetrievedContext::empty();
    }

    let context = selected
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mean_distance =
        selected.iter().map(|p| p.distance as f64).sum::<f64>() / selected.len() as f64;

    RetrievedContext {
        context,
        confidence: 1.0 / (1.0 + mean_distance),
        passage_count: selected.len(),
    }
}
