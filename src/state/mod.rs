use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::config::{AppConfig, AppPaths, ExtractorStrategy};
use crate::db::Database;
use crate::dialog::{DialogOrchestrator, InMemorySessionStore, ScriptedReplies, SessionStore};
use crate::extract::{Extractor, ModelExtractor, PatternExtractor};
use crate::llm::{CompletionClient, LlmProvider, OpenAiProvider};
use crate::rag::{KnowledgeRetriever, SqliteRagStore};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: AppConfig,
    pub llm: Arc<dyn LlmProvider>,
    pub dialog: DialogOrchestrator,
    pub started_at: Instant,
}

impl AppState {
    /// Wires paths → config → stores → provider → orchestrator.
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let config = AppConfig::load(&paths);

        let database = Database::new(&paths)
            .await
            .map_err(InitializationError::Database)?;

        let rag_store = Arc::new(
            SqliteRagStore::new(&paths)
                .await
                .map_err(InitializationError::Knowledge)?,
        );

        let provider: Arc<dyn LlmProvider> = Arc::new(
            OpenAiProvider::new(&config.llm).map_err(InitializationError::Llm)?,
        );

        let completion = CompletionClient::new(provider.clone(), &config.llm, &config.institution);

        let retriever = KnowledgeRetriever::new(
            rag_store,
            provider.clone(),
            config.llm.embedding_model.clone(),
            config.retrieval.clone(),
        );

        let extractor: Arc<dyn Extractor> = match config.extractor {
            ExtractorStrategy::Pattern => Arc::new(PatternExtractor::new()),
            ExtractorStrategy::Model => Arc::new(ModelExtractor::new(completion.clone())),
        };

        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        spawn_eviction_sweep(&config, sessions.clone());

        let dialog = DialogOrchestrator::new(
            sessions,
            extractor,
            retriever,
            completion,
            database,
            ScriptedReplies::new(&config.institution),
        );

        Ok(Arc::new(AppState {
            paths,
            config,
            llm: provider,
            dialog,
            started_at: Instant::now(),
        }))
    }
}

/// Optional idle-session eviction. Off by default: the in-memory map is
/// process-lifetime unless configured otherwise.
fn spawn_eviction_sweep(config: &AppConfig, sessions: Arc<dyn SessionStore>) {
    let eviction = config.sessions.eviction.clone();
    if !eviction.enabled {
        return;
    }

    let ttl = Duration::from_secs(eviction.idle_ttl_secs);
    let sweep_every = Duration::from_secs(eviction.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let evicted = sessions.evict_idle(ttl).await;
            if evicted > 0 {
                tracing::info!("Evicted {} idle sessions", evicted);
            }
        }
    });
}
