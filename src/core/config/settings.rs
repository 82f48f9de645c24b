use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;

/// Typed application configuration, loaded from `config.yml`.
///
/// Every section has serde defaults so a missing or partial file still
/// yields a runnable configuration. Secrets (the provider API key) come
/// from the environment, never from the file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub institution: InstitutionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub extractor: ExtractorStrategy,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionConfig {
    pub name: String,
    pub bot_name: String,
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        Self {
            name: "GCC School".to_string(),
            bot_name: "GCC School Bot".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    /// Deadline applied to every outbound provider call.
    pub request_timeout_secs: u64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-5.2".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.7,
            request_timeout_secs: 30,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Which slot-extraction strategy the orchestrator runs.
///
/// Exactly one strategy is active per deployment; the two are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorStrategy {
    #[default]
    Pattern,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages requested per source.
    pub top_k: usize,
    /// Cap across all sources before context assembly.
    pub max_passages: usize,
    /// Upper bound on assembled context, in characters.
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_passages: 5,
            max_context_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 700,
            chunk_overlap: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionsConfig {
    #[serde(default)]
    pub eviction: EvictionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionConfig {
    pub enabled: bool,
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            idle_ttl_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

impl AppConfig {
    /// Loads configuration from disk, falling back to defaults when no
    /// file exists.
    pub fn load(paths: &AppPaths) -> Self {
        let path = config_path(paths);
        match fs::read_to_string(&path) {
            Ok(raw) => match serde_yaml::from_str::<AppConfig>(&raw) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(
                        "Failed to parse {}: {}; using defaults",
                        path.display(),
                        err
                    );
                    AppConfig::default()
                }
            },
            Err(_) => AppConfig::default(),
        }
    }
}

fn config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("ADMITFLOW_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let user_config = paths.user_data_dir.join("config.yml");
    if user_config.exists() {
        return user_config;
    }

    paths.project_root.join("config.yml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_runnable() {
        let config = AppConfig::default();
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.max_passages, 5);
        assert_eq!(config.extractor, ExtractorStrategy::Pattern);
        assert!(!config.sessions.eviction.enabled);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let raw = "institution:\n  name: Crestwood College\n  bot_name: Crestwood Bot\nextractor: model\n";
        let config: AppConfig = serde_yaml::from_str(raw).expect("parse");
        assert_eq!(config.institution.name, "Crestwood College");
        assert_eq!(config.extractor, ExtractorStrategy::Model);
        assert_eq!(config.llm.request_timeout_secs, 30);
        assert_eq!(config.server.port, 3000);
    }
}
