mod paths;
mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, EvictionConfig, ExtractorStrategy, IngestConfig, InstitutionConfig, LlmConfig,
    RetrievalConfig, ServerConfig, SessionsConfig,
};
