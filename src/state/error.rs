use thiserror::Error;

use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("failed to initialize lead database: {0}")]
    Database(ApiError),
    #[error("failed to initialize knowledge index: {0}")]
    Knowledge(ApiError),
    #[error("failed to initialize llm provider: {0}")]
    Llm(ApiError),
}
