use folio_core::error::{ProviderError, RetrievalError};
use thiserror::Error;

/// Why a question could not be answered.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Query must not be empty")]
    EmptyQuery,

    /// The document index has not been built or loaded yet.
    #[error("Index not initialized")]
    NotInitialized,

    /// Retrieval or the chat call failed.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl From<RetrievalError> for AgentError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::NotInitialized => AgentError::NotInitialized,
            other => AgentError::GenerationFailed(other.to_string()),
        }
    }
}

impl From<ProviderError> for AgentError {
    fn from(err: ProviderError) -> Self {
        AgentError::GenerationFailed(err.to_string())
    }
}
