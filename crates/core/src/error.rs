//! Error types for the Folio domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator boundary has its own error enum.

use thiserror::Error;

/// Failures of the LLM backend.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the passage retriever.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    /// `retrieve` was called before the index was built or loaded.
    #[error("Index not initialized")]
    NotInitialized,

    #[error("Query embedding failed: {0}")]
    Embedding(String),

    #[error("Index storage error: {0}")]
    Storage(String),
}
