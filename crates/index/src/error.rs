use std::path::PathBuf;

use folio_core::error::{ProviderError, RetrievalError};
use thiserror::Error;

/// Errors raised while building, saving or loading the index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Documents directory not found: {0}")]
    MissingDocumentsDir(PathBuf),

    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Embedding count mismatch: sent {expected} texts, got {actual} vectors")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("Index snapshot error: {0}")]
    Snapshot(String),
}

impl From<IndexError> for RetrievalError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Embedding(e) => RetrievalError::Embedding(e.to_string()),
            count @ IndexError::EmbeddingCount { .. } => RetrievalError::Embedding(count.to_string()),
            other => RetrievalError::Storage(other.to_string()),
        }
    }
}
