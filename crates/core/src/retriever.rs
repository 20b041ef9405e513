//! Retriever trait: ranked passage lookup for a query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A passage of document text returned for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// The passage text
    pub text: String,

    /// Where it came from (document path relative to the documents directory)
    pub source: String,

    /// Relevance score; higher is better
    #[serde(default)]
    pub score: f32,
}

impl Passage {
    pub fn new(text: impl Into<String>, source: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            score,
        }
    }
}

/// A source of relevance-ranked passages.
///
/// Results are ordered by descending relevance and bounded by the
/// implementation's configured top-k. An empty result is not an error.
/// Calling `retrieve` before the backing index exists must fail with
/// [`RetrievalError::NotInitialized`].
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, RetrievalError>;
}
