//! # Folio Core
//!
//! Domain types, collaborator traits, and error definitions for the Folio
//! portfolio RAG agent. No framework dependencies live here: the HTTP client,
//! the document index and the gateway all implement against these types.
//!
//! Two traits mark the boundary to the outside world:
//! - [`Provider`]: an LLM chat/embeddings backend
//! - [`Retriever`]: a ranked passage source for a query

pub mod error;
pub mod message;
pub mod provider;
pub mod retriever;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, RetrievalError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retriever::{Passage, Retriever};
