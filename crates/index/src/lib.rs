//! Document index for Folio.
//!
//! Turns a directory of documents into a table of text chunks and serves
//! relevance-ranked passages through the [`folio_core::Retriever`] trait.
//!
//! Pipeline: [`loader`] reads files → [`chunker`] splits them into
//! overlapping windows → the provider embeds each chunk (optional) →
//! [`store`] snapshots the table as JSON lines → [`vector`] ranks chunks
//! against a query at retrieval time.

pub mod chunker;
pub mod error;
pub mod indexer;
pub mod loader;
pub mod store;
pub mod vector;

pub use chunker::chunk_text;
pub use error::IndexError;
pub use indexer::{Chunk, DocumentIndexer, IndexSettings};
pub use loader::{Document, load_documents};
pub use vector::{cosine_similarity, keyword_score};
