//! LLM provider implementations for Folio.
//!
//! All providers implement the `folio_core::Provider` trait.
//! The router builds them from configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
