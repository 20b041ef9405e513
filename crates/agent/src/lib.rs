//! The portfolio agent: everything between a user's question and the
//! model's answer.
//!
//! - [`history`] keeps the bounded, refusal-filtered turn log
//! - [`prompt`] builds the system prompt and message list
//! - [`portfolio`] ties retrieval, prompting and the chat call together

pub mod error;
pub mod history;
pub mod portfolio;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::AgentError;
pub use history::ConversationHistory;
pub use portfolio::PortfolioAgent;
pub use prompt::{FALLBACK_RESPONSE, NO_CONTEXT_PLACEHOLDER, OFF_TOPIC_RESPONSE, PromptAssembler};
