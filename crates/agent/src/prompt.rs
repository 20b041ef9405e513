//! Prompt assembly: turns a query, retrieved passages and recent history
//! into the message list sent to the model.
//!
//! The assembled sequence always has the shape
//!
//! ```text
//! [system(rules + context + query), ..recent history.., user(query)]
//! ```

use folio_core::message::Message;
use folio_core::retriever::Passage;

use crate::history::ConversationHistory;

/// What the model must answer when the context does not cover the question.
pub const FALLBACK_RESPONSE: &str = "I don't have information about that in your portfolio documents";

/// What the model must answer when the question is outside the portfolio domain.
pub const OFF_TOPIC_RESPONSE: &str = "I specialize only in portfolio analysis based on your documents";

/// Stable prefix of [`FALLBACK_RESPONSE`] used to recognise it in replies.
pub const FALLBACK_MARKER: &str = "I don't have information";

/// Stable prefix of [`OFF_TOPIC_RESPONSE`] used to recognise it in replies.
pub const OFF_TOPIC_MARKER: &str = "I specialize only";

/// Context text used when retrieval returned nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No relevant documents found";

pub const DEFAULT_HISTORY_WINDOW: usize = 6;
pub const DEFAULT_MAX_PASSAGES: usize = 3;

/// Builds the chat message list for one turn.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    history_window: usize,
    max_passages: usize,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_PASSAGES)
    }
}

impl PromptAssembler {
    pub fn new(history_window: usize, max_passages: usize) -> Self {
        Self {
            history_window,
            max_passages,
        }
    }

    pub fn from_config(config: &folio_config::AgentConfig) -> Self {
        Self::new(config.history_window, config.max_context_passages)
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    pub fn max_passages(&self) -> usize {
        self.max_passages
    }

    /// Assemble the messages for `query`.
    ///
    /// Only the first `max_passages` passages are injected. An empty
    /// context becomes [`NO_CONTEXT_PLACEHOLDER`].
    pub fn assemble(
        &self,
        query: &str,
        context: &[Passage],
        history: &ConversationHistory,
    ) -> Vec<Message> {
        let recent = history.recent(self.history_window);

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(Message::system(self.system_prompt(query, context)));
        messages.extend(recent);
        messages.push(Message::user(query));
        messages
    }

    /// The system message text: role, rules, context and the question.
    pub fn system_prompt(&self, query: &str, context: &[Passage]) -> String {
        format!(
            "You are a Portfolio Analysis Specialist.\n\
             Domain: Financial documents provided by user.\n\
             \n\
             Rules:\n\
             1. Answer ONLY using information from the context below.\n\
             2. If the context does not contain the answer, respond exactly: \"{FALLBACK_RESPONSE}.\"\n\
             3. If the question is not about the user's portfolio or documents, respond exactly: \"{OFF_TOPIC_RESPONSE}.\"\n\
             4. Never speculate or add facts that are not in the context.\n\
             5. Cite the exact excerpts from the context that support your answer.\n\
             6. Do not make predictions or give investment advice.\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             Question: {query}",
            context = self.render_context(context),
        )
    }

    fn render_context(&self, context: &[Passage]) -> String {
        let used = &context[..context.len().min(self.max_passages)];
        if used.is_empty() {
            return NO_CONTEXT_PLACEHOLDER.to_string();
        }
        used.iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
