//! The portfolio question-answering facade.
//!
//! # Flow
//!
//! 1. Retrieve passages for the query
//! 2. Assemble system prompt, recent history and the query
//! 3. Ask the model
//! 4. Record the turn (refusals are filtered out)
//! 5. Return the reply verbatim
//!
//! History is only touched after a reply has been obtained, so a failed
//! call leaves it exactly as it was.

use std::sync::Arc;

use folio_core::provider::{Provider, ProviderRequest};
use folio_core::retriever::Retriever;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::history::{ConversationHistory, DEFAULT_HISTORY_CAPACITY};
use crate::prompt::PromptAssembler;

/// Answers questions about the user's documents.
///
/// Holds no conversation state; each caller owns its
/// [`ConversationHistory`] and passes it in.
pub struct PortfolioAgent {
    provider: Arc<dyn Provider>,
    retriever: Arc<dyn Retriever>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    assembler: PromptAssembler,
    history_capacity: usize,
}

impl PortfolioAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        retriever: Arc<dyn Retriever>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            retriever,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            assembler: PromptAssembler::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Build an agent with the model, sampling and prompt settings from `config`.
    pub fn from_config(
        config: &folio_config::AppConfig,
        provider: Arc<dyn Provider>,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        Self::new(provider, retriever, config.default_model.clone())
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_assembler(PromptAssembler::from_config(&config.agent))
            .with_history_capacity(config.agent.history_capacity)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// An empty history sized by this agent's configuration.
    pub fn new_history(&self) -> ConversationHistory {
        ConversationHistory::with_capacity(self.history_capacity)
    }

    /// Answer `query` in the conversation `history`.
    pub async fn handle_query(
        &self,
        query: &str,
        history: &mut ConversationHistory,
    ) -> Result<String, AgentError> {
        if query.trim().is_empty() {
            return Err(AgentError::EmptyQuery);
        }

        let context = self.retriever.retrieve(query).await.map_err(|e| {
            warn!(error = %e, "Retrieval failed");
            AgentError::from(e)
        })?;
        debug!(passages = context.len(), "Context retrieved");

        let messages = self.assembler.assemble(query, &context, history);
        debug!(messages = messages.len(), "Prompt assembled");

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.provider.complete(request).await.map_err(|e| {
            warn!(provider = self.provider.name(), error = %e, "Chat completion failed");
            AgentError::from(e)
        })?;
        let answer = response.message.content().to_string();

        let recorded = history.append_turn(query, &answer);
        info!(
            model = %response.model,
            passages = context.len(),
            answer_len = answer.len(),
            recorded,
            history_len = history.len(),
            "Query answered"
        );

        Ok(answer)
    }
}
