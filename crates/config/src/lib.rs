//! Configuration loading, validation, and management for Folio.
//!
//! Loads configuration from `./folio.toml` (or an explicit path) with
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

/// The root configuration structure.
///
/// Maps directly to `folio.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default chat model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Document loading, chunking and embedding
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Passage retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Prompt and history policy
    #[serde(default)]
    pub agent: AgentConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("indexing", &self.indexing)
            .field("retrieval", &self.retrieval)
            .field("agent", &self.agent)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Directory scanned for documents
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// Directory holding the index snapshot
    #[serde(default = "default_embeddings_dir")]
    pub embeddings_dir: PathBuf,

    /// Chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Embedding model. Empty disables embeddings (keyword scoring is used).
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// File extensions picked up from `documents_dir`
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("data/documents")
}
fn default_embeddings_dir() -> PathBuf {
    PathBuf::from("data/embeddings")
}
fn default_chunk_size() -> usize {
    512
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_extensions() -> Vec<String> {
    vec!["txt".into(), "md".into()]
}

impl IndexingConfig {
    /// Whether chunks and queries should be embedded.
    pub fn uses_embeddings(&self) -> bool {
        !self.embedding_model.trim().is_empty()
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            embeddings_dir: default_embeddings_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding_model: default_embedding_model(),
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum passages returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum relevance score for a passage to be returned
    #[serde(default)]
    pub min_score: f32,
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Messages kept in a conversation history (two per turn)
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Most recent history messages included in a prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Retrieved passages injected into the system prompt
    #[serde(default = "default_max_context_passages")]
    pub max_context_passages: usize,
}

fn default_history_capacity() -> usize {
    8
}
fn default_history_window() -> usize {
    6
}
fn default_max_context_passages() -> usize {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            history_window: default_history_window(),
            max_context_passages: default_max_context_passages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Upper bound on concurrently tracked conversation sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Origins allowed by CORS; empty disables the CORS layer
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_max_sessions() -> usize {
    1000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_sessions: default_max_sessions(),
            body_limit_bytes: default_body_limit(),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Request timeout in seconds (client default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from `path`, or from `./folio.toml` when `None`.
    ///
    /// Environment variables override the file:
    /// - `FOLIO_API_KEY` (highest priority), `OPENAI_API_KEY`, `OPENROUTER_API_KEY`
    /// - `FOLIO_PROVIDER`
    /// - `FOLIO_MODEL`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::load_from(&path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("FOLIO_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("FOLIO_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("FOLIO_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.indexing.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "indexing.chunk_size must be > 0".into(),
            ));
        }

        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            return Err(ConfigError::ValidationError(
                "indexing.chunk_overlap must be smaller than indexing.chunk_size".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }

        // Turns are stored as user/assistant pairs.
        if self.agent.history_capacity < 2 || self.agent.history_capacity % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_capacity must be an even number >= 2".into(),
            ));
        }

        if self.agent.history_window % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_window must be an even number".into(),
            ));
        }

        if self.agent.history_window > self.agent.history_capacity {
            return Err(ConfigError::ValidationError(
                "agent.history_window must not exceed agent.history_capacity".into(),
            ));
        }

        if self.agent.max_context_passages == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_context_passages must be > 0".into(),
            ));
        }

        if let Some((name, _)) = self
            .providers
            .iter()
            .find(|(_, p)| p.timeout_secs == Some(0))
        {
            return Err(ConfigError::ValidationError(format!(
                "providers.{name}.timeout_secs must be > 0"
            )));
        }

        if self.gateway.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_sessions must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Path of the index snapshot file.
    pub fn index_path(&self) -> PathBuf {
        self.indexing.embeddings_dir.join("index.jsonl")
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            indexing: IndexingConfig::default(),
            retrieval: RetrievalConfig::default(),
            agent: AgentConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
