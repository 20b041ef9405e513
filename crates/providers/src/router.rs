//! Provider router: builds LLM providers from config and selects the default.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use folio_core::error::ProviderError;
use folio_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

/// Holds the configured providers, keyed by name.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` table becomes an OpenAI-compatible provider; the
/// default provider is added even when it has no table of its own. Providers
/// without a well-known base URL must set `api_url`.
pub fn build_from_config(config: &folio_config::AppConfig) -> Result<ProviderRouter, ProviderError> {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = match &provider_config.api_url {
            Some(url) => url.clone(),
            None => default_base_url(name)
                .ok_or_else(|| {
                    ProviderError::NotConfigured(format!(
                        "provider '{name}' has no api_url and no known default"
                    ))
                })?
                .to_string(),
        };

        let mut provider = OpenAiCompatProvider::new(name, base_url, api_key);
        if let Some(secs) = provider_config.timeout_secs {
            provider = provider.with_timeout(Duration::from_secs(secs));
        }
        router.register(name.clone(), Arc::new(provider));
    }

    if router.get(&config.default_provider).is_none() {
        let name = &config.default_provider;
        let base_url = default_base_url(name).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "default provider '{name}' needs a [providers.{name}] table with api_url"
            ))
        })?;
        let api_key = config.api_key.clone().unwrap_or_default();

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)),
        );
    }

    Ok(router)
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "together" => Some("https://api.together.xyz/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" | "llama.cpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
}
