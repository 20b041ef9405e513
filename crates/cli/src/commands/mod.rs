pub mod ask;
pub mod index;
pub mod init;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use folio_config::AppConfig;
use folio_core::Provider;
use folio_index::{DocumentIndexer, IndexSettings};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Hosted providers that refuse requests without a key.
const KEYED_PROVIDERS: [&str; 4] = ["openai", "openrouter", "groq", "together"];

pub fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}").into())
}

/// Fail early with setup instructions when a hosted provider has no key.
pub fn require_api_key(config: &AppConfig) -> CliResult<()> {
    if config.has_api_key() || !KEYED_PROVIDERS.contains(&config.default_provider.as_str()) {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured for '{}'!", config.default_provider);
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    FOLIO_API_KEY=sk-...        (generic)");
    eprintln!("    OPENAI_API_KEY=sk-...       (OpenAI)");
    eprintln!("    OPENROUTER_API_KEY=sk-or-.. (OpenRouter)");
    eprintln!();
    eprintln!("  Or set `api_key` in folio.toml.");
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// The configured chat provider and a document indexer embedding through it.
pub fn build_components(config: &AppConfig) -> CliResult<(Arc<dyn Provider>, Arc<DocumentIndexer>)> {
    let router = folio_providers::build_from_config(config)?;
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not configured", config.default_provider))?;

    let indexer = Arc::new(DocumentIndexer::new(
        IndexSettings::from_config(config),
        Some(provider.clone()),
    ));
    Ok((provider, indexer))
}
