//! `folio serve`: start the HTTP API server.

use std::path::Path;
use std::sync::Arc;

use folio_agent::PortfolioAgent;

use super::{CliResult, build_components, load_config, require_api_key};

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    require_api_key(&config)?;

    let (provider, indexer) = build_components(&config)?;
    let chunks = indexer.load_or_build().await?;
    let agent = Arc::new(PortfolioAgent::from_config(&config, provider, indexer.clone()));

    println!("Folio Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.default_model);
    println!("   Index:     {chunks} chunks");

    folio_gateway::start(&config, agent, indexer).await
}
