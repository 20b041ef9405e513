//! Folio CLI: the main entry point.
//!
//! Commands:
//! - `init`  : Create the data directories and a default `folio.toml`
//! - `index` : Build the document index and save its snapshot
//! - `ask`   : Ask one question, or chat interactively
//! - `serve` : Start the HTTP gateway

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: answers questions about your portfolio documents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ./folio.toml)
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create data directories and a default config file
    Init,

    /// Load, chunk and embed documents, then save the index
    Index,

    /// Ask about your portfolio documents
    Ask {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init => commands::init::run(config_path)?,
        Commands::Index => commands::index::run(config_path).await?,
        Commands::Ask { message } => commands::ask::run(config_path, message).await?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
    }

    Ok(())
}
