//! `folio init`: scaffold the data directories and config file.

use std::path::{Path, PathBuf};

use folio_config::{AppConfig, DEFAULT_CONFIG_FILE};

use super::{CliResult, load_config};

pub fn run(config_path: Option<&Path>) -> CliResult<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = load_config(Some(path.as_path()))?;

    println!("Folio: setup");
    println!("=============\n");

    for dir in [&config.indexing.documents_dir, &config.indexing.embeddings_dir] {
        if dir.exists() {
            println!("  Directory exists: {}", dir.display());
        } else {
            std::fs::create_dir_all(dir)?;
            println!("  Created {}", dir.display());
        }
    }

    if path.exists() {
        println!("  Config already exists at: {}", path.display());
    } else {
        std::fs::write(&path, AppConfig::default_toml())?;
        println!("  Created {}", path.display());
    }

    println!("\nNext steps:");
    println!("  1. Put your portfolio documents (.txt, .md) in {}", config.indexing.documents_dir.display());
    println!("  2. Export OPENAI_API_KEY (or set api_key in {})", path.display());
    println!("  3. Run `folio index`, then `folio ask` or `folio serve`\n");

    Ok(())
}
