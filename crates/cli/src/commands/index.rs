//! `folio index`: build the document index and write its snapshot.

use std::path::Path;

use folio_index::IndexError;

use super::{CliResult, build_components, load_config, require_api_key};

pub async fn run(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    if config.indexing.uses_embeddings() {
        require_api_key(&config)?;
    }

    let (_, indexer) = build_components(&config)?;

    let chunks = match indexer.build().await {
        Ok(n) => n,
        Err(IndexError::MissingDocumentsDir(dir)) => {
            return Err(format!(
                "Documents directory {} does not exist. Run `folio init` first.",
                dir.display()
            )
            .into());
        }
        Err(e) => return Err(e.into()),
    };
    indexer.save().await?;

    let mode = if config.indexing.uses_embeddings() {
        format!("embeddings ({})", config.indexing.embedding_model)
    } else {
        "keyword".to_string()
    };
    println!("Indexed {chunks} chunks from {}", config.indexing.documents_dir.display());
    println!("  Scoring:  {mode}");
    println!("  Snapshot: {}", config.index_path().display());

    Ok(())
}
