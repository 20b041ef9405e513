//! The document indexer: builds, persists and queries the chunk table.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use folio_core::error::RetrievalError;
use folio_core::provider::{EmbeddingRequest, Provider};
use folio_core::retriever::{Passage, Retriever};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::chunker::chunk_text;
use crate::error::IndexError;
use crate::loader::load_documents;
use crate::{store, vector};

/// Texts sent per embedding request.
const EMBED_BATCH_SIZE: usize = 64;

/// One indexed slice of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `"{source}#{index}"`
    pub id: String,
    /// Document path relative to the documents directory
    pub source: String,
    /// Position of this chunk within its document
    pub index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Everything the indexer needs from configuration.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub documents_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub extensions: Vec<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// `None` selects keyword scoring.
    pub embedding_model: Option<String>,
    pub top_k: usize,
    pub min_score: f32,
}

impl IndexSettings {
    pub fn from_config(config: &folio_config::AppConfig) -> Self {
        Self {
            documents_dir: config.indexing.documents_dir.clone(),
            snapshot_path: config.index_path(),
            extensions: config.indexing.extensions.clone(),
            chunk_size: config.indexing.chunk_size,
            chunk_overlap: config.indexing.chunk_overlap,
            embedding_model: config
                .indexing
                .uses_embeddings()
                .then(|| config.indexing.embedding_model.clone()),
            top_k: config.retrieval.top_k,
            min_score: config.retrieval.min_score,
        }
    }
}

/// A brute-force passage index over a directory of documents.
///
/// Starts uninitialized; [`build`](Self::build) or [`load`](Self::load) must
/// succeed before [`Retriever::retrieve`] is called.
pub struct DocumentIndexer {
    settings: IndexSettings,
    provider: Option<Arc<dyn Provider>>,
    chunks: RwLock<Option<Arc<Vec<Chunk>>>>,
}

impl DocumentIndexer {
    /// `provider` is only used for embeddings; pass `None` for a keyword index.
    pub fn new(settings: IndexSettings, provider: Option<Arc<dyn Provider>>) -> Self {
        Self {
            settings,
            provider,
            chunks: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub async fn is_initialized(&self) -> bool {
        self.chunks.read().await.is_some()
    }

    /// Number of indexed chunks (0 when uninitialized).
    pub async fn len(&self) -> usize {
        self.chunks.read().await.as_ref().map_or(0, |c| c.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The provider and model to embed with, if embeddings are enabled.
    fn embedder(&self) -> Option<(&Arc<dyn Provider>, &str)> {
        match (&self.provider, &self.settings.embedding_model) {
            (Some(p), Some(model)) => Some((p, model.as_str())),
            _ => None,
        }
    }

    /// Load, chunk and (optionally) embed every document, replacing the
    /// current table. Returns the number of chunks.
    pub async fn build(&self) -> Result<usize, IndexError> {
        let documents = load_documents(&self.settings.documents_dir, &self.settings.extensions)?;

        let mut chunks = Vec::new();
        for doc in &documents {
            for (index, text) in chunk_text(&doc.text, self.settings.chunk_size, self.settings.chunk_overlap)
                .into_iter()
                .enumerate()
            {
                chunks.push(Chunk {
                    id: format!("{}#{index}", doc.source),
                    source: doc.source.clone(),
                    index,
                    text,
                    embedding: None,
                });
            }
        }

        if let Some((provider, model)) = self.embedder() {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = embed_all(provider.as_ref(), model, texts).await?;
            for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                chunk.embedding = Some(embedding);
            }
        }

        let count = chunks.len();
        info!(
            documents = documents.len(),
            chunks = count,
            embedded = self.embedder().is_some(),
            "Index built"
        );

        *self.chunks.write().await = Some(Arc::new(chunks));
        Ok(count)
    }

    /// Write the current table to the snapshot file.
    pub async fn save(&self) -> Result<(), IndexError> {
        let chunks = self
            .chunks
            .read()
            .await
            .clone()
            .ok_or_else(|| IndexError::Snapshot("nothing to save: index not built".into()))?;
        store::save(&self.settings.snapshot_path, &chunks)
    }

    /// Replace the table with the snapshot on disk. Returns `false` if no
    /// snapshot exists (the index stays as it was).
    pub async fn load(&self) -> Result<bool, IndexError> {
        match store::load(&self.settings.snapshot_path)? {
            Some(chunks) => {
                info!(
                    path = %self.settings.snapshot_path.display(),
                    chunks = chunks.len(),
                    "Index loaded"
                );
                *self.chunks.write().await = Some(Arc::new(chunks));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Load the snapshot, or build and save a fresh index when none exists.
    pub async fn load_or_build(&self) -> Result<usize, IndexError> {
        if self.load().await? {
            return Ok(self.len().await);
        }
        let count = self.build().await?;
        self.save().await?;
        Ok(count)
    }
}

#[async_trait]
impl Retriever for DocumentIndexer {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, RetrievalError> {
        let chunks = self
            .chunks
            .read()
            .await
            .clone()
            .ok_or(RetrievalError::NotInitialized)?;

        let top_k = self.settings.top_k;
        let min_score = self.settings.min_score;
        let has_vectors = chunks.iter().any(|c| c.embedding.is_some());

        let passages = match self.embedder() {
            Some((provider, model)) if has_vectors => {
                let mut embeddings = embed_all(provider.as_ref(), model, vec![query.to_string()]).await?;
                let query_embedding = embeddings
                    .pop()
                    .ok_or_else(|| RetrievalError::Embedding("no vector for query".into()))?;
                vector::rank_by_embedding(&chunks, &query_embedding, top_k, min_score)
            }
            _ => vector::rank_by_keywords(&chunks, query, top_k, min_score),
        };

        debug!(query_len = query.len(), passages = passages.len(), "Passages retrieved");
        Ok(passages)
    }
}

async fn embed_all(
    provider: &dyn Provider,
    model: &str,
    texts: Vec<String>,
) -> Result<Vec<Vec<f32>>, IndexError> {
    let mut out = Vec::with_capacity(texts.len());

    for batch in texts.chunks(EMBED_BATCH_SIZE) {
        let response = provider
            .embed(EmbeddingRequest {
                model: model.to_string(),
                inputs: batch.to_vec(),
            })
            .await?;

        if response.embeddings.len() != batch.len() {
            return Err(IndexError::EmbeddingCount {
                expected: batch.len(),
                actual: response.embeddings.len(),
            });
        }
        out.extend(response.embeddings);
    }

    Ok(out)
}
