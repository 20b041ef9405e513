//! JSON-lines snapshot of the chunk table.
//!
//! Each line is one `serde_json`-encoded [`Chunk`]. The file is human
//! inspectable and rewritten wholesale on every save.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::IndexError;
use crate::indexer::Chunk;

/// Write all chunks to `path`, creating parent directories as needed.
///
/// Writes to a sibling temp file first and renames it into place, so a
/// crash mid-write never leaves a truncated snapshot.
pub fn save(path: &Path, chunks: &[Chunk]) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            IndexError::Snapshot(format!("Failed to create index directory: {e}"))
        })?;
    }

    let mut content = String::new();
    for chunk in chunks {
        let line = serde_json::to_string(chunk)
            .map_err(|e| IndexError::Snapshot(format!("Failed to serialize chunk: {e}")))?;
        content.push_str(&line);
        content.push('\n');
    }

    let tmp = path.with_extension("jsonl.tmp");
    std::fs::write(&tmp, &content)
        .map_err(|e| IndexError::Snapshot(format!("Failed to write index file: {e}")))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| IndexError::Snapshot(format!("Failed to move index file into place: {e}")))?;

    debug!(path = %path.display(), chunks = chunks.len(), "Index snapshot saved");
    Ok(())
}

/// Load chunks from `path`. Returns `Ok(None)` when the file does not exist.
///
/// Corrupted lines are skipped with a warning.
pub fn load(path: &Path) -> Result<Option<Vec<Chunk>>, IndexError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(IndexError::Snapshot(format!(
                "Failed to read {}: {e}",
                path.display()
            )));
        }
    };

    let chunks: Vec<Chunk> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<Chunk>(line) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                warn!(error = %e, "Skipping corrupted index entry");
                None
            }
        })
        .collect();

    debug!(path = %path.display(), chunks = chunks.len(), "Index snapshot loaded");
    Ok(Some(chunks))
}
