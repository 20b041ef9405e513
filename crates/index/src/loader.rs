//! Directory loader: reads every matching text file under a root directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::IndexError;

/// A loaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path relative to the documents root, `/`-separated
    pub source: String,
    pub text: String,
}

/// Recursively load documents whose extension is in `extensions`
/// (case-insensitive, without the dot).
///
/// Results are sorted by source path so index builds are deterministic.
/// Symlinked directories are not descended into; symlinked files are read.
/// Files that are not valid UTF-8 are skipped with a warning. Empty files
/// are skipped silently.
pub fn load_documents(root: &Path, extensions: &[String]) -> Result<Vec<Document>, IndexError> {
    if !root.is_dir() {
        return Err(IndexError::MissingDocumentsDir(root.to_path_buf()));
    }

    let mut files = collect_files(root, extensions);
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let bytes = std::fs::read(&path).map_err(|e| IndexError::Read {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let text = match String::from_utf8(bytes) {
            Ok(t) => t,
            Err(_) => {
                warn!(path = %path.display(), "Skipping non UTF-8 document");
                continue;
            }
        };

        if text.trim().is_empty() {
            continue;
        }

        documents.push(Document {
            source: relative_source(root, &path),
            text,
        });
    }

    debug!(root = %root.display(), count = documents.len(), "Documents loaded");
    Ok(documents)
}

fn collect_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        // `is_file` follows file symlinks; directory symlinks are never walked.
        let path = entry.path();
        if path.is_file() && has_extension(path, extensions) {
            files.push(entry.into_path());
        }
    }
    files
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

fn relative_source(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
