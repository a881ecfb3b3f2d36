//! Plain-text document loader.
//!
//! Walks a directory tree for `.txt` files and turns each one into a
//! [`Document`] tagged with `source_type` and `filename` metadata.
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Document;

pub const SOURCE_TYPE_KEY: &str = "source_type";
pub const FILENAME_KEY: &str = "filename";

/// Load every `.txt` file under `root`, in sorted path order.
pub fn load_text_files(root: &Path, source_type: &str) -> Result<Vec<Document>> {
    load_text_files_limited(root, source_type, usize::MAX)
}

/// Like [`load_text_files`] but stops after `limit` files.
pub fn load_text_files_limited(root: &Path, source_type: &str, limit: usize) -> Result<Vec<Document>> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!("data directory {}", root.display())));
    }
    let mut files = list_txt_files(root);
    if files.len() > limit {
        tracing::info!(limit, total = files.len(), "limiting loaded files");
        files.truncate(limit);
    }

    let mut docs = Vec::with_capacity(files.len());
    for path in files {
        let text = match read_file_content(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
                continue;
            }
        };
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        docs.push(
            Document::new(path.to_string_lossy(), text)
                .with_meta(SOURCE_TYPE_KEY, source_type)
                .with_meta(FILENAME_KEY, filename),
        );
    }
    tracing::debug!(root = %root.display(), documents = docs.len(), "loaded text files");
    Ok(docs)
}

fn read_file_content(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
            Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned())
        }
        Err(err) => Err(err.into()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    txt_files.sort();
    txt_files
}
