//! Storage manifest loading.
//!
//! The manifest is read from a local path. When that file does not exist
//! yet it is first obtained through a [`Retriever`], which may satisfy the
//! request from its cache.

use super::error::{FileTreeError, Result};
use super::node::FileTreeNode;
use crate::artefact::download::Retriever;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Location of the storage manifest on the public server.
pub const FILETREE_URL: &str = "https://storage.openvinotoolkit.org/filetree.json";

/// Default local file name for the manifest.
pub const FILETREE_FILE_NAME: &str = "filetree.json";

/// Load the manifest at `path`, fetching [`FILETREE_URL`] if it is absent.
///
/// # Errors
///
/// Returns [`FileTreeError::ManifestUnavailable`] if the manifest cannot be
/// fetched, read, or parsed.
pub fn load_filetree(path: &Path, retriever: &dyn Retriever) -> Result<FileTreeNode> {
    load_filetree_from(FILETREE_URL, path, retriever)
}

/// Load the manifest at `path`, fetching it from `url` if it is absent.
///
/// # Errors
///
/// Returns [`FileTreeError::ManifestUnavailable`] if the manifest cannot be
/// fetched, read, or parsed.
pub fn load_filetree_from(url: &str, path: &Path, retriever: &dyn Retriever) -> Result<FileTreeNode> {
    if path.exists() {
        debug!("using manifest already present at {}", path.display());
    } else {
        let fetched = retriever
            .fetch_or_cache_hit(url, path)
            .map_err(|e| unavailable(path, &e))?;
        debug!("manifest retrieved to {}", fetched.display());
    }

    let file = File::open(path).map_err(|e| unavailable(path, &e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| unavailable(path, &e))
}

/// Parse an in-memory manifest document.
///
/// # Errors
///
/// Returns [`FileTreeError::ManifestUnavailable`] if the JSON is malformed.
///
/// # Examples
///
/// ```
/// use openvino_installer::filetree::parse_filetree;
///
/// let tree = parse_filetree(r#"{"name":"production","type":"directory","children":[]}"#)
///     .expect("valid manifest");
/// assert_eq!(tree.name, "production");
/// assert!(parse_filetree("{not json").is_err());
/// ```
pub fn parse_filetree(json: &str) -> Result<FileTreeNode> {
    serde_json::from_str(json).map_err(|e| FileTreeError::ManifestUnavailable {
        path: "<memory>".to_owned(),
        reason: e.to_string(),
    })
}

fn unavailable(path: &Path, err: &dyn std::fmt::Display) -> FileTreeError {
    FileTreeError::ManifestUnavailable {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
