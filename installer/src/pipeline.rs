//! Archive installation pipeline orchestration.
//!
//! This module coordinates manifest loading, URL resolution, cached
//! download, and extraction into a complete archive installation.

use crate::artefact::download::{DownloadError, Retriever, file_name_from_url};
use crate::artefact::extraction::{ArtefactExtractor, ExtractionError, archive_stem};
use crate::config::Settings;
use crate::error::Result;
use crate::filetree::{FileTreeNode, UrlResolver, load_filetree_from};
use crate::output::write_stderr_line;
use crate::target::Target;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;

/// Context for an archive installation run.
pub struct PipelineContext<'a> {
    /// Effective storage settings.
    pub settings: &'a Settings,
    /// Cache-aware retrieval for the manifest and the archive.
    pub retriever: &'a dyn Retriever,
    /// Archive extraction.
    pub extractor: &'a dyn ArtefactExtractor,
    /// Suppress progress output.
    pub quiet: bool,
}

/// Outcome of a successful archive installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArchive {
    /// The URL the archive was resolved to.
    pub url: String,
    /// Local path of the downloaded archive.
    pub archive: PathBuf,
    /// Directory the archive unpacked into.
    pub install_dir: PathBuf,
    /// Number of extracted entries.
    pub entries: usize,
}

/// Load the storage manifest into the download directory.
///
/// # Errors
///
/// Returns an error if the manifest is unavailable.
pub fn load_manifest(settings: &Settings, retriever: &dyn Retriever) -> Result<FileTreeNode> {
    std::fs::create_dir_all(&settings.download_dir)?;
    let tree = load_filetree_from(&settings.manifest_url(), &settings.manifest_path(), retriever)?;
    Ok(tree)
}

/// Resolve the archive URL for `target` against the configured storage.
///
/// # Errors
///
/// Returns an error if the manifest is unavailable or resolution fails.
pub fn resolve_download_url(
    settings: &Settings,
    retriever: &dyn Retriever,
    target: &Target,
) -> Result<String> {
    let tree = load_manifest(settings, retriever)?;
    let url = UrlResolver::new(settings.storage_url.as_str()).resolve(&tree, &target.request())?;
    info!("url: {url}");
    Ok(url)
}

/// Download and extract the archive for `target`.
///
/// Prints progress to stderr if not in quiet mode.
///
/// # Errors
///
/// Returns an error if resolution, download, or extraction fails.
pub fn install_archive(
    context: &PipelineContext<'_>,
    target: &Target,
    stderr: &mut dyn Write,
) -> Result<InstalledArchive> {
    let settings = context.settings;
    let url = resolve_download_url(settings, context.retriever, target)?;
    let file_name = file_name_from_url(&url).ok_or_else(|| DownloadError::MissingFileName {
        url: url.clone(),
    })?;
    let archive = settings.download_dir.join(file_name);

    if !context.quiet {
        write_stderr_line(stderr, format!("Downloading {url}..."));
    }
    let archive = context.retriever.fetch_or_cache_hit(&url, &archive)?;

    if !context.quiet {
        write_stderr_line(stderr, format!("Extracting {}...", archive.display()));
    }
    let entries = context
        .extractor
        .extract(&archive, &settings.download_dir)?;

    let stem = archive_stem(&archive).ok_or_else(|| ExtractionError::UnsupportedFormat {
        path: archive.display().to_string(),
    })?;
    let install_dir = settings.download_dir.join(stem);
    if !install_dir.is_dir() {
        warn!(
            "archive did not unpack into {}; OPENVINO_INSTALL_DIR may be wrong",
            install_dir.display()
        );
    }

    Ok(InstalledArchive {
        url,
        archive,
        install_dir,
        entries: entries.len(),
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
