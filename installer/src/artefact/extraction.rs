//! Archive extraction for downloaded OpenVINO packages.
//!
//! Linux and macOS packages ship as gzip-compressed tarballs, Windows
//! packages as zip files. Both are extracted with path traversal protection
//! to prevent zip-slip attacks.

use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

/// Trait for extracting artefact archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use openvino_installer::artefact::extraction::ArchiveExtractor;
///
/// let extractor = ArchiveExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the paths of the extracted entries relative to `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory.
    /// Returns [`ExtractionError::EmptyArchive`] if no entries are found.
    /// Returns [`ExtractionError::UnsupportedFormat`] for unknown extensions.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container could not be read.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no entries.
    #[error("archive contains no files")]
    EmptyArchive,

    /// The file extension does not name a supported archive format.
    #[error("unsupported archive format: {path}; expected .tgz, .tar.gz, or .zip")]
    UnsupportedFormat {
        /// The archive path that was rejected.
        path: String,
    },
}

/// Archive formats published on the storage server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// A gzip-compressed tarball (`.tgz` or `.tar.gz`).
    TarGz,
    /// A zip file.
    Zip,
}

/// Recognized extensions, longest first so `.tar.gz` wins over `.gz`.
const EXTENSIONS: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".zip", ArchiveFormat::Zip),
];

impl ArchiveFormat {
    /// Detect the format from the archive's file name.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedFormat`] when the extension is
    /// not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use openvino_installer::artefact::extraction::ArchiveFormat;
    ///
    /// let format = ArchiveFormat::from_path(Path::new("w_openvino_toolkit_x86_64.zip"))
    ///     .expect("zip");
    /// assert_eq!(format, ArchiveFormat::Zip);
    /// ```
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        split_extension(path)
            .map(|(_, format)| format)
            .ok_or_else(|| ExtractionError::UnsupportedFormat {
                path: path.display().to_string(),
            })
    }
}

/// Return the archive file name without its archive extension.
///
/// Packages unpack into a directory of this name.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use openvino_installer::artefact::extraction::archive_stem;
///
/// let stem = archive_stem(Path::new("/tmp/l_openvino_toolkit_ubuntu20_2022.3.0_x86_64.tgz"));
/// assert_eq!(stem.as_deref(), Some("l_openvino_toolkit_ubuntu20_2022.3.0_x86_64"));
/// ```
#[must_use]
pub fn archive_stem(path: &Path) -> Option<String> {
    split_extension(path).map(|(stem, _)| stem.to_owned())
}

fn split_extension(path: &Path) -> Option<(&str, ArchiveFormat)> {
    let name = path.file_name()?.to_str()?;
    EXTENSIONS.iter().find_map(|(extension, format)| {
        name.strip_suffix(extension)
            .filter(|stem| !stem.is_empty())
            .map(|stem| (stem, *format))
    })
}

/// Default extractor dispatching on [`ArchiveFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExtractor;

impl ArtefactExtractor for ArchiveExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let format = ArchiveFormat::from_path(archive_path)?;
        debug!(
            "decompressing {} ({format:?}) into {}",
            archive_path.display(),
            dest_dir.display()
        );
        std::fs::create_dir_all(dest_dir)?;
        let extracted = match format {
            ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir)?,
            ArchiveFormat::Zip => extract_zip(archive_path, dest_dir)?,
        };

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }
        Ok(extracted)
    }
}

fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let file = File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);
    let root = dest_dir.canonicalize()?;
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;
        ensure_parent_inside(&root, &entry_path)?;

        // `unpack_in` creates parents and re-checks them against `dest_dir`.
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }
        extracted.push(entry_path.to_string_lossy().into_owned());
    }

    Ok(extracted)
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    let root = dest_dir.canonicalize()?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let entry_path = PathBuf::from(entry.name());
        validate_entry_path(&entry_path)?;
        ensure_parent_inside(&root, &entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&dest_path)?;
            std::io::copy(&mut entry, &mut out)?;
        }
        extracted.push(entry_path.to_string_lossy().into_owned());
    }

    Ok(extracted)
}

/// Validate that an entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Reject an entry whose parent directory already exists but resolves
/// outside `root`, as it does when an earlier entry planted a symlink.
///
/// Symlinks that stay inside `root`, like shared library version chains,
/// are accepted.
fn ensure_parent_inside(root: &Path, entry_path: &Path) -> Result<(), ExtractionError> {
    let mut current = root.to_path_buf();
    let parents = entry_path
        .parent()
        .into_iter()
        .flat_map(|parent| parent.components());
    for component in parents {
        current.push(component);
        let Ok(resolved) = current.canonicalize() else {
            break;
        };
        if !resolved.starts_with(root) {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }
    }
    Ok(())
}
