//! Error types for the OpenVINO installer CLI.
//!
//! Each stage of an installation has its own error enum; this module
//! aggregates them into [`InstallerError`] so the binary can report any
//! failure uniformly.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use crate::environment::EnvironmentError;
use crate::filetree::FileTreeError;
use thiserror::Error;

/// Errors that can occur while resolving or installing OpenVINO.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The storage manifest could not be loaded or resolved.
    #[error(transparent)]
    FileTree(#[from] FileTreeError),

    /// An artefact could not be downloaded.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A downloaded archive could not be extracted.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The host environment could not be inspected.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// The configuration file or an argument combination is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// A step of the APT installation failed.
    #[error("apt installation step '{step}' failed: {message}")]
    AptStepFailed {
        /// The step that failed (e.g. `apt-get update`).
        step: &'static str,
        /// Captured stderr or a description of the failure.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
