//! Error types for manifest loading and URL resolution.
//!
//! The variants split failures by who is at fault: the caller
//! ([`FileTreeError::InvalidInput`]), the manifest shape
//! ([`FileTreeError::TraversalFailure`]), the naming rule
//! ([`FileTreeError::NoMatch`]), or the manifest source
//! ([`FileTreeError::ManifestUnavailable`]).

use thiserror::Error;

/// Errors arising from loading the storage manifest or resolving a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileTreeError {
    /// The operating system is not recognized or a required release is missing.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Description of the rejected input.
        reason: String,
    },

    /// An expected directory is absent from the manifest.
    #[error("manifest has no directory \"{segment}\" under \"{path}\"")]
    TraversalFailure {
        /// The path walked so far, joined with `/`.
        path: String,
        /// The directory name that could not be found.
        segment: String,
    },

    /// Traversal succeeded but no file satisfied the naming rule.
    #[error(
        "unable to match any package containing '{pattern}' and ending with '{suffix}'; \
         candidates: [{}]",
        .candidates.join(", ")
    )]
    NoMatch {
        /// The `<release>_<version>` substring that was required.
        pattern: String,
        /// The `<arch>.<ext>` suffix that was required.
        suffix: String,
        /// Names of every entry in the searched directory, in manifest order.
        candidates: Vec<String>,
    },

    /// The manifest could not be fetched, read, or parsed.
    #[error("manifest unavailable at {path}: {reason}")]
    ManifestUnavailable {
        /// Local path of the manifest file.
        path: String,
        /// Description of the underlying failure.
        reason: String,
    },
}

/// Result type alias using [`FileTreeError`].
pub type Result<T> = std::result::Result<T, FileTreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_lists_candidates() {
        let err = FileTreeError::NoMatch {
            pattern: "ubuntu22_2022.3".to_owned(),
            suffix: "x86_64.tgz".to_owned(),
            candidates: vec!["a.tgz".to_owned(), "b.tgz".to_owned()],
        };
        let msg = err.to_string();
        assert!(msg.contains("ubuntu22_2022.3"));
        assert!(msg.contains("x86_64.tgz"));
        assert!(msg.contains("a.tgz, b.tgz"));
    }

    #[test]
    fn traversal_failure_names_segment_and_path() {
        let err = FileTreeError::TraversalFailure {
            path: "production/repositories/openvino/packages".to_owned(),
            segment: "2021.4".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"2021.4\""));
        assert!(msg.contains("packages"));
    }
}
