//! Download URL resolution against the storage manifest.
//!
//! The resolver walks `repositories/openvino/packages/<version>/<os>` and
//! picks the first file whose name contains `<release>_<version>` and ends
//! with `<arch>.zip` (Windows) or `<arch>.tgz` (otherwise). Matching is
//! literal: version normalization and release substitution belong to the
//! caller (see [`crate::policy`]).

use super::error::{FileTreeError, Result};
use super::node::FileTreeNode;
use super::os::Os;
use log::{debug, info, warn};

/// Root URL of the OpenVINO storage server.
pub const STORAGE_URL: &str = "https://storage.openvinotoolkit.org";

/// The architecture used when none is specified.
pub const DEFAULT_ARCH: &str = "x86_64";

/// Fixed directories between the manifest root and the version directories.
const PACKAGES_PATH: &[&str] = &["repositories", "openvino", "packages"];

/// Release identifier substituted for Windows, whose archives are not split
/// by release.
const WINDOWS_RELEASE: &str = "windows";

/// Inputs to a single URL resolution.
///
/// # Examples
///
/// ```
/// use openvino_installer::filetree::ResolutionRequest;
///
/// let request = ResolutionRequest::new("2022.3", "linux").with_release(Some("ubuntu20"));
/// assert_eq!(request.arch, "x86_64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionRequest<'a> {
    /// Dotted version as it appears in the manifest, e.g. `2022.3`.
    pub version: &'a str,
    /// Operating system name; validated during resolution.
    pub os: &'a str,
    /// Distribution or macOS release; ignored for Windows.
    pub release: Option<&'a str>,
    /// CPU architecture, e.g. `x86_64`.
    pub arch: &'a str,
}

impl<'a> ResolutionRequest<'a> {
    /// Create a request with no release and the default architecture.
    #[must_use]
    pub const fn new(version: &'a str, os: &'a str) -> Self {
        Self {
            version,
            os,
            release: None,
            arch: DEFAULT_ARCH,
        }
    }

    /// Set the release identifier.
    #[must_use]
    pub const fn with_release(mut self, release: Option<&'a str>) -> Self {
        self.release = release;
        self
    }

    /// Set the CPU architecture.
    #[must_use]
    pub const fn with_arch(mut self, arch: &'a str) -> Self {
        self.arch = arch;
        self
    }
}

/// Resolves download URLs relative to a storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    base_url: String,
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(STORAGE_URL)
    }
}

impl UrlResolver {
    /// Create a resolver for the given storage root; a trailing `/` is dropped.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// The storage root URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the download URL for `request` within `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`FileTreeError::InvalidInput`] for an unknown OS or a missing
    /// release, [`FileTreeError::TraversalFailure`] when the version or OS
    /// directory is absent, and [`FileTreeError::NoMatch`] when no file in
    /// the OS directory satisfies the naming rule.
    pub fn resolve(&self, tree: &FileTreeNode, request: &ResolutionRequest<'_>) -> Result<String> {
        let os: Os = request.os.parse()?;
        let release = effective_release(os, request.release)?;
        let version = request.version;

        let mut segments: Vec<&str> = PACKAGES_PATH.to_vec();
        segments.extend([version, os.as_str()]);
        let os_dir = descend(tree, &segments)?;

        let pattern = format!("{release}_{version}");
        let suffix = format!("{}.{}", request.arch, os.archive_extension());
        let matched = select_package(&os_dir.children, &pattern, &suffix)?;

        let url = format!(
            "{}/repositories/openvino/packages/{version}/{os}/{}",
            self.base_url, matched.name
        );
        debug!("resolved {pattern} ({suffix}) to {url}");
        Ok(url)
    }
}

/// Resolve the download URL for `request` against the public storage server.
///
/// # Errors
///
/// See [`UrlResolver::resolve`].
///
/// # Examples
///
/// ```
/// use openvino_installer::filetree::{FileTreeNode, FileTreeError, ResolutionRequest, resolve_url};
///
/// let tree = FileTreeNode::directory("production", Vec::new());
/// let err = resolve_url(&tree, &ResolutionRequest::new("2022.3", "solaris"))
///     .expect_err("unknown OS");
/// assert!(matches!(err, FileTreeError::InvalidInput { .. }));
/// ```
pub fn resolve_url(tree: &FileTreeNode, request: &ResolutionRequest<'_>) -> Result<String> {
    UrlResolver::default().resolve(tree, request)
}

/// Apply the per-OS release rule.
fn effective_release(os: Os, release: Option<&str>) -> Result<&str> {
    if !os.requires_release() {
        return Ok(WINDOWS_RELEASE);
    }
    match release {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(FileTreeError::InvalidInput {
            reason: format!("a release is required for {os} (e.g. ubuntu20 or 10_15)"),
        }),
    }
}

/// Walk `segments` from `root`, requiring each to be a child directory.
fn descend<'t>(root: &'t FileTreeNode, segments: &[&str]) -> Result<&'t FileTreeNode> {
    let mut path = root.name.clone();
    let mut current = root;
    for segment in segments {
        current = current
            .child_directory(segment)
            .ok_or_else(|| FileTreeError::TraversalFailure {
                path: path.clone(),
                segment: (*segment).to_owned(),
            })?;
        path.push('/');
        path.push_str(segment);
    }
    Ok(current)
}

/// Pick the first file whose name contains `pattern` and ends with `suffix`.
fn select_package<'t>(
    candidates: &'t [FileTreeNode],
    pattern: &str,
    suffix: &str,
) -> Result<&'t FileTreeNode> {
    let mut matches = candidates
        .iter()
        .filter(|node| node.is_file() && node.name.contains(pattern) && node.name.ends_with(suffix));

    let Some(first) = matches.next() else {
        log_candidates(candidates);
        return Err(FileTreeError::NoMatch {
            pattern: pattern.to_owned(),
            suffix: suffix.to_owned(),
            candidates: candidates.iter().map(|node| node.name.clone()).collect(),
        });
    };

    let ignored: Vec<&str> = matches.map(|node| node.name.as_str()).collect();
    if !ignored.is_empty() {
        warn!(
            "{} further packages match '{pattern}' and '{suffix}'; using {} and ignoring: {}",
            ignored.len(),
            first.name,
            ignored.join(", ")
        );
    }
    Ok(first)
}

fn log_candidates(candidates: &[FileTreeNode]) {
    match serde_json::to_string_pretty(candidates) {
        Ok(json) => info!("packages: {json}"),
        Err(e) => debug!("could not serialize candidate packages: {e}"),
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
