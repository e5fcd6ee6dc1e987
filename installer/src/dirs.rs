//! Platform directory lookup.
//!
//! Directory resolution sits behind [`BaseDirs`] so configuration code can be
//! exercised without touching the real home directory.

use directories_next::ProjectDirs;
use std::path::PathBuf;

/// Source of the per-user directories the installer writes to.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The installer's cache directory, if the platform defines one.
    fn cache_dir(&self) -> Option<PathBuf>;
}

/// The default location of downloaded artefacts inside the cache.
#[must_use]
pub fn download_cache_dir(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.cache_dir().map(|dir| dir.join("downloads"))
}

/// [`BaseDirs`] backed by the platform conventions of `directories-next`.
///
/// # Examples
///
/// ```no_run
/// use openvino_installer::dirs::{SystemBaseDirs, download_cache_dir};
///
/// if let Some(cache) = download_cache_dir(&SystemBaseDirs) {
///     println!("archives are cached in {}", cache.display());
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        ProjectDirs::from("org", "openvinotoolkit", "openvino-installer")
            .map(|dirs| dirs.cache_dir().to_path_buf())
    }
}
