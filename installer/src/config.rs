//! Configuration file loading and merging with command-line arguments.
//!
//! An optional `openvino-installer.toml` may set the storage server and the
//! cache directory:
//!
//! ```toml
//! storage_url = "https://mirror.example.test/openvino"
//! cache_dir = "/var/cache/openvino"
//! ```
//!
//! Command-line values always take precedence over the file.

use crate::cli::SourceArgs;
use crate::dirs::{BaseDirs, download_cache_dir};
use crate::error::{InstallerError, Result};
use crate::filetree::STORAGE_URL;
use crate::filetree::loader::FILETREE_FILE_NAME;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "openvino-installer.toml";

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Root URL of the storage server.
    pub storage_url: Option<String>,
    /// Download cache directory.
    pub cache_dir: Option<Utf8PathBuf>,
}

impl FileConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] for malformed TOML or
    /// unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use openvino_installer::config::FileConfig;
    ///
    /// let config = FileConfig::parse("storage_url = \"https://mirror.test\"")?;
    /// assert_eq!(config.storage_url.as_deref(), Some("https://mirror.test"));
    /// assert!(FileConfig::parse("storge_url = \"typo\"").is_err());
    /// # Ok::<(), openvino_installer::error::InstallerError>(())
    /// ```
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| InstallerError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Load the configuration for this invocation.
    ///
    /// An explicit path must exist. Without one, `openvino-installer.toml`
    /// in `working_dir` is read when present and defaults apply otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] if an explicit file is
    /// missing or any file fails to parse.
    pub fn load(explicit: Option<&Utf8Path>, working_dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(InstallerError::InvalidConfig {
                        reason: format!("configuration file {path} does not exist"),
                    });
                }
                path.as_std_path().to_path_buf()
            }
            None => {
                let candidate = working_dir.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        debug!("reading configuration from {}", path.display());
        let contents = std::fs::read_to_string(&path)?;
        Self::parse(&contents).map_err(|err| match err {
            InstallerError::InvalidConfig { reason } => InstallerError::InvalidConfig {
                reason: format!("{}: {reason}", path.display()),
            },
            other => other,
        })
    }
}

/// Effective storage settings after merging arguments, file, and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root URL of the storage server, without a trailing slash.
    pub storage_url: String,
    /// Directory receiving the manifest, the archive, and its extraction.
    pub download_dir: PathBuf,
    /// Download cache, or `None` when caching is disabled.
    pub cache_dir: Option<PathBuf>,
}

impl Settings {
    /// Merge `args` over `file`, falling back to platform defaults.
    ///
    /// Relative download directories are resolved against `working_dir`.
    #[must_use]
    pub fn merge(args: &SourceArgs, file: FileConfig, working_dir: &Path, dirs: &dyn BaseDirs) -> Self {
        let storage_url = file
            .storage_url
            .unwrap_or_else(|| STORAGE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let download_dir = match &args.download_dir {
            Some(dir) => working_dir.join(dir.as_std_path()),
            None => working_dir.to_path_buf(),
        };

        let cache_dir = if args.no_cache {
            None
        } else {
            args.cache_dir
                .clone()
                .or(file.cache_dir)
                .map(Utf8PathBuf::into_std_path_buf)
                .or_else(|| download_cache_dir(dirs))
        };

        Self {
            storage_url,
            download_dir,
            cache_dir,
        }
    }

    /// URL of the storage manifest.
    #[must_use]
    pub fn manifest_url(&self) -> String {
        format!("{}/{FILETREE_FILE_NAME}", self.storage_url)
    }

    /// Local path of the storage manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.download_dir.join(FILETREE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirs::MockBaseDirs;
    use rstest::{fixture, rstest};

    #[fixture]
    fn dirs() -> MockBaseDirs {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_cache_dir()
            .returning(|| Some(PathBuf::from("/home/test/.cache/openvino-installer")));
        dirs
    }

    #[test]
    fn parses_full_file() {
        let config = FileConfig::parse(concat!(
            "storage_url = \"https://mirror.example.test/openvino/\"\n",
            "cache_dir = \"/var/cache/openvino\"\n",
        ))
        .expect("valid config");
        assert_eq!(
            config.cache_dir,
            Some(Utf8PathBuf::from("/var/cache/openvino"))
        );
    }

    #[rstest]
    #[case::unknown_key("storge_url = \"https://typo.test\"")]
    #[case::wrong_type("cache_dir = 3")]
    #[case::malformed("storage_url = ")]
    fn rejects_invalid_files(#[case] contents: &str) {
        let err = FileConfig::parse(contents).expect_err("invalid config");
        assert!(matches!(err, InstallerError::InvalidConfig { .. }));
    }

    #[test]
    fn missing_default_file_yields_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = FileConfig::load(None, temp.path()).expect("defaults");
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn reads_default_file_from_working_dir() {
        let temp = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "storage_url = \"https://mirror.test\"\n",
        )
        .expect("write config");

        let config = FileConfig::load(None, temp.path()).expect("config");
        assert_eq!(config.storage_url.as_deref(), Some("https://mirror.test"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let err = FileConfig::load(Some(Utf8Path::new("/nonexistent/ov.toml")), temp.path())
            .expect_err("missing file");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "bogus = 1\n").expect("write config");

        let err = FileConfig::load(None, temp.path()).expect_err("unknown key");
        assert!(err.to_string().contains(CONFIG_FILE_NAME), "{err}");
    }

    #[rstest]
    fn defaults_use_public_storage_and_platform_cache(dirs: MockBaseDirs) {
        let settings = Settings::merge(
            &SourceArgs::default(),
            FileConfig::default(),
            Path::new("/work"),
            &dirs,
        );
        assert_eq!(settings.storage_url, STORAGE_URL);
        assert_eq!(settings.download_dir, PathBuf::from("/work"));
        assert_eq!(
            settings.cache_dir,
            Some(PathBuf::from("/home/test/.cache/openvino-installer/downloads"))
        );
        assert_eq!(
            settings.manifest_url(),
            "https://storage.openvinotoolkit.org/filetree.json"
        );
        assert_eq!(settings.manifest_path(), PathBuf::from("/work/filetree.json"));
    }

    #[rstest]
    fn arguments_override_file(dirs: MockBaseDirs) {
        let args = SourceArgs {
            download_dir: Some(Utf8PathBuf::from("downloads")),
            cache_dir: Some(Utf8PathBuf::from("/cli/cache")),
            ..SourceArgs::default()
        };
        let file = FileConfig {
            storage_url: Some("https://mirror.test/".to_owned()),
            cache_dir: Some(Utf8PathBuf::from("/file/cache")),
        };

        let settings = Settings::merge(&args, file, Path::new("/work"), &dirs);
        assert_eq!(settings.storage_url, "https://mirror.test");
        assert_eq!(settings.download_dir, PathBuf::from("/work/downloads"));
        assert_eq!(settings.cache_dir, Some(PathBuf::from("/cli/cache")));
    }

    #[rstest]
    fn file_cache_dir_beats_platform_default(dirs: MockBaseDirs) {
        let file = FileConfig {
            storage_url: None,
            cache_dir: Some(Utf8PathBuf::from("/file/cache")),
        };
        let settings = Settings::merge(&SourceArgs::default(), file, Path::new("/work"), &dirs);
        assert_eq!(settings.cache_dir, Some(PathBuf::from("/file/cache")));
    }

    #[test]
    fn no_cache_disables_caching() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_cache_dir().never();
        let args = SourceArgs {
            no_cache: true,
            ..SourceArgs::default()
        };
        let file = FileConfig {
            storage_url: None,
            cache_dir: Some(Utf8PathBuf::from("/file/cache")),
        };

        let settings = Settings::merge(&args, file, Path::new("/work"), &dirs);
        assert!(settings.cache_dir.is_none());
    }
}
