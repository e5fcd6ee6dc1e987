//! Host environment detection.
//!
//! CI runners describe themselves through `RUNNER_OS` and `RUNNER_ARCH`;
//! elsewhere the compile-time host values are used. Linux hosts additionally
//! expose their distribution through `/etc/os-release`.

use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the `os-release` file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Errors raised while inspecting the host.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// The `os-release` file could not be read.
    #[error("failed to read {path}")]
    OsRelease {
        /// Path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A required `os-release` field is absent.
    #[error("os-release has no {field} field")]
    MissingField {
        /// Name of the missing key.
        field: &'static str,
    },
}

/// Operating system and architecture of the host, in manifest naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    /// Lowercase OS name, e.g. `linux`.
    pub os: String,
    /// Architecture, e.g. `x86_64`.
    pub arch: String,
}

impl HostEnvironment {
    /// Detect the host from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_with(|name| std::env::var(name).ok())
    }

    /// Detect the host using `lookup` to read environment variables.
    ///
    /// # Examples
    ///
    /// ```
    /// use openvino_installer::environment::HostEnvironment;
    ///
    /// let host = HostEnvironment::detect_with(|name| match name {
    ///     "RUNNER_OS" => Some("Linux".to_owned()),
    ///     "RUNNER_ARCH" => Some("X64".to_owned()),
    ///     _ => None,
    /// });
    /// assert_eq!(host.os, "linux");
    /// assert_eq!(host.arch, "x86_64");
    /// ```
    #[must_use]
    pub fn detect_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let arch = lookup("RUNNER_ARCH")
            .map(|value| value.to_lowercase())
            .unwrap_or_else(|| host_arch().to_owned());
        let os = lookup("RUNNER_OS")
            .map(|value| value.to_lowercase())
            .unwrap_or_else(|| std::env::consts::OS.to_owned());

        let detected = Self {
            os: canonical_os(&os).to_owned(),
            arch: canonical_arch(&arch).to_owned(),
        };
        debug!("detected host {}/{}", detected.os, detected.arch);
        detected
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        other => other,
    }
}

fn canonical_arch(arch: &str) -> &str {
    match arch {
        "x64" => "x86_64",
        other => other,
    }
}

fn canonical_os(os: &str) -> &str {
    match os {
        "darwin" => "macos",
        "win32" => "windows",
        other => other,
    }
}

/// Distribution details read from `os-release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxRelease {
    /// Distribution identifier, e.g. `ubuntu`.
    pub id: String,
    /// Major version, e.g. `22`.
    pub version: String,
    /// Release codename, e.g. `jammy`, when the file provides one.
    pub codename: Option<String>,
}

impl LinuxRelease {
    /// Parse the contents of an `os-release` file.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::MissingField`] when `ID` or `VERSION_ID`
    /// is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use openvino_installer::environment::LinuxRelease;
    ///
    /// let release = LinuxRelease::parse("ID=ubuntu\nVERSION_ID=\"22.04\"\n")?;
    /// assert_eq!(release.tag(), "ubuntu22");
    /// # Ok::<(), openvino_installer::environment::EnvironmentError>(())
    /// ```
    pub fn parse(contents: &str) -> Result<Self, EnvironmentError> {
        let mut id = None;
        let mut version = None;
        let mut codename = None;

        for line in contents.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = unquote(value);
            match key {
                "ID" => id = Some(value.to_owned()),
                "VERSION_ID" => {
                    let major = value.split('.').next().unwrap_or(value);
                    version = Some(major.to_owned());
                }
                "VERSION_CODENAME" if !value.is_empty() => codename = Some(value.to_owned()),
                _ => {}
            }
        }

        Ok(Self {
            id: id.ok_or(EnvironmentError::MissingField { field: "ID" })?,
            version: version.ok_or(EnvironmentError::MissingField {
                field: "VERSION_ID",
            })?,
            codename,
        })
    }

    /// Read and parse the `os-release` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::OsRelease`] if the file cannot be read, or
    /// any error from [`LinuxRelease::parse`].
    pub fn read(path: &Path) -> Result<Self, EnvironmentError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| EnvironmentError::OsRelease {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&contents)
    }

    /// The manifest release tag, `<id><major version>`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}{}", self.id, self.version)
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}
