//! Operating systems recognized by the storage layout.
//!
//! Each operating system has its own directory beneath a version directory
//! and its own archive format.

use super::error::FileTreeError;
use std::fmt;
use std::str::FromStr;

/// The accepted operating system names, in the order they are reported.
const SUPPORTED_OS: &[&str] = &["windows", "macos", "linux"];

/// An operating system with published OpenVINO archives.
///
/// # Examples
///
/// ```
/// use openvino_installer::filetree::Os;
///
/// let os: Os = "linux".parse().expect("known OS");
/// assert_eq!(os.archive_extension(), "tgz");
/// assert!("solaris".parse::<Os>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Microsoft Windows; archives are `.zip` and not split by release.
    Windows,
    /// Apple macOS; archives are `.tgz` and split by macOS version.
    Macos,
    /// Linux; archives are `.tgz` and split by distribution.
    Linux,
}

impl Os {
    /// The directory name used in the storage layout.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
        }
    }

    /// The archive extension published for this operating system.
    #[must_use]
    pub const fn archive_extension(self) -> &'static str {
        match self {
            Self::Windows => "zip",
            Self::Macos | Self::Linux => "tgz",
        }
    }

    /// Whether archive names are partitioned by a release identifier.
    #[must_use]
    pub const fn requires_release(self) -> bool {
        matches!(self, Self::Macos | Self::Linux)
    }

    /// Return the full list of accepted names.
    #[must_use]
    pub fn supported() -> &'static [&'static str] {
        SUPPORTED_OS
    }
}

impl FromStr for Os {
    type Err = FileTreeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::Macos),
            "linux" => Ok(Self::Linux),
            other => Err(FileTreeError::InvalidInput {
                reason: format!(
                    "'os' must be one of [{}], got \"{other}\"",
                    SUPPORTED_OS.join("|")
                ),
            }),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::windows("windows", Os::Windows, "zip", false)]
    #[case::macos("macos", Os::Macos, "tgz", true)]
    #[case::linux("linux", Os::Linux, "tgz", true)]
    fn parses_supported_names(
        #[case] name: &str,
        #[case] expected: Os,
        #[case] extension: &str,
        #[case] requires_release: bool,
    ) {
        let os: Os = name.parse().expect("supported OS");
        assert_eq!(os, expected);
        assert_eq!(os.as_str(), name);
        assert_eq!(os.archive_extension(), extension);
        assert_eq!(os.requires_release(), requires_release);
    }

    #[rstest]
    #[case::dots("...")]
    #[case::empty("")]
    #[case::capitalised("Linux")]
    #[case::darwin("darwin")]
    fn rejects_unknown_names(#[case] name: &str) {
        let err = name.parse::<Os>().expect_err("unsupported OS");
        assert!(matches!(err, FileTreeError::InvalidInput { .. }));
    }

    #[test]
    fn supported_lists_three_systems() {
        assert_eq!(Os::supported(), &["windows", "macos", "linux"]);
    }
}
