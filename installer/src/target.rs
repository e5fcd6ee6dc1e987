//! Merging invocation inputs with host detection into a concrete target.

use crate::cli::TargetArgs;
use crate::environment::{EnvironmentError, HostEnvironment, LinuxRelease, OS_RELEASE_PATH};
use crate::filetree::ResolutionRequest;
use crate::policy::normalize_version;
use log::{debug, info};
use std::path::PathBuf;

/// The version installed when none is requested.
pub const DEFAULT_VERSION: &str = "2022.3.0";

/// Source of the host's Linux distribution details.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseSource {
    /// Read the distribution details.
    ///
    /// # Errors
    ///
    /// Returns an error if the details cannot be read or are incomplete.
    fn linux_release(&self) -> Result<LinuxRelease, EnvironmentError>;
}

/// [`ReleaseSource`] reading an `os-release` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsReleaseFile {
    path: PathBuf,
}

impl OsReleaseFile {
    /// Read from `path` instead of `/etc/os-release`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for OsReleaseFile {
    fn default() -> Self {
        Self::new(OS_RELEASE_PATH)
    }
}

impl ReleaseSource for OsReleaseFile {
    fn linux_release(&self) -> Result<LinuxRelease, EnvironmentError> {
        LinuxRelease::read(&self.path)
    }
}

/// The fully determined installation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Version as requested, e.g. `2022.3.0`.
    pub version: String,
    /// Operating system, e.g. `linux`.
    pub os: String,
    /// CPU architecture, e.g. `x86_64`.
    pub arch: String,
    /// Release identifier, e.g. `ubuntu20`, when one applies.
    pub release: Option<String>,
    /// Host distribution details, read on Linux targets.
    pub linux_release: Option<LinuxRelease>,
}

impl Target {
    /// Resolve the target from `args`, defaulting to the detected host.
    ///
    /// Empty strings are treated as absent. For a Linux target without an
    /// explicit release, the release is the `os-release` tag of this host.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvironmentError`] when a Linux release is needed but
    /// `os-release` cannot be read.
    pub fn resolve(
        args: &TargetArgs,
        host: &HostEnvironment,
        release_source: &dyn ReleaseSource,
    ) -> Result<Self, EnvironmentError> {
        let version = non_empty(args.version.as_deref()).unwrap_or(DEFAULT_VERSION);
        let os = non_empty(args.os.as_deref()).unwrap_or(host.os.as_str());
        let arch = non_empty(args.arch.as_deref()).unwrap_or(host.arch.as_str());
        let explicit_release = non_empty(args.release.as_deref());

        let linux_release = match (os, explicit_release) {
            ("linux", None) => Some(release_source.linux_release()?),
            ("linux", Some(_)) => release_source
                .linux_release()
                .inspect_err(|e| debug!("host release unavailable: {e}"))
                .ok(),
            _ => None,
        };
        let release = explicit_release
            .map(str::to_owned)
            .or_else(|| linux_release.as_ref().map(LinuxRelease::tag));

        let target = Self {
            version: version.to_owned(),
            os: os.to_owned(),
            arch: arch.to_owned(),
            release,
            linux_release,
        };
        info!(
            "target: version {}, os {}, arch {}, release {}",
            target.version,
            target.os,
            target.arch,
            target.release.as_deref().unwrap_or("<none>")
        );
        Ok(target)
    }

    /// The version as it appears in the storage manifest.
    #[must_use]
    pub fn manifest_version(&self) -> &str {
        normalize_version(&self.version)
    }

    /// The URL resolution request for this target.
    #[must_use]
    pub fn request(&self) -> ResolutionRequest<'_> {
        ResolutionRequest::new(self.manifest_version(), &self.os)
            .with_release(self.release.as_deref())
            .with_arch(&self.arch)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn linux_host() -> HostEnvironment {
        HostEnvironment {
            os: "linux".to_owned(),
            arch: "x86_64".to_owned(),
        }
    }

    fn ubuntu22() -> LinuxRelease {
        LinuxRelease {
            id: "ubuntu".to_owned(),
            version: "22".to_owned(),
            codename: Some("jammy".to_owned()),
        }
    }

    fn releases(release: LinuxRelease) -> MockReleaseSource {
        let mut source = MockReleaseSource::new();
        source
            .expect_linux_release()
            .returning(move || Ok(release.clone()));
        source
    }

    #[rstest]
    fn defaults_to_host_and_os_release(linux_host: HostEnvironment) {
        let target = Target::resolve(&TargetArgs::default(), &linux_host, &releases(ubuntu22()))
            .expect("target");
        assert_eq!(target.version, DEFAULT_VERSION);
        assert_eq!(target.os, "linux");
        assert_eq!(target.arch, "x86_64");
        assert_eq!(target.release.as_deref(), Some("ubuntu22"));
        assert_eq!(target.linux_release, Some(ubuntu22()));
    }

    #[rstest]
    fn empty_inputs_count_as_absent(linux_host: HostEnvironment) {
        let args = TargetArgs {
            version: Some(String::new()),
            os: Some(String::new()),
            arch: Some(String::new()),
            release: Some(String::new()),
        };
        let target = Target::resolve(&args, &linux_host, &releases(ubuntu22())).expect("target");
        assert_eq!(target.version, DEFAULT_VERSION);
        assert_eq!(target.os, "linux");
        assert_eq!(target.release.as_deref(), Some("ubuntu22"));
    }

    #[rstest]
    fn explicit_release_wins(linux_host: HostEnvironment) {
        let args = TargetArgs {
            release: Some("ubuntu20".to_owned()),
            ..TargetArgs::default()
        };
        let target = Target::resolve(&args, &linux_host, &releases(ubuntu22())).expect("target");
        assert_eq!(target.release.as_deref(), Some("ubuntu20"));
        assert_eq!(target.linux_release, Some(ubuntu22()));
    }

    #[rstest]
    fn explicit_release_tolerates_unreadable_os_release(linux_host: HostEnvironment) {
        let mut source = MockReleaseSource::new();
        source
            .expect_linux_release()
            .returning(|| Err(EnvironmentError::MissingField { field: "ID" }));
        let args = TargetArgs {
            release: Some("rhel8".to_owned()),
            ..TargetArgs::default()
        };

        let target = Target::resolve(&args, &linux_host, &source).expect("target");
        assert_eq!(target.release.as_deref(), Some("rhel8"));
        assert!(target.linux_release.is_none());
    }

    #[rstest]
    fn implicit_release_requires_os_release(linux_host: HostEnvironment) {
        let mut source = MockReleaseSource::new();
        source
            .expect_linux_release()
            .returning(|| Err(EnvironmentError::MissingField { field: "VERSION_ID" }));

        let err = Target::resolve(&TargetArgs::default(), &linux_host, &source)
            .expect_err("no release");
        assert!(matches!(err, EnvironmentError::MissingField { .. }));
    }

    #[rstest]
    #[case::windows("windows")]
    #[case::macos("macos")]
    fn other_systems_skip_os_release(linux_host: HostEnvironment, #[case] os: &str) {
        let mut source = MockReleaseSource::new();
        source.expect_linux_release().never();
        let args = TargetArgs {
            os: Some(os.to_owned()),
            ..TargetArgs::default()
        };

        let target = Target::resolve(&args, &linux_host, &source).expect("target");
        assert_eq!(target.os, os);
        assert!(target.release.is_none());
    }

    #[rstest]
    fn request_uses_manifest_version(linux_host: HostEnvironment) {
        let args = TargetArgs {
            version: Some("2022.3.0".to_owned()),
            arch: Some("arm64".to_owned()),
            release: Some("debian9".to_owned()),
            ..TargetArgs::default()
        };
        let target = Target::resolve(&args, &linux_host, &releases(ubuntu22())).expect("target");
        assert_eq!(
            target.request(),
            ResolutionRequest::new("2022.3", "linux")
                .with_release(Some("debian9"))
                .with_arch("arm64")
        );
    }

    #[test]
    fn os_release_file_reads_configured_path() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("os-release");
        std::fs::write(&path, "ID=rhel\nVERSION_ID=\"8.6\"\n").expect("write os-release");

        let release = OsReleaseFile::new(&path).linux_release().expect("release");
        assert_eq!(release.tag(), "rhel8");
    }
}
