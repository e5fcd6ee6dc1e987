//! Installation through Intel's OpenVINO APT repository.
//!
//! The repository is keyed by release year and distribution codename. Every
//! step that touches the system runs through `sudo`.

use crate::artefact::download::Downloader;
use crate::command::CommandExecutor;
use crate::error::{InstallerError, Result};
use crate::policy::{substitute_apt_codename, version_year};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Public key signing the Intel software repositories.
pub const INTEL_GPG_KEY_URL: &str =
    "https://apt.repos.intel.com/intel-gpg-keys/GPG-PUB-KEY-INTEL-SW-PRODUCTS.PUB";

/// Root of the OpenVINO APT repositories.
pub const APT_REPOSITORY_URL: &str = "https://apt.repos.intel.com/openvino";

/// Where the dearmored repository key is installed.
pub const KEYRING_PATH: &str = "/usr/share/keyrings/intel-sw-products.gpg";

/// Everything needed to add the repository and install one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptPlan {
    /// Full package version, e.g. `2022.3.0`.
    pub version: String,
    /// Distribution codename after substitution, e.g. `focal`.
    pub codename: String,
    /// Destination of the dearmored signing key.
    pub keyring: PathBuf,
}

impl AptPlan {
    /// Plan the installation of `version` for a distribution `codename`.
    ///
    /// Codenames without packages are replaced by a compatible one.
    ///
    /// # Examples
    ///
    /// ```
    /// use openvino_installer::apt::AptPlan;
    ///
    /// let plan = AptPlan::new("2022.3.0", "jammy");
    /// assert_eq!(
    ///     plan.repository_line(),
    ///     "deb [signed-by=/usr/share/keyrings/intel-sw-products.gpg] https://apt.repos.intel.com/openvino/2022 focal main"
    /// );
    /// assert_eq!(plan.package(), "openvino-2022.3.0");
    /// ```
    #[must_use]
    pub fn new(version: &str, codename: &str) -> Self {
        let codename = substitute_apt_codename(codename).unwrap_or(codename);
        Self {
            version: version.to_owned(),
            codename: codename.to_owned(),
            keyring: PathBuf::from(KEYRING_PATH),
        }
    }

    /// The release year selecting the repository.
    #[must_use]
    pub fn year(&self) -> &str {
        version_year(&self.version)
    }

    /// The `sources.list` entry for the repository.
    #[must_use]
    pub fn repository_line(&self) -> String {
        format!(
            "deb [signed-by={}] {APT_REPOSITORY_URL}/{} {} main",
            self.keyring.display(),
            self.year(),
            self.codename
        )
    }

    /// The file the repository entry is installed to.
    #[must_use]
    pub fn list_file(&self) -> PathBuf {
        PathBuf::from(format!(
            "/etc/apt/sources.list.d/intel-openvino-{}.list",
            self.year()
        ))
    }

    /// The package to install.
    #[must_use]
    pub fn package(&self) -> String {
        format!("openvino-{}", self.version)
    }

    /// The privileged commands, in order, given staged key and list files.
    #[must_use]
    pub fn commands(&self, key_file: &Path, list_source: &Path) -> Vec<AptCommand> {
        let keyring = self.keyring.display().to_string();
        let list_file = self.list_file().display().to_string();
        vec![
            AptCommand::sudo(
                "import signing key",
                &[
                    "gpg",
                    "--batch",
                    "--yes",
                    "--output",
                    &keyring,
                    "--dearmor",
                    &key_file.display().to_string(),
                ],
            ),
            AptCommand::sudo(
                "add repository",
                &["cp", &list_source.display().to_string(), &list_file],
            ),
            AptCommand::sudo("apt-get update", &["apt-get", "update"]),
            AptCommand::sudo(
                "apt-get install",
                &["apt-get", "install", "-y", &self.package()],
            ),
        ]
    }
}

/// One privileged step of an APT installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptCommand {
    /// Short name used in progress output and errors.
    pub step: &'static str,
    /// Program to run.
    pub program: &'static str,
    /// Program arguments.
    pub args: Vec<String>,
}

impl AptCommand {
    fn sudo(step: &'static str, args: &[&str]) -> Self {
        Self {
            step,
            program: "sudo",
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        }
    }

    /// The command line as typed in a shell.
    #[must_use]
    pub fn display_line(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// Add the repository described by `plan` and install its package.
///
/// The signing key and list entry are staged in `work_dir` before being
/// installed with `sudo`.
///
/// # Errors
///
/// Returns [`InstallerError::Download`] if the key cannot be fetched and
/// [`InstallerError::AptStepFailed`] naming the first failing step.
pub fn install_with_apt(
    plan: &AptPlan,
    downloader: &dyn Downloader,
    executor: &dyn CommandExecutor,
    work_dir: &Path,
    stderr: &mut dyn Write,
) -> Result<()> {
    std::fs::create_dir_all(work_dir)?;
    let key_file = work_dir.join("intel-sw-products.pub");
    downloader.download(INTEL_GPG_KEY_URL, &key_file)?;

    let list_source = work_dir.join(format!("intel-openvino-{}.list", plan.year()));
    std::fs::write(&list_source, format!("{}\n", plan.repository_line()))?;

    for command in plan.commands(&key_file, &list_source) {
        info!("running: {}", command.display_line());
        crate::output::write_stderr_line(stderr, format!("{}...", command.step));
        run_step(executor, &command)?;
    }
    Ok(())
}

fn run_step(executor: &dyn CommandExecutor, command: &AptCommand) -> Result<()> {
    let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
    let output = executor
        .run(command.program, &args)
        .map_err(|err| match err {
            InstallerError::Io(source) => InstallerError::AptStepFailed {
                step: command.step,
                message: source.to_string(),
            },
            other => other,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InstallerError::AptStepFailed {
            step: command.step,
            message: stderr.trim().to_owned(),
        });
    }
    Ok(())
}
