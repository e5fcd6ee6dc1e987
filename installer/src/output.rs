//! Output formatting for the installer CLI.
//!
//! This module writes progress lines and exports `OPENVINO_INSTALL_DIR`,
//! either into the file a CI runner names in `GITHUB_ENV` or as shell
//! configuration snippets for the user to apply.

use crate::config::Settings;
use crate::error::{InstallerError, Result};
use crate::target::Target;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// The variable pointing at the extracted installation.
pub const INSTALL_DIR_VAR: &str = "OPENVINO_INSTALL_DIR";

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Shell configuration snippets for different shells.
#[derive(Debug, Clone)]
pub struct ShellSnippet {
    /// Export line for bash/zsh.
    pub bash: String,
    /// Set line for fish shell.
    pub fish: String,
    /// Set line for PowerShell.
    pub powershell: String,
}

impl ShellSnippet {
    /// Create shell snippets exporting the given installation directory.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use openvino_installer::output::ShellSnippet;
    ///
    /// let snippet = ShellSnippet::new(Path::new(
    ///     "/work/l_openvino_toolkit_ubuntu20_2022.3.0.9052.9752fafe8eb_x86_64",
    /// ));
    ///
    /// assert!(snippet.bash.starts_with("export OPENVINO_INSTALL_DIR="));
    /// ```
    #[must_use]
    pub fn new(install_dir: &Path) -> Self {
        let install_dir = install_dir.display();
        Self {
            bash: format!("export {INSTALL_DIR_VAR}=\"{install_dir}\""),
            fish: format!("set -gx {INSTALL_DIR_VAR} \"{install_dir}\""),
            powershell: format!("$env:{INSTALL_DIR_VAR} = \"{install_dir}\""),
        }
    }

    /// Format the snippet for display to the user.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!(
            concat!(
                "Add the following to your shell configuration:\n\n",
                "  # bash/zsh (~/.bashrc, ~/.zshrc)\n",
                "  {}\n\n",
                "  # fish (~/.config/fish/config.fish)\n",
                "  {}\n\n",
                "  # PowerShell ($PROFILE)\n",
                "  {}"
            ),
            self.bash, self.fish, self.powershell
        )
    }
}

/// Export the installation directory for later steps.
///
/// With a `GITHUB_ENV` file, `OPENVINO_INSTALL_DIR=<dir>` is appended to it.
/// Otherwise shell snippets are printed to `stderr`.
///
/// # Errors
///
/// Returns [`InstallerError::WriteFailed`] if the environment file cannot be
/// appended to.
pub fn export_install_dir(
    install_dir: &Path,
    github_env: Option<&Path>,
    stderr: &mut dyn Write,
) -> Result<()> {
    write_stderr_line(
        stderr,
        format!(
            "Setting up environment: {INSTALL_DIR_VAR}={}",
            install_dir.display()
        ),
    );

    let Some(env_file) = github_env else {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, ShellSnippet::new(install_dir).display_text());
        return Ok(());
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(env_file)
        .map_err(|source| InstallerError::WriteFailed { source })?;
    writeln!(file, "{INSTALL_DIR_VAR}={}", install_dir.display())
        .map_err(|source| InstallerError::WriteFailed { source })
}

/// Format a success message after an archive installation.
#[must_use]
pub fn success_message(target: &Target, install_dir: &Path) -> String {
    format!(
        "Installed OpenVINO {} for {}/{} to {}",
        target.version,
        target.os,
        target.arch,
        install_dir.display()
    )
}

/// Configuration information for dry-run output.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use openvino_installer::config::Settings;
/// use openvino_installer::output::DryRunInfo;
/// use openvino_installer::target::Target;
///
/// let target = Target {
///     version: "2022.3.0".to_owned(),
///     os: "windows".to_owned(),
///     arch: "x86_64".to_owned(),
///     release: None,
///     linux_release: None,
/// };
/// let settings = Settings {
///     storage_url: "https://storage.openvinotoolkit.org".to_owned(),
///     download_dir: PathBuf::from("/work"),
///     cache_dir: None,
/// };
///
/// let info = DryRunInfo {
///     target: &target,
///     settings: &settings,
///     apt: false,
///     url: None,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("Cache: disabled"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// The resolved target.
    pub target: &'a Target,
    /// The effective storage settings.
    pub settings: &'a Settings,
    /// Whether the APT path was selected.
    pub apt: bool,
    /// The archive URL, when it was resolved.
    pub url: Option<&'a str>,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let cache = self
            .settings
            .cache_dir
            .as_ref()
            .map_or_else(|| "disabled".to_owned(), |dir| dir.display().to_string());
        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Version: {}", self.target.version),
            format!("OS: {}", self.target.os),
            format!("Architecture: {}", self.target.arch),
            format!(
                "Release: {}",
                self.target.release.as_deref().unwrap_or("<none>")
            ),
            format!("Method: {}", if self.apt { "apt" } else { "archive" }),
            format!("Storage: {}", self.settings.storage_url),
            format!("Download directory: {}", self.settings.download_dir.display()),
            format!("Cache: {cache}"),
        ];

        if let Some(url) = self.url {
            lines.push(format!("Archive URL: {url}"));
        }

        lines.join("\n")
    }
}
