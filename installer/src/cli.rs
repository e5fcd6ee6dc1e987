//! CLI argument definitions for the OpenVINO installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.
//!
//! Every target input can also be supplied through the `INPUT_*` variables a
//! CI runner exports for action inputs. Empty values are treated as unset.

use camino::Utf8PathBuf;
use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};

/// Install OpenVINO from the public storage server or APT.
#[derive(Parser, Debug)]
#[command(name = "openvino-installer")]
#[command(about)]
#[command(long_about = concat!(
    "Install OpenVINO from the public storage server or APT.\n\n",
    "The installer reads the storage manifest (filetree.json), resolves the ",
    "archive matching the requested version, OS, release and architecture, ",
    "downloads it through a local cache and extracts it. The extracted ",
    "directory is exported as OPENVINO_INSTALL_DIR.\n\n",
    "On Debian-based Linux, --apt installs the Intel APT packages instead.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the default version for this host:\n",
    "    $ openvino-installer\n\n",
    "  Install a specific archive:\n",
    "    $ openvino-installer --version 2022.3.0 --os linux --release ubuntu20\n\n",
    "  Print the download URL only:\n",
    "    $ openvino-installer resolve --os windows\n\n",
    "  Install through APT:\n",
    "    $ openvino-installer --apt\n\n",
    "  Preview without downloading:\n",
    "    $ openvino-installer --dry-run",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Install arguments (used when no subcommand is given).
    #[command(flatten)]
    pub install: InstallArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Install OpenVINO (default when no subcommand given).
    Install(InstallArgs),

    /// Print the download URL for the requested archive.
    Resolve(ResolveArgs),
}

/// Which OpenVINO build to target.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetArgs {
    /// OpenVINO version [default: 2022.3.0].
    #[arg(long = "version", env = "INPUT_VERSION", value_name = "VERSION")]
    pub version: Option<String>,

    /// Target OS: linux, macos or windows [default: host OS].
    #[arg(long, env = "INPUT_OS", value_name = "OS")]
    pub os: Option<String>,

    /// Target CPU architecture [default: host architecture].
    #[arg(long, env = "INPUT_ARCH", value_name = "ARCH")]
    pub arch: Option<String>,

    /// OS release, e.g. ubuntu20 or macos_10_15 [default: from /etc/os-release on Linux].
    #[arg(long, env = "INPUT_RELEASE", value_name = "RELEASE")]
    pub release: Option<String>,
}

/// Where the manifest and archives are stored.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceArgs {
    /// Directory receiving the manifest, the archive and its extraction
    /// [default: current directory].
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<Utf8PathBuf>,

    /// Download cache directory [default: platform-specific].
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Always download; never read or populate the cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Configuration file [default: ./openvino-installer.toml when present].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,
}

/// Output controls shared by every command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputArgs {
    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        alias = "verbosity",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Arguments for the install command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallArgs {
    /// Target selection.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Storage locations.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Install the Intel APT packages instead of the archive (Linux only).
    #[arg(
        long,
        env = "INPUT_APT",
        action = clap::ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub apt: bool,

    /// Show the resolved configuration and exit without installing.
    #[arg(long)]
    pub dry_run: bool,

    /// Output controls.
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the resolve command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveArgs {
    /// Target selection.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Storage locations.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output controls.
    #[command(flatten)]
    pub output: OutputArgs,
}

impl Cli {
    /// Returns the effective install arguments.
    ///
    /// If an `Install` subcommand was provided, returns those arguments.
    /// Otherwise returns the flattened install arguments.
    ///
    /// # Note
    ///
    /// When `Command::Resolve` is active, this returns the default flattened
    /// install arguments. Callers should check `self.command` first.
    #[must_use]
    pub fn install_args(&self) -> &InstallArgs {
        match &self.command {
            Some(Command::Install(args)) => args,
            Some(Command::Resolve(_)) | None => &self.install,
        }
    }

    /// Output controls of whichever command runs.
    #[must_use]
    pub fn output_args(&self) -> &OutputArgs {
        match &self.command {
            Some(Command::Resolve(args)) => &args.output,
            Some(Command::Install(_)) | None => &self.install_args().output,
        }
    }
}

impl OutputArgs {
    /// The `log` filter implied by `-v` and `--quiet`.
    ///
    /// # Examples
    ///
    /// ```
    /// use openvino_installer::cli::OutputArgs;
    ///
    /// let args = OutputArgs { verbosity: 2, quiet: false };
    /// assert_eq!(args.log_level(), log::LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
