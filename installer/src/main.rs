//! OpenVINO installer CLI entrypoint.
//!
//! This binary installs OpenVINO either by downloading and extracting the
//! release archive matching the host, or through the Intel APT repository.
//! After an archive installation it exports `OPENVINO_INSTALL_DIR`.

use clap::Parser;
use log::warn;
use openvino_installer::apt::{AptPlan, install_with_apt};
use openvino_installer::artefact::download::{CachedRetriever, HttpDownloader};
use openvino_installer::artefact::extraction::ArchiveExtractor;
use openvino_installer::cli::{Cli, Command, InstallArgs, OutputArgs, ResolveArgs, SourceArgs, TargetArgs};
use openvino_installer::command::SystemCommandExecutor;
use openvino_installer::config::{FileConfig, Settings};
use openvino_installer::dirs::{BaseDirs, SystemBaseDirs};
use openvino_installer::environment::HostEnvironment;
use openvino_installer::error::{InstallerError, Result};
use openvino_installer::output::{
    DryRunInfo, export_install_dir, success_message, write_stderr_line,
};
use openvino_installer::pipeline::{PipelineContext, install_archive, resolve_download_url};
use openvino_installer::target::{OsReleaseFile, Target};
use std::io::Write;
use std::path::{Path, PathBuf};

struct RunContext<'a> {
    dirs: &'a dyn BaseDirs,
    working_dir: &'a Path,
    github_env: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.output_args());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install the `env_logger` backend; `RUST_LOG` overrides the flags.
fn init_logging(output: &OutputArgs) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(output.log_level().as_str()),
    )
    .format_timestamp(None)
    .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let dirs = SystemBaseDirs;
    let working_dir = std::env::current_dir()?;
    let context = RunContext {
        dirs: &dirs,
        working_dir: &working_dir,
        github_env: github_env_path(|name| std::env::var(name).ok()),
    };

    match &cli.command {
        Some(Command::Resolve(args)) => run_resolve(&context, args, stdout),
        Some(Command::Install(args)) => run_install(&context, args, stderr),
        None => run_install(&context, &cli.install, stderr),
    }
}

/// Prints the resolved archive URL on stdout.
fn run_resolve(context: &RunContext<'_>, args: &ResolveArgs, stdout: &mut dyn Write) -> Result<()> {
    let target = resolve_target(&args.target)?;
    let settings = load_settings(context, &args.source)?;
    let downloader = HttpDownloader;
    let retriever = CachedRetriever::new(&downloader, settings.cache_dir.clone());

    let url = resolve_download_url(&settings, &retriever, &target)?;
    writeln!(stdout, "{url}").map_err(|source| InstallerError::WriteFailed { source })
}

fn run_install(context: &RunContext<'_>, args: &InstallArgs, stderr: &mut dyn Write) -> Result<()> {
    let target = resolve_target(&args.target)?;
    let settings = load_settings(context, &args.source)?;

    if args.apt {
        return run_apt(&target, &settings, args, stderr);
    }

    let downloader = HttpDownloader;
    let retriever = CachedRetriever::new(&downloader, settings.cache_dir.clone());

    if args.dry_run {
        // Only resolve against a manifest that is already on disk.
        let url = settings
            .manifest_path()
            .is_file()
            .then(|| resolve_download_url(&settings, &retriever, &target))
            .transpose()?;
        print_dry_run_info(&target, &settings, false, url.as_deref(), stderr);
        return Ok(());
    }

    let pipeline = PipelineContext {
        settings: &settings,
        retriever: &retriever,
        extractor: &ArchiveExtractor,
        quiet: args.output.quiet,
    };
    let installed = install_archive(&pipeline, &target, stderr)?;
    export_install_dir(&installed.install_dir, context.github_env.as_deref(), stderr)?;

    if !args.output.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, success_message(&target, &installed.install_dir));
    }
    Ok(())
}

/// Installs through APT, warning when the target is not Linux.
fn run_apt(
    target: &Target,
    settings: &Settings,
    args: &InstallArgs,
    stderr: &mut dyn Write,
) -> Result<()> {
    if target.os != "linux" {
        warn!("retrieving OpenVINO with APT is unlikely to work on OSes other than Linux");
    }
    let codename = target
        .linux_release
        .as_ref()
        .and_then(|release| release.codename.as_deref())
        .ok_or_else(|| InstallerError::InvalidConfig {
            reason: "APT installation needs VERSION_CODENAME from /etc/os-release".to_owned(),
        })?;
    let plan = AptPlan::new(&target.version, codename);

    if args.dry_run {
        print_dry_run_info(target, settings, true, None, stderr);
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, format!("Repository: {}", plan.repository_line()));
        for command in plan.commands(Path::new("<signing key>"), Path::new("<list file>")) {
            write_stderr_line(stderr, format!("  {}", command.display_line()));
        }
        return Ok(());
    }

    let work_dir = tempfile::tempdir()?;
    install_with_apt(
        &plan,
        &HttpDownloader,
        &SystemCommandExecutor,
        work_dir.path(),
        stderr,
    )?;

    if !args.output.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, format!("Installed {} with APT", plan.package()));
    }
    Ok(())
}

fn resolve_target(args: &TargetArgs) -> Result<Target> {
    let host = HostEnvironment::detect();
    let target = Target::resolve(args, &host, &OsReleaseFile::default())?;
    Ok(target)
}

fn load_settings(context: &RunContext<'_>, source: &SourceArgs) -> Result<Settings> {
    let file = FileConfig::load(source.config.as_deref(), context.working_dir)?;
    Ok(Settings::merge(source, file, context.working_dir, context.dirs))
}

/// The `GITHUB_ENV` file, when the runner provides a non-empty one.
fn github_env_path(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    lookup("GITHUB_ENV")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Prints dry run configuration information.
fn print_dry_run_info(
    target: &Target,
    settings: &Settings,
    apt: bool,
    url: Option<&str>,
    stderr: &mut dyn Write,
) {
    let info = DryRunInfo {
        target,
        settings,
        apt,
        url,
    };
    write_stderr_line(stderr, info.display_text());
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
