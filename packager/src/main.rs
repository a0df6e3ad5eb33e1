//! GLib packager CLI entrypoint.
//!
//! This binary fetches the Ubuntu GLib runtime and development packages,
//! verifies them, and repackages them for native build toolchains. After
//! packaging, it prints the compiler and linker flags for the result.

use clap::Parser;
use glib_packager::cli::{Cli, Command, PackageArgs};
use glib_packager::command::SystemCommandExecutor;
use glib_packager::dirs::{BaseDirs, SystemBaseDirs, default_output_dir};
use glib_packager::error::{PackagerError, Result};
use glib_packager::output::write_stderr_line;
use glib_packager::pipeline::{PackagerConfig, run_dry, run_with_defaults};
use glib_packager::resolve::run_resolve;
use log::LevelFilter;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Some(Command::Resolve(args)) => run_resolve(args, stdout),
        Some(Command::Package(_)) | None => run_package(cli.package_args(), stderr),
    }
}

fn run_package(args: &PackageArgs, stderr: &mut dyn Write) -> Result<()> {
    let dirs = SystemBaseDirs::new();
    let config = packager_config(args, dirs.as_ref().map(|d| d as &dyn BaseDirs))?;

    // Dry-run mode: show what would be done without side effects
    if args.dry_run {
        return run_dry(&config, &SystemCommandExecutor, stderr);
    }

    run_with_defaults(&config, stderr).map(|_| ())
}

/// Resolves CLI arguments into a pipeline configuration.
fn packager_config(args: &PackageArgs, dirs: Option<&dyn BaseDirs>) -> Result<PackagerConfig> {
    let platform = args.platform()?;
    let output_dir = match &args.output {
        Some(dir) => dir.clone(),
        None => dirs
            .and_then(|d| default_output_dir(d, platform.cpu_arch))
            .ok_or(PackagerError::OutputDirUnavailable)?,
    };
    Ok(PackagerConfig {
        platform,
        output_dir,
        replace_existing: args.replace,
        quiet: args.quiet,
    })
}

fn log_level(args: &PackageArgs) -> LevelFilter {
    if args.quiet {
        return LevelFilter::Error;
    }
    match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(cli: &Cli) {
    let level = log_level(cli.package_args());
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()));

    // Disable log context except at higher log levels.
    if level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    // ureq and rustls are chatty below warn.
    if level < LevelFilter::Trace {
        builder
            .filter_module("ureq", LevelFilter::Warn)
            .filter_module("rustls", LevelFilter::Warn);
    }

    builder.init();
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}
