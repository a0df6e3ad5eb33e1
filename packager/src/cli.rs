//! CLI argument definitions for the GLib packager.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::error::Result;
use crate::platform::{CpuArch, OperatingSystem, PlatformDescriptor};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Fetch, verify, and repackage the Ubuntu GLib binary packages.
#[derive(Parser, Debug)]
#[command(name = "glib-packager")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch, verify, and repackage the Ubuntu GLib binary packages.\n\n",
    "The runtime and development packages of GLib 2.56.4 are downloaded from the ",
    "Ubuntu archive, checked against recorded SHA-256 digests, and unpacked into a ",
    "package with lib/, include/, and a package_info.json describing the compiler ",
    "and linker flags needed to build against it.\n\n",
    "Linux targets receive the shared libraries; every other target receives ",
    "headers only.",
))]
#[command(after_help = concat!(
    "SUPPORTED ARCHITECTURES:\n",
    "  x86_64     us.archive.ubuntu.com (amd64)\n",
    "  armv8      ports.ubuntu.com (arm64)\n",
    "  armv7hf    ports.ubuntu.com (armhf)\n\n",
    "EXAMPLES:\n",
    "  Package for the build host:\n",
    "    $ glib-packager\n\n",
    "  Package for a 64-bit ARM board into a chosen directory:\n",
    "    $ glib-packager --arch armv8 --output ./glib-arm64\n\n",
    "  Show the archives that would be fetched:\n",
    "    $ glib-packager resolve --arch armv7hf --json\n\n",
    "  Preview without downloading:\n",
    "    $ glib-packager --dry-run",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Package arguments (used when no subcommand is given).
    #[command(flatten)]
    pub package: PackageArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build a package (default when no subcommand given).
    Package(PackageArgs),

    /// Print the archives selected for an architecture.
    Resolve(ResolveArgs),
}

/// Arguments for the package command.
#[derive(Parser, Debug, Clone)]
pub struct PackageArgs {
    /// Target CPU architecture [default: build host].
    #[arg(short, long, value_name = "ARCH")]
    pub arch: Option<CpuArch>,

    /// Target operating system, `linux` or any other name [default: build host].
    #[arg(long, value_name = "OS")]
    pub os: Option<OperatingSystem>,

    /// Compiler driver used to query the host triplet, e.g. `gcc`.
    #[arg(long, value_name = "ID")]
    pub compiler: Option<String>,

    /// Package directory [default: platform-specific].
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<Utf8PathBuf>,

    /// Replace an existing package in the output directory.
    #[arg(long)]
    pub replace: bool,

    /// Show what would be fetched and exit without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl PackageArgs {
    /// Build the target platform, filling unset fields from the build host.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PackagerError::UnsupportedArchitecture`] if no
    /// architecture was given and the host's has no [`CpuArch`] equivalent.
    pub fn platform(&self) -> Result<PlatformDescriptor> {
        let arch = resolve_arch(self.arch)?;
        let os = self.os.unwrap_or_else(OperatingSystem::host);
        let platform = PlatformDescriptor::new(os, arch);
        Ok(match &self.compiler {
            Some(compiler) => platform.with_compiler(compiler.as_str()),
            None => platform,
        })
    }
}

/// Arguments for the resolve command.
#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    /// Target CPU architecture [default: build host].
    #[arg(short, long, value_name = "ARCH")]
    pub arch: Option<CpuArch>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ResolveArgs {
    /// The requested architecture, or the build host's.
    ///
    /// # Errors
    ///
    /// See [`PackageArgs::platform`].
    pub fn arch(&self) -> Result<CpuArch> {
        resolve_arch(self.arch)
    }
}

fn resolve_arch(requested: Option<CpuArch>) -> Result<CpuArch> {
    match requested.or_else(CpuArch::host) {
        Some(arch) => Ok(arch),
        None => std::env::consts::ARCH.parse(),
    }
}

impl Cli {
    /// Returns the effective package arguments.
    ///
    /// If a `Package` subcommand was provided, returns those arguments.
    /// Otherwise returns the flattened package arguments.
    #[must_use]
    pub fn package_args(&self) -> &PackageArgs {
        match &self.command {
            Some(Command::Package(args)) => args,
            Some(Command::Resolve(_)) | None => &self.package,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
