//! End-to-end packaging pipeline.
//!
//! Both archives are fetched and verified before either is unpacked. The
//! package is assembled in a temporary sibling of the output directory and
//! only renamed into place once it is complete, so a failure at any step
//! leaves no partial package behind.

use crate::artefact::catalogue::{ArtifactPair, select_artifacts};
use crate::artefact::download::{ArtefactDownloader, HttpDownloader};
use crate::artefact::extraction::{ArtefactExtractor, DebExtractor};
use crate::artefact::verification::fetch_and_verify;
use crate::command::{CommandExecutor, SystemCommandExecutor};
use crate::compiler_config::{CompilerConfig, emit_compiler_config};
use crate::error::{PackagerError, Result};
use crate::layout::{CopyPattern, PackageLayout, package};
use crate::output::{DryRunInfo, FlagSummary, success_message, write_stderr_line};
use crate::package_info::PackageInfo;
use crate::platform::PlatformDescriptor;
use crate::triplet::compute_triplet_name;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;
use tempfile::TempDir;

/// Inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PackagerConfig {
    /// Target platform.
    pub platform: PlatformDescriptor,
    /// Final package directory.
    pub output_dir: Utf8PathBuf,
    /// Replace an existing package at `output_dir`.
    pub replace_existing: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    /// The package at its final location.
    pub layout: PackageLayout,
    /// Compiler configuration pointing into the final location.
    pub compiler_config: CompilerConfig,
    /// Path of the written `package_info.json`.
    pub package_info: Utf8PathBuf,
}

/// Run the pipeline with the production downloader, extractor, and
/// command executor.
///
/// # Errors
///
/// See [`run_pipeline`].
pub fn run_with_defaults(config: &PackagerConfig, stderr: &mut dyn Write) -> Result<PackageOutcome> {
    run_pipeline(
        config,
        &HttpDownloader,
        &DebExtractor,
        &SystemCommandExecutor,
        stderr,
    )
}

/// Fetch, verify, extract, and package GLib for `config.platform`.
///
/// # Errors
///
/// Returns [`PackagerError::UnsupportedArchitecture`] if the platform has no
/// artefacts, and otherwise fails as [`package_artifacts`] does.
pub fn run_pipeline(
    config: &PackagerConfig,
    downloader: &dyn ArtefactDownloader,
    extractor: &dyn ArtefactExtractor,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<PackageOutcome> {
    let artifacts = select_artifacts(config.platform.cpu_arch)?;
    package_artifacts(config, &artifacts, downloader, extractor, executor, stderr)
}

/// Fetch, verify, extract, and package an already-selected artefact pair.
///
/// # Errors
///
/// Returns [`PackagerError::OutputExists`] if the output directory already
/// holds files and `replace_existing` is not set, and otherwise propagates
/// the first failure of any stage.
pub fn package_artifacts(
    config: &PackagerConfig,
    artifacts: &ArtifactPair,
    downloader: &dyn ArtefactDownloader,
    extractor: &dyn ArtefactExtractor,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<PackageOutcome> {
    let output_dir = absolute_utf8(&config.output_dir)?;
    ensure_output_available(&output_dir, config.replace_existing)?;

    let archives = fetch_all(config, artifacts, downloader, stderr)?;

    let extracted = tempfile::Builder::new().prefix("glib-extract-").tempdir()?;
    let extracted_root = utf8_dir(&extracted)?;
    for archive in &archives {
        extractor.extract(archive, extracted_root.as_std_path())?;
    }
    drop(archives);

    let parent = output_dir.parent().unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent)?;
    let staging = tempfile::Builder::new()
        .prefix(".glib-package-")
        .tempdir_in(parent)?;
    let staging_root = utf8_dir(&staging)?;

    if !config.quiet {
        write_stderr_line(stderr, format!("Packaging for {}...", config.platform));
    }
    let staged_layout = package(&extracted_root, &staging_root, &config.platform, executor)?;
    let compiler_config = emit_compiler_config(&staged_layout, &config.platform, executor)?
        .rebased(&staging_root, &output_dir);
    let layout = staged_layout.relocated(&output_dir);

    PackageInfo::new(&config.platform, artifacts, &layout, compiler_config.clone())
        .write_to(&staging_root)?;

    publish(staging, &output_dir)?;
    log::info!("package published to {output_dir}");

    if !config.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(
            stderr,
            success_message(layout.library_files.len(), &layout.root),
        );
        write_stderr_line(stderr, FlagSummary::new(&compiler_config).display_text());
    }

    Ok(PackageOutcome {
        package_info: layout.root.join(crate::package_info::PACKAGE_INFO_FILE),
        layout,
        compiler_config,
    })
}

/// Describe what [`run_pipeline`] would do without fetching or writing
/// anything.
///
/// # Errors
///
/// Returns [`PackagerError::UnsupportedArchitecture`] if the platform has no
/// artefacts.
pub fn run_dry(
    config: &PackagerConfig,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<()> {
    let artifacts = select_artifacts(config.platform.cpu_arch)?;
    let triplet = compute_triplet_name(&config.platform, !config.platform.is_linux(), executor);
    let info = DryRunInfo {
        platform: &config.platform,
        artifacts: &artifacts,
        triplet: &triplet,
        copy_pattern: CopyPattern::for_platform(&config.platform).as_glob(),
        output_dir: &config.output_dir,
        replace_existing: config.replace_existing,
    };
    write_stderr_line(stderr, info.display_text());
    Ok(())
}

fn fetch_all(
    config: &PackagerConfig,
    artifacts: &ArtifactPair,
    downloader: &dyn ArtefactDownloader,
    stderr: &mut dyn Write,
) -> Result<Vec<Vec<u8>>> {
    artifacts
        .iter()
        .map(|spec| {
            if !config.quiet {
                write_stderr_line(stderr, format!("Fetching {}...", spec.url));
            }
            fetch_and_verify(downloader, spec)
        })
        .collect()
}

/// Fail if `output_dir` already holds something and may not be replaced.
fn ensure_output_available(output_dir: &Utf8Path, replace_existing: bool) -> Result<()> {
    if replace_existing || !is_occupied(output_dir)? {
        return Ok(());
    }
    Err(PackagerError::OutputExists {
        path: output_dir.to_owned(),
    })
}

fn is_occupied(path: &Utf8Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(fs::read_dir(path)?.next().is_some()),
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Move the staged package onto `output_dir`.
///
/// Any previous package is first moved into a hidden sibling directory and
/// only deleted once the staged package is in place. If the final rename
/// fails the previous package is moved back.
fn publish(staging: TempDir, output_dir: &Utf8Path) -> Result<()> {
    let retired = retire_existing(output_dir)?;
    if let Err(err) = fs::rename(staging.path(), output_dir) {
        if let Some((_guard, previous)) = &retired {
            if let Err(restore) = fs::rename(previous, output_dir) {
                log::error!("could not restore previous package from {}: {restore}", previous.display());
            }
        }
        return Err(err.into());
    }
    // The directory now lives at `output_dir`; stop the guard deleting it.
    let _kept = staging.keep();
    Ok(())
}

/// Move an existing `output_dir` aside, returning the guard that deletes it
/// and the path it now lives at.
fn retire_existing(output_dir: &Utf8Path) -> Result<Option<(TempDir, std::path::PathBuf)>> {
    match fs::symlink_metadata(output_dir) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let parent = output_dir.parent().unwrap_or(Utf8Path::new("."));
    let guard = tempfile::Builder::new()
        .prefix(".glib-package-old-")
        .tempdir_in(parent)?;
    let previous = guard.path().join("previous");
    fs::rename(output_dir, &previous)?;
    Ok(Some((guard, previous)))
}

fn utf8_dir(dir: &TempDir) -> Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(dir.path().to_path_buf()).map_err(|e| PackagerError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })
}

fn absolute_utf8(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let absolute = std::path::absolute(path)?;
    Utf8PathBuf::try_from(absolute).map_err(|e| PackagerError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
