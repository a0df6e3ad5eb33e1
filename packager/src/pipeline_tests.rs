//! Unit tests for pipeline orchestration.
//!
//! Downloads are served from in-memory fixture archives whose digests are
//! recorded in a test artefact pair, so the whole fetch, verify, extract,
//! and package sequence runs against a temporary directory.

use super::{PackagerConfig, package_artifacts, publish, run_dry, run_pipeline};
use crate::artefact::catalogue::{ArtifactPair, ArtifactSpec, SupportedArch};
use crate::artefact::download::MockArtefactDownloader;
use crate::artefact::extraction::MockArtefactExtractor;
use crate::artefact::sha256_digest::Sha256Digest;
use crate::command::{CommandExecutor, Invocation};
use crate::compiler_config::RELATIVE_INCLUDE_DIRS;
use crate::error::{PackagerError, Result};
use crate::package_info::PackageInfo;
use crate::platform::{CpuArch, OperatingSystem, PlatformDescriptor};
use crate::test_utils::{glib_development_deb, glib_runtime_deb, stdout_output};
use crate::triplet::canonical_triplet;
use camino::{Utf8Path, Utf8PathBuf};
use rstest::{fixture, rstest};
use std::cell::RefCell;
use std::process::Output;
use tempfile::TempDir;

const RUNTIME_URL: &str = "http://example.test/libglib2.0-0.deb";
const DEVELOPMENT_URL: &str = "http://example.test/libglib2.0-dev.deb";
const PKG_CONFIG_LIBS: &str = "-lgio-2.0 -lgobject-2.0 -lglib-2.0\n";

/// Answers `pkg-config` with a fixed link line and `cc -dumpmachine` with
/// the host's multiarch triplet, recording every call.
///
/// The staged package root is a random temporary directory, so calls are
/// matched by program name rather than by full invocation.
#[derive(Default)]
struct RecordingExecutor {
    calls: RefCell<Vec<Invocation>>,
}

impl RecordingExecutor {
    fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.program.clone())
            .collect()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        self.calls.borrow_mut().push(invocation.clone());
        match invocation.program.as_str() {
            "pkg-config" => Ok(stdout_output(PKG_CONFIG_LIBS)),
            "cc" if invocation.args == ["-dumpmachine"] => {
                let arch = CpuArch::host().ok_or_else(|| PackagerError::StubMismatch {
                    message: "no host architecture".to_owned(),
                })?;
                let triplet = canonical_triplet(OperatingSystem::Linux, arch);
                Ok(stdout_output(&format!("{triplet}\n")))
            }
            other => Err(PackagerError::StubMismatch {
                message: format!("unexpected invocation of {other}"),
            }),
        }
    }
}

/// A supported architecture other than the build host's, so the triplet is
/// never introspected.
fn cross_arch() -> CpuArch {
    if CpuArch::host() == Some(CpuArch::Armv8) {
        CpuArch::Armv7hf
    } else {
        CpuArch::Armv8
    }
}

struct Fixture {
    _dir: TempDir,
    output_dir: Utf8PathBuf,
    arch: CpuArch,
    runtime: Vec<u8>,
    development: Vec<u8>,
}

impl Fixture {
    fn config(&self, os: OperatingSystem) -> PackagerConfig {
        PackagerConfig {
            platform: PlatformDescriptor::new(os, self.arch),
            output_dir: self.output_dir.clone(),
            replace_existing: false,
            quiet: true,
        }
    }

    fn artifacts(&self) -> ArtifactPair {
        ArtifactPair {
            arch: SupportedArch::try_from(self.arch).expect("supported arch"),
            runtime: ArtifactSpec {
                url: RUNTIME_URL.to_owned(),
                expected_checksum: Sha256Digest::of(&self.runtime),
            },
            development: ArtifactSpec {
                url: DEVELOPMENT_URL.to_owned(),
                expected_checksum: Sha256Digest::of(&self.development),
            },
        }
    }

    fn downloader(&self) -> MockArtefactDownloader {
        let runtime = self.runtime.clone();
        let development = self.development.clone();
        let mut downloader = MockArtefactDownloader::new();
        downloader
            .expect_download()
            .times(2)
            .returning(move |url| match url {
                RUNTIME_URL => Ok(runtime.clone()),
                _ => Ok(development.clone()),
            });
        downloader
    }

    fn parent_entries(&self) -> Vec<String> {
        let parent = self.output_dir.parent().expect("output parent");
        let mut names: Vec<String> = std::fs::read_dir(parent)
            .expect("read parent")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[fixture]
fn packaging() -> Fixture {
    packaging_for(cross_arch())
}

fn packaging_for(arch: CpuArch) -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8Path::from_path(dir.path()).expect("utf-8 temp dir").to_owned();
    let triplet = canonical_triplet(OperatingSystem::Linux, arch);
    Fixture {
        output_dir: root.join("glib"),
        _dir: dir,
        arch,
        runtime: glib_runtime_deb(&triplet).expect("runtime deb"),
        development: glib_development_deb(&triplet).expect("development deb"),
    }
}

fn run_fixture(
    packaging: &Fixture,
    config: &PackagerConfig,
    executor: &RecordingExecutor,
) -> Result<super::PackageOutcome> {
    let extractor = crate::artefact::extraction::DebExtractor;
    let mut stderr = Vec::new();
    package_artifacts(
        config,
        &packaging.artifacts(),
        &packaging.downloader(),
        &extractor,
        executor,
        &mut stderr,
    )
}

#[rstest]
fn linux_target_is_packaged_end_to_end(packaging: Fixture) {
    let executor = RecordingExecutor::default();
    let config = packaging.config(OperatingSystem::Linux);

    let outcome = run_fixture(&packaging, &config, &executor).expect("pipeline");

    let lib = packaging.output_dir.join("lib");
    assert!(lib.join("libglib-2.0.so.0.5600.4").is_file());
    assert!(lib.join("libgio-2.0.so.0.5600.4").is_file());
    assert!(packaging.output_dir.join("include/glib-2.0/glib.h").is_file());
    assert!(packaging.output_dir.join("copyright").is_file());
    assert_eq!(
        outcome.compiler_config.library_names,
        ["gio-2.0", "gobject-2.0", "glib-2.0"]
    );
    assert_eq!(outcome.compiler_config.library_dirs, [lib]);
    assert!(
        outcome
            .compiler_config
            .include_dirs
            .iter()
            .all(|dir| dir.starts_with(&packaging.output_dir))
    );
    assert_eq!(executor.programs(), ["pkg-config"]);
    assert_eq!(packaging.parent_entries(), ["glib"]);
}

#[test]
fn native_linux_package_matches_layout() {
    let Some(host) = PlatformDescriptor::host().filter(PlatformDescriptor::is_linux) else {
        return;
    };
    if SupportedArch::try_from(host.cpu_arch).is_err() {
        return;
    }
    let packaging = packaging_for(host.cpu_arch);
    let executor = RecordingExecutor::default();
    let config = packaging.config(OperatingSystem::Linux);
    assert!(config.platform.is_native());

    let outcome = run_fixture(&packaging, &config, &executor).expect("pipeline");

    let root = &packaging.output_dir;
    let gio: Vec<_> = glob::glob(root.join("lib/libgio-2.0.so*").as_str())
        .expect("valid glob")
        .collect();
    assert!(!gio.is_empty());
    assert!(root.join("include/glib-2.0").is_dir());
    assert!(root.join("copyright").is_file());
    let expected: Vec<Utf8PathBuf> = RELATIVE_INCLUDE_DIRS
        .iter()
        .map(|dir| root.join(dir))
        .collect();
    assert_eq!(outcome.compiler_config.include_dirs, expected);
    assert_eq!(
        outcome.layout.triplet,
        canonical_triplet(OperatingSystem::Linux, host.cpu_arch)
    );
    assert_eq!(executor.programs(), ["cc", "pkg-config"]);
}

#[rstest]
fn pkg_config_runs_against_staged_package(packaging: Fixture) {
    let executor = RecordingExecutor::default();
    let config = packaging.config(OperatingSystem::Linux);

    run_fixture(&packaging, &config, &executor).expect("pipeline");

    let calls = executor.calls.borrow();
    let (key, value) = calls
        .first()
        .and_then(|call| call.env.first())
        .expect("PKG_CONFIG_PATH set");
    assert_eq!(key, "PKG_CONFIG_PATH");
    assert!(value.contains(".glib-package-"));
    assert!(value.ends_with("lib/pkgconfig"));
}

#[rstest]
fn package_info_is_written_at_final_location(packaging: Fixture) {
    let executor = RecordingExecutor::default();
    let config = packaging.config(OperatingSystem::Linux);

    let outcome = run_fixture(&packaging, &config, &executor).expect("pipeline");

    assert_eq!(outcome.package_info, packaging.output_dir.join("package_info.json"));
    let info = PackageInfo::read_from(&packaging.output_dir).expect("package info");
    assert_eq!(info.platform, config.platform);
    assert_eq!(info.compiler_config, outcome.compiler_config);
    assert_eq!(info.sources.len(), 2);
}

#[rstest]
fn non_linux_target_gets_headers_only(packaging: Fixture) {
    let executor = RecordingExecutor::default();
    let config = packaging.config(OperatingSystem::Other);

    let outcome = run_fixture(&packaging, &config, &executor).expect("pipeline");

    assert!(outcome.compiler_config.library_names.is_empty());
    assert_eq!(
        outcome.layout.library_files,
        [Utf8PathBuf::from("glib-2.0/include/glibconfig.h")]
    );
    assert!(!packaging.output_dir.join("lib/libglib-2.0.so.0.5600.4").exists());
    assert!(executor.programs().is_empty());
}

#[rstest]
fn tampered_archive_stops_before_extraction(packaging: Fixture) {
    let mut artifacts = packaging.artifacts();
    artifacts.development.expected_checksum = Sha256Digest::of(b"something else");
    let mut extractor = MockArtefactExtractor::new();
    extractor.expect_extract().never();
    let executor = RecordingExecutor::default();

    let err = package_artifacts(
        &packaging.config(OperatingSystem::Linux),
        &artifacts,
        &packaging.downloader(),
        &extractor,
        &executor,
        &mut Vec::new(),
    )
    .expect_err("mismatch");

    match err {
        PackagerError::ChecksumMismatch { url, .. } => assert_eq!(url, DEVELOPMENT_URL),
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }
    assert!(!packaging.output_dir.exists());
}

#[rstest]
fn real_table_rejects_fixture_archives(packaging: Fixture) {
    let mut downloader = MockArtefactDownloader::new();
    let runtime = packaging.runtime.clone();
    downloader
        .expect_download()
        .times(1)
        .returning(move |_| Ok(runtime.clone()));
    let mut extractor = MockArtefactExtractor::new();
    extractor.expect_extract().never();

    let err = run_pipeline(
        &packaging.config(OperatingSystem::Linux),
        &downloader,
        &extractor,
        &RecordingExecutor::default(),
        &mut Vec::new(),
    )
    .expect_err("mismatch");

    assert!(matches!(err, PackagerError::ChecksumMismatch { .. }));
}

#[rstest]
#[case::x86(CpuArch::X86)]
#[case::s390x(CpuArch::S390x)]
#[case::armv7(CpuArch::Armv7)]
fn unsupported_arch_fails_before_download(packaging: Fixture, #[case] arch: CpuArch) {
    let mut downloader = MockArtefactDownloader::new();
    downloader.expect_download().never();
    let mut config = packaging.config(OperatingSystem::Linux);
    config.platform.cpu_arch = arch;

    let err = run_pipeline(
        &config,
        &downloader,
        &MockArtefactExtractor::new(),
        &RecordingExecutor::default(),
        &mut Vec::new(),
    )
    .expect_err("unsupported");

    assert!(matches!(err, PackagerError::UnsupportedArchitecture { .. }));
}

#[rstest]
fn extraction_failure_leaves_nothing_behind(packaging: Fixture) {
    let mut extractor = MockArtefactExtractor::new();
    extractor
        .expect_extract()
        .returning(|_, _| Err(crate::artefact::extraction::ExtractionError::MissingDataMember));

    let err = package_artifacts(
        &packaging.config(OperatingSystem::Linux),
        &packaging.artifacts(),
        &packaging.downloader(),
        &extractor,
        &RecordingExecutor::default(),
        &mut Vec::new(),
    )
    .expect_err("extraction failure");

    assert!(matches!(err, PackagerError::Extraction(_)));
    assert!(packaging.parent_entries().is_empty());
}

#[rstest]
fn existing_output_requires_replace(packaging: Fixture) {
    std::fs::create_dir_all(&packaging.output_dir).expect("create output");
    std::fs::write(packaging.output_dir.join("stale"), b"old").expect("write stale file");
    let mut downloader = MockArtefactDownloader::new();
    downloader.expect_download().never();

    let err = package_artifacts(
        &packaging.config(OperatingSystem::Linux),
        &packaging.artifacts(),
        &downloader,
        &MockArtefactExtractor::new(),
        &RecordingExecutor::default(),
        &mut Vec::new(),
    )
    .expect_err("occupied output");

    assert!(matches!(err, PackagerError::OutputExists { .. }));
    assert!(packaging.output_dir.join("stale").is_file());
}

#[rstest]
fn replace_swaps_in_fresh_package(packaging: Fixture) {
    std::fs::create_dir_all(&packaging.output_dir).expect("create output");
    std::fs::write(packaging.output_dir.join("stale"), b"old").expect("write stale file");
    let mut config = packaging.config(OperatingSystem::Linux);
    config.replace_existing = true;

    run_fixture(&packaging, &config, &RecordingExecutor::default()).expect("pipeline");

    assert!(!packaging.output_dir.join("stale").exists());
    assert!(packaging.output_dir.join("package_info.json").is_file());
    assert_eq!(packaging.parent_entries(), ["glib"]);
}

#[rstest]
fn failed_publish_restores_previous_package(packaging: Fixture) {
    std::fs::create_dir_all(&packaging.output_dir).expect("create output");
    std::fs::write(packaging.output_dir.join("stale"), b"old").expect("write stale file");
    let parent = packaging.output_dir.parent().expect("output parent");
    let staging = tempfile::Builder::new()
        .prefix(".glib-package-")
        .tempdir_in(parent)
        .expect("staging dir");
    std::fs::remove_dir(staging.path()).expect("remove staging dir");

    let err = publish(staging, &packaging.output_dir).expect_err("rename fails");

    assert!(matches!(err, PackagerError::Io(_)));
    assert_eq!(
        std::fs::read(packaging.output_dir.join("stale")).expect("read stale file"),
        b"old"
    );
    assert_eq!(packaging.parent_entries(), ["glib"]);
}

#[rstest]
fn empty_output_directory_is_reused(packaging: Fixture) {
    std::fs::create_dir_all(&packaging.output_dir).expect("create output");

    run_fixture(
        &packaging,
        &packaging.config(OperatingSystem::Linux),
        &RecordingExecutor::default(),
    )
    .expect("pipeline");

    assert!(packaging.output_dir.join("copyright").is_file());
}

#[rstest]
fn progress_is_reported_unless_quiet(packaging: Fixture) {
    let mut config = packaging.config(OperatingSystem::Linux);
    config.quiet = false;
    let mut stderr = Vec::new();

    package_artifacts(
        &config,
        &packaging.artifacts(),
        &packaging.downloader(),
        &crate::artefact::extraction::DebExtractor,
        &RecordingExecutor::default(),
        &mut stderr,
    )
    .expect("pipeline");

    let text = String::from_utf8(stderr).expect("utf-8 output");
    assert!(text.contains(&format!("Fetching {RUNTIME_URL}")));
    assert!(text.contains("Packaged GLib"));
    assert!(text.contains("LIBS:"));
}

#[rstest]
fn dry_run_touches_nothing(packaging: Fixture) {
    let mut stderr = Vec::new();

    run_dry(
        &packaging.config(OperatingSystem::Other),
        &RecordingExecutor::default(),
        &mut stderr,
    )
    .expect("dry run");

    let text = String::from_utf8(stderr).expect("utf-8 output");
    assert!(text.contains("Dry run"));
    assert!(text.contains("Library pattern: *.h"));
    assert!(!packaging.output_dir.exists());
}
