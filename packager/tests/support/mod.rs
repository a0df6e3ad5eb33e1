//! Test support utilities for packager behavioural tests.
//!
//! This module provides in-memory stand-ins for the network and for
//! `pkg-config` and the compiler driver, plus an artefact pair whose digests match the fixture
//! archives from `glib_packager::test_utils`.

use glib_packager::artefact::catalogue::{ArtifactPair, ArtifactSpec, SupportedArch};
use glib_packager::artefact::download::{ArtefactDownloader, DownloadError};
use glib_packager::artefact::sha256_digest::Sha256Digest;
use glib_packager::command::{CommandExecutor, Invocation};
use glib_packager::error::{PackagerError, Result};
use glib_packager::platform::{CpuArch, PlatformDescriptor};
use glib_packager::test_utils::{glib_development_deb, glib_runtime_deb, stdout_output};
use std::cell::RefCell;
use std::collections::HashMap;
use std::process::Output;

/// URL the fixture runtime archive is served from.
pub const RUNTIME_URL: &str = "http://archive.test/libglib2.0-0.deb";

/// URL the fixture development archive is served from.
pub const DEVELOPMENT_URL: &str = "http://archive.test/libglib2.0-dev.deb";

/// Serves archives from memory and counts requests.
#[derive(Default)]
pub struct InMemoryArchive {
    files: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl InMemoryArchive {
    /// Publish `bytes` at `url`.
    pub fn publish(&mut self, url: &str, bytes: Vec<u8>) {
        self.files.insert(url.to_owned(), bytes);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ArtefactDownloader for InMemoryArchive {
    fn download(&self, url: &str) -> std::result::Result<Vec<u8>, DownloadError> {
        self.requests.borrow_mut().push(url.to_owned());
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_owned(),
            })
    }
}

/// Answers `pkg-config` with the gio-unix link line and records every call.
///
/// `cc -dumpmachine` is answered only once a compiler triplet is set.
#[derive(Default)]
pub struct ToolchainStub {
    calls: RefCell<Vec<Invocation>>,
    compiler_triplet: Option<String>,
}

impl ToolchainStub {
    /// Make `cc -dumpmachine` report `triplet`.
    pub fn with_compiler_triplet(triplet: impl Into<String>) -> Self {
        Self {
            compiler_triplet: Some(triplet.into()),
            ..Self::default()
        }
    }

    /// Programs invoked so far, in order.
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.program.clone())
            .collect()
    }
}

impl CommandExecutor for ToolchainStub {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        self.calls.borrow_mut().push(invocation.clone());
        match (invocation.program.as_str(), &self.compiler_triplet) {
            ("pkg-config", _) => Ok(stdout_output("-lgio-2.0 -lgobject-2.0 -lglib-2.0\n")),
            ("cc", Some(triplet)) => Ok(stdout_output(&format!("{triplet}\n"))),
            (other, _) => Err(PackagerError::StubMismatch {
                message: format!("unexpected invocation of {other}"),
            }),
        }
    }
}

/// A supported architecture other than the build host's, so the triplet is
/// always the canonical one.
pub fn cross_arch() -> CpuArch {
    if CpuArch::host() == Some(CpuArch::Armv8) {
        CpuArch::Armv7hf
    } else {
        CpuArch::Armv8
    }
}

/// The build host, when it is a Linux machine with recorded archives.
pub fn supported_linux_host() -> Option<(PlatformDescriptor, SupportedArch)> {
    let host = PlatformDescriptor::host().filter(PlatformDescriptor::is_linux)?;
    let arch = SupportedArch::try_from(host.cpu_arch).ok()?;
    Some((host, arch))
}

/// Fixture archives for `triplet` and the artefact pair recording their
/// digests.
pub fn fixture_archives(arch: SupportedArch, triplet: &str) -> (ArtifactPair, InMemoryArchive) {
    let runtime = glib_runtime_deb(triplet).expect("build runtime deb");
    let development = glib_development_deb(triplet).expect("build development deb");
    let pair = ArtifactPair {
        arch,
        runtime: ArtifactSpec {
            url: RUNTIME_URL.to_owned(),
            expected_checksum: Sha256Digest::of(&runtime),
        },
        development: ArtifactSpec {
            url: DEVELOPMENT_URL.to_owned(),
            expected_checksum: Sha256Digest::of(&development),
        },
    };
    let mut archive = InMemoryArchive::default();
    archive.publish(RUNTIME_URL, runtime);
    archive.publish(DEVELOPMENT_URL, development);
    (pair, archive)
}
