//! Machine-readable description of a finished package.
//!
//! `package_info.json` sits at the package root and records where the
//! contents came from alongside the compiler configuration, so consumers do
//! not have to query `pkg-config` again.

use crate::artefact::catalogue::{ArtifactPair, BUILD_VERSION, PACKAGE_VERSION};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::compiler_config::CompilerConfig;
use crate::error::Result;
use crate::layout::PackageLayout;
use crate::platform::PlatformDescriptor;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// File name of the metadata document.
pub const PACKAGE_INFO_FILE: &str = "package_info.json";

/// Library name recorded in the metadata.
pub const PACKAGE_NAME: &str = "glib";

/// One downloaded archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceArchive {
    /// URL the archive was fetched from.
    pub url: String,
    /// Verified SHA-256 digest.
    pub sha256: Sha256Digest,
}

/// Contents of `package_info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Library name.
    pub name: String,
    /// Upstream version.
    pub version: String,
    /// Ubuntu build revision.
    pub build_revision: String,
    /// Platform the package targets.
    pub platform: PlatformDescriptor,
    /// Multiarch triplet used to locate the libraries.
    pub triplet: String,
    /// The runtime and development archives, in that order.
    pub sources: Vec<SourceArchive>,
    /// Compiler and linker configuration.
    pub compiler_config: CompilerConfig,
}

impl PackageInfo {
    /// Assemble the metadata for a finished package.
    #[must_use]
    pub fn new(
        platform: &PlatformDescriptor,
        artifacts: &ArtifactPair,
        layout: &PackageLayout,
        compiler_config: CompilerConfig,
    ) -> Self {
        Self {
            name: PACKAGE_NAME.to_owned(),
            version: PACKAGE_VERSION.to_owned(),
            build_revision: BUILD_VERSION.to_owned(),
            platform: platform.clone(),
            triplet: layout.triplet.clone(),
            sources: artifacts
                .iter()
                .map(|spec| SourceArchive {
                    url: spec.url.clone(),
                    sha256: spec.expected_checksum.clone(),
                })
                .collect(),
            compiler_config,
        }
    }

    /// Write the metadata as pretty-printed JSON into `package_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn write_to(&self, package_root: &Utf8Path) -> Result<Utf8PathBuf> {
        let path = package_root.join(PACKAGE_INFO_FILE);
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Read the metadata from `package_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read_from(package_root: &Utf8Path) -> Result<Self> {
        let contents = fs::read_to_string(package_root.join(PACKAGE_INFO_FILE))?;
        Ok(serde_json::from_str(&contents)?)
    }
}
