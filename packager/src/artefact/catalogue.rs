//! The fixed table of GLib artefacts published for each architecture.
//!
//! Ubuntu ships the runtime and development halves of GLib as separate
//! packages, so every build fetches exactly two archives. Only three
//! architectures carry recorded checksums; [`SupportedArch`] is the closed
//! set of them and every other [`CpuArch`] is rejected before any network
//! access happens.

use super::sha256_digest::Sha256Digest;
use crate::error::{PackagerError, Result};
use crate::platform::CpuArch;
use serde::Serialize;
use std::fmt;

/// Upstream version of the packaged library.
pub const PACKAGE_VERSION: &str = "2.56.4";

/// Debian revision of the bionic-updates build.
pub const BUILD_VERSION: &str = "0ubuntu0.18.04.6";

/// Name of the runtime package; also the package the copyright file lives
/// under.
pub const RUNTIME_PACKAGE: &str = "libglib2.0-0";

/// Name of the development (headers and pkg-config) package.
pub const DEVELOPMENT_PACKAGE: &str = "libglib2.0-dev";

/// Mirror serving the primary architecture.
const PRIMARY_MIRROR: &str = "http://us.archive.ubuntu.com/ubuntu/pool/main/g/glib2.0";

/// Mirror serving every secondary architecture.
const PORTS_MIRROR: &str = "http://ports.ubuntu.com/ubuntu-ports/pool/main/g/glib2.0";

/// The architectures with recorded artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SupportedArch {
    /// 64-bit x86, served from the primary archive.
    #[serde(rename = "x86_64")]
    X86_64,
    /// 64-bit ARM, served from the ports archive.
    #[serde(rename = "armv8")]
    Armv8,
    /// 32-bit hard-float ARM, served from the ports archive.
    #[serde(rename = "armv7hf")]
    Armv7hf,
}

impl SupportedArch {
    /// Every supported architecture, in table order.
    pub const ALL: [Self; 3] = [Self::X86_64, Self::Armv8, Self::Armv7hf];

    /// Return the general architecture this entry corresponds to.
    #[must_use]
    pub const fn cpu_arch(self) -> CpuArch {
        match self {
            Self::X86_64 => CpuArch::X86_64,
            Self::Armv8 => CpuArch::Armv8,
            Self::Armv7hf => CpuArch::Armv7hf,
        }
    }

    const fn mirror(self) -> &'static str {
        match self {
            Self::X86_64 => PRIMARY_MIRROR,
            Self::Armv8 | Self::Armv7hf => PORTS_MIRROR,
        }
    }

    /// Recorded `(runtime, development)` SHA-256 digests.
    const fn checksums(self) -> (&'static str, &'static str) {
        match self {
            Self::X86_64 => (
                "d83313ca3bd99eec1934f2da1c7cddabe9acf42fa0914eb7af778139db216da6",
                "dae746eebff565fd183a29b8c1b9d26179f07d897541b0ae1ee8dbe9beca8589",
            ),
            Self::Armv8 => (
                "c16be203f547a977326e13cd6f3935022679f9fcdaa918bdcd315e820b33e5d0",
                "c1e66bf2e5e5d8f658c0e4362c965741d950425608aecd51518f26ffe040f6da",
            ),
            Self::Armv7hf => (
                "a795e2277aaa81c05b6c507f39fba04ddddafe9a9acccda357034ff05da4846f",
                "ee2a5443bf5a9d912ff22978a61224ef6856f125de5b81d95721a5af37a088e8",
            ),
        }
    }

    fn expected_names() -> String {
        Self::ALL
            .iter()
            .map(|arch| arch.cpu_arch().as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TryFrom<CpuArch> for SupportedArch {
    type Error = PackagerError;

    fn try_from(arch: CpuArch) -> Result<Self> {
        match arch {
            CpuArch::X86_64 => Ok(Self::X86_64),
            CpuArch::Armv8 => Ok(Self::Armv8),
            CpuArch::Armv7hf => Ok(Self::Armv7hf),
            CpuArch::X86
            | CpuArch::Armv7
            | CpuArch::Ppc32
            | CpuArch::Ppc64le
            | CpuArch::S390x => Err(PackagerError::UnsupportedArchitecture {
                value: arch.as_str().to_owned(),
                expected: Self::expected_names(),
            }),
        }
    }
}

impl fmt::Display for SupportedArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cpu_arch().as_str())
    }
}

/// Location and expected digest of one downloadable archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSpec {
    /// Download URL.
    pub url: String,
    /// Digest the downloaded bytes must hash to.
    pub expected_checksum: Sha256Digest,
}

/// The runtime and development archives for one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPair {
    /// The architecture the pair was selected for.
    pub arch: SupportedArch,
    /// The shared-library package.
    pub runtime: ArtifactSpec,
    /// The headers and pkg-config package.
    pub development: ArtifactSpec,
}

impl ArtifactPair {
    /// Iterate over the two archives in fetch order.
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactSpec> {
        [&self.runtime, &self.development].into_iter()
    }
}

/// Build the download URL for `package` on `arch`.
///
/// # Examples
///
/// ```
/// use glib_packager::artefact::catalogue::{SupportedArch, artefact_url};
///
/// let url = artefact_url(SupportedArch::Armv8, "libglib2.0-0");
/// assert!(url.starts_with("http://ports.ubuntu.com/"));
/// assert!(url.ends_with("libglib2.0-0_2.56.4-0ubuntu0.18.04.6_arm64.deb"));
/// ```
#[must_use]
pub fn artefact_url(arch: SupportedArch, package: &str) -> String {
    format!(
        "{}/{package}_{PACKAGE_VERSION}-{BUILD_VERSION}_{}.deb",
        arch.mirror(),
        arch.cpu_arch().vendor_token()
    )
}

/// Select the `(runtime, development)` artefacts for `arch`.
///
/// # Errors
///
/// Returns [`PackagerError::UnsupportedArchitecture`] for any architecture
/// outside `x86_64`, `armv8`, and `armv7hf`.
pub fn select_artifacts(arch: CpuArch) -> Result<ArtifactPair> {
    let supported = SupportedArch::try_from(arch)?;
    let (runtime_sha, development_sha) = supported.checksums();
    Ok(ArtifactPair {
        arch: supported,
        runtime: ArtifactSpec {
            url: artefact_url(supported, RUNTIME_PACKAGE),
            expected_checksum: Sha256Digest::try_from(runtime_sha)?,
        },
        development: ArtifactSpec {
            url: artefact_url(supported, DEVELOPMENT_PACKAGE),
            expected_checksum: Sha256Digest::try_from(development_sha)?,
        },
    })
}
