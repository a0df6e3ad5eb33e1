//! Target platform descriptors and architecture translation.
//!
//! A [`PlatformDescriptor`] is the only input the packager takes. The CPU
//! architecture names follow the build tool's settings vocabulary
//! (`x86_64`, `armv7hf`, `armv8`, ...); [`CpuArch::vendor_token`] translates
//! them to the Debian architecture names used in package filenames.

use crate::error::{PackagerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system of the target platform.
///
/// Only Linux receives compiled libraries; every other system is served
/// headers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    /// GNU/Linux.
    Linux,
    /// Any non-Linux system.
    Other,
}

impl OperatingSystem {
    /// Return the operating system of the build host.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    /// Return the lowercase name used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingSystem {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("linux") {
            Ok(Self::Linux)
        } else if s.trim().is_empty() {
            Err("operating system must not be empty".to_owned())
        } else {
            Ok(Self::Other)
        }
    }
}

/// CPU architecture of the target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpuArch {
    /// 64-bit x86.
    #[serde(rename = "x86_64")]
    X86_64,
    /// 32-bit x86.
    #[serde(rename = "x86")]
    X86,
    /// 32-bit ARMv7, soft float.
    #[serde(rename = "armv7")]
    Armv7,
    /// 32-bit ARMv7, hard float.
    #[serde(rename = "armv7hf")]
    Armv7hf,
    /// 64-bit ARMv8.
    #[serde(rename = "armv8")]
    Armv8,
    /// 32-bit PowerPC.
    #[serde(rename = "ppc32")]
    Ppc32,
    /// 64-bit little-endian PowerPC.
    #[serde(rename = "ppc64le")]
    Ppc64le,
    /// IBM Z.
    #[serde(rename = "s390x")]
    S390x,
}

impl CpuArch {
    /// Every architecture the descriptor can express.
    pub const ALL: [Self; 8] = [
        Self::X86_64,
        Self::X86,
        Self::Armv7,
        Self::Armv7hf,
        Self::Armv8,
        Self::Ppc32,
        Self::Ppc64le,
        Self::S390x,
    ];

    /// Return the settings name of the architecture.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::X86 => "x86",
            Self::Armv7 => "armv7",
            Self::Armv7hf => "armv7hf",
            Self::Armv8 => "armv8",
            Self::Ppc32 => "ppc32",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        }
    }

    /// Translate to the Debian architecture token used in package names.
    ///
    /// Ubuntu publishes no ARMv7-specific soft-float port, so `armv7` maps
    /// to the generic `arm` token.
    ///
    /// # Examples
    ///
    /// ```
    /// use glib_packager::platform::CpuArch;
    ///
    /// assert_eq!(CpuArch::X86_64.vendor_token(), "amd64");
    /// assert_eq!(CpuArch::Armv8.vendor_token(), "arm64");
    /// ```
    #[must_use]
    pub const fn vendor_token(self) -> &'static str {
        match self {
            Self::X86_64 => "amd64",
            Self::X86 => "i386",
            Self::Armv7 => "arm",
            Self::Armv7hf => "armhf",
            Self::Armv8 => "arm64",
            Self::Ppc32 => "powerpc",
            Self::Ppc64le => "ppc64el",
            Self::S390x => "s390x",
        }
    }

    /// Return the architecture of the build host, if it is expressible.
    #[must_use]
    pub const fn host() -> Option<Self> {
        if cfg!(target_arch = "x86_64") {
            Some(Self::X86_64)
        } else if cfg!(target_arch = "x86") {
            Some(Self::X86)
        } else if cfg!(target_arch = "aarch64") {
            Some(Self::Armv8)
        } else if cfg!(all(target_arch = "arm", target_abi = "eabihf")) {
            Some(Self::Armv7hf)
        } else if cfg!(target_arch = "arm") {
            Some(Self::Armv7)
        } else if cfg!(all(target_arch = "powerpc64", target_endian = "little")) {
            Some(Self::Ppc64le)
        } else if cfg!(target_arch = "powerpc") {
            Some(Self::Ppc32)
        } else if cfg!(target_arch = "s390x") {
            Some(Self::S390x)
        } else {
            None
        }
    }

    fn expected_names() -> String {
        Self::ALL
            .iter()
            .map(|arch| arch.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CpuArch {
    type Err = PackagerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str() == s)
            .ok_or_else(|| PackagerError::UnsupportedArchitecture {
                value: s.to_owned(),
                expected: Self::expected_names(),
            })
    }
}

/// Resolve a free-form architecture name to its Debian token.
///
/// # Errors
///
/// Returns [`PackagerError::UnsupportedArchitecture`] when `name` is not in
/// the alias table. There is no fallback token.
///
/// # Examples
///
/// ```
/// use glib_packager::platform::resolve;
///
/// assert_eq!(resolve("armv7hf").expect("known arch"), "armhf");
/// assert!(resolve("mips64").is_err());
/// ```
pub fn resolve(name: &str) -> Result<&'static str> {
    name.parse::<CpuArch>().map(CpuArch::vendor_token)
}

/// Immutable description of the platform a package is produced for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    /// Target operating system.
    pub operating_system: OperatingSystem,
    /// Target CPU architecture.
    pub cpu_arch: CpuArch,
    /// Optional compiler identifier, e.g. `gcc`.
    ///
    /// On native builds this names the compiler driver queried for the
    /// host triplet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_id: Option<String>,
}

impl PlatformDescriptor {
    /// Create a descriptor without a compiler identifier.
    #[must_use]
    pub const fn new(operating_system: OperatingSystem, cpu_arch: CpuArch) -> Self {
        Self {
            operating_system,
            cpu_arch,
            compiler_id: None,
        }
    }

    /// Describe the build host, or `None` when its architecture has no
    /// [`CpuArch`] equivalent.
    #[must_use]
    pub fn host() -> Option<Self> {
        CpuArch::host().map(|arch| Self::new(OperatingSystem::host(), arch))
    }

    /// Attach a compiler identifier.
    #[must_use]
    pub fn with_compiler(mut self, compiler_id: impl Into<String>) -> Self {
        self.compiler_id = Some(compiler_id.into());
        self
    }

    /// Whether the target is Linux.
    #[must_use]
    pub const fn is_linux(&self) -> bool {
        matches!(self.operating_system, OperatingSystem::Linux)
    }

    /// Whether the target matches the build host's OS and architecture.
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.operating_system == OperatingSystem::host() && Some(self.cpu_arch) == CpuArch::host()
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.operating_system, self.cpu_arch)?;
        if let Some(compiler) = &self.compiler_id {
            write!(f, " ({compiler})")?;
        }
        Ok(())
    }
}
