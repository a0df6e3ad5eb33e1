//! Platform directory lookup.
//!
//! Wrapped in a trait so the default output location can be tested without
//! depending on the invoking user's home directory.

use crate::artefact::catalogue::PACKAGE_VERSION;
use crate::platform::CpuArch;
use camino::Utf8PathBuf;
use std::path::PathBuf;

/// Source of per-user base directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Per-user local data directory, e.g. `~/.local/share`.
    fn data_local_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by the operating system's conventions.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    inner: directories_next::BaseDirs,
}

impl SystemBaseDirs {
    /// Look up the current user's directories.
    ///
    /// Returns `None` when no home directory can be determined.
    #[must_use]
    pub fn new() -> Option<Self> {
        directories_next::BaseDirs::new().map(|inner| Self { inner })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn data_local_dir(&self) -> Option<PathBuf> {
        Some(self.inner.data_local_dir().to_path_buf())
    }
}

/// Default package directory for `arch`:
/// `<data_local_dir>/glib-packager/<version>/<arch>`.
#[must_use]
pub fn default_output_dir(dirs: &dyn BaseDirs, arch: CpuArch) -> Option<Utf8PathBuf> {
    dirs.data_local_dir()
        .and_then(|p| Utf8PathBuf::try_from(p).ok())
        .map(|p| p.join("glib-packager").join(PACKAGE_VERSION).join(arch.as_str()))
}
