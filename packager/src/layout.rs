//! Repackaging of an extracted tree into the output layout.
//!
//! The bionic archives spread GLib across the root-level `lib/<triplet>`
//! and `usr/lib/<triplet>`; both are folded into a single `lib/`. Headers
//! move from `usr/include` to `include/`, and the runtime package's
//! copyright notice lands at the package root.

use crate::command::CommandExecutor;
use crate::error::{PackagerError, Result};
use crate::platform::PlatformDescriptor;
use crate::triplet::{canonical_triplet, compute_triplet_name};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::path::Path;

/// Library roots inside the extracted tree, in precedence order.
///
/// Each is joined with the triplet before use.
pub const LIBRARY_ROOT_CANDIDATES: [&str; 2] = ["lib", USR_LIB_ROOT];

/// The library root reported when neither candidate yields anything.
const USR_LIB_ROOT: &str = "usr/lib";

/// Header root inside the extracted tree.
pub const INCLUDE_SOURCE: &str = "usr/include";

/// Copyright notice shipped by the runtime package.
pub const COPYRIGHT_SOURCE: &str = "usr/share/doc/libglib2.0-0/copyright";

/// Which files under the library roots are copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPattern {
    /// Every file (`*`), used for Linux targets.
    Everything,
    /// Headers only (`*.h`), used for every other target.
    HeadersOnly,
}

impl CopyPattern {
    /// Pick the pattern for `platform`.
    #[must_use]
    pub const fn for_platform(platform: &PlatformDescriptor) -> Self {
        if platform.is_linux() {
            Self::Everything
        } else {
            Self::HeadersOnly
        }
    }

    /// The glob this pattern stands for.
    #[must_use]
    pub const fn as_glob(self) -> &'static str {
        match self {
            Self::Everything => "*",
            Self::HeadersOnly => "*.h",
        }
    }

    fn compile(self) -> Result<glob::Pattern> {
        glob::Pattern::new(self.as_glob()).map_err(|e| PackagerError::InvalidCopyPattern {
            pattern: self.as_glob().to_owned(),
            reason: e.to_string(),
        })
    }
}

/// A packaged GLib tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    /// Package root directory.
    pub root: Utf8PathBuf,
    /// Multiarch triplet the library roots were resolved with.
    pub triplet: String,
    /// Files and links copied into `lib/`, relative to it.
    pub library_files: Vec<Utf8PathBuf>,
}

impl PackageLayout {
    /// The `lib/` directory.
    #[must_use]
    pub fn lib_dir(&self) -> Utf8PathBuf {
        self.root.join("lib")
    }

    /// The `include/` directory.
    #[must_use]
    pub fn include_dir(&self) -> Utf8PathBuf {
        self.root.join("include")
    }

    /// The pkg-config search directory.
    #[must_use]
    pub fn pkgconfig_dir(&self) -> Utf8PathBuf {
        self.lib_dir().join("pkgconfig")
    }

    /// The copyright notice at the package root.
    #[must_use]
    pub fn copyright_path(&self) -> Utf8PathBuf {
        self.root.join("copyright")
    }

    /// Return a copy of this layout rooted at `root`.
    ///
    /// Used once a staged package has been moved to its final location.
    #[must_use]
    pub fn relocated(&self, root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
            ..self.clone()
        }
    }
}

/// Package the extracted tree at `extracted_root` into `dest_root`.
///
/// The triplet is computed with `force_non_native` set for every target
/// other than Linux, and the copy pattern is `*` on Linux and `*.h`
/// elsewhere. A compiler-reported triplet with no library root in the
/// extracted tree (`x86_64-redhat-linux`, say) is replaced by the Debian
/// multiarch name.
///
/// # Errors
///
/// Returns [`PackagerError::MissingExpectedPath`] if no library files match,
/// or if the headers or copyright notice are absent, and
/// [`PackagerError::Io`] if copying fails.
pub fn package(
    extracted_root: &Utf8Path,
    dest_root: &Utf8Path,
    platform: &PlatformDescriptor,
    executor: &dyn CommandExecutor,
) -> Result<PackageLayout> {
    let triplet = library_triplet(extracted_root, platform, executor);
    let pattern = CopyPattern::for_platform(platform);
    log::info!("packaging {platform} with triplet {triplet} and pattern {}", pattern.as_glob());
    assemble(extracted_root, dest_root, &triplet, pattern)
}

fn library_triplet(
    extracted_root: &Utf8Path,
    platform: &PlatformDescriptor,
    executor: &dyn CommandExecutor,
) -> String {
    let triplet = compute_triplet_name(platform, !platform.is_linux(), executor);
    if has_library_root(extracted_root, &triplet) {
        return triplet;
    }
    let multiarch = canonical_triplet(platform.operating_system, platform.cpu_arch);
    if multiarch != triplet && has_library_root(extracted_root, &multiarch) {
        log::warn!("no library root for triplet {triplet}; using {multiarch}");
        return multiarch;
    }
    triplet
}

fn has_library_root(extracted_root: &Utf8Path, triplet: &str) -> bool {
    LIBRARY_ROOT_CANDIDATES
        .iter()
        .any(|candidate| extracted_root.join(candidate).join(triplet).is_dir())
}

/// Copy the selected subtrees for an already-known triplet.
///
/// # Errors
///
/// See [`package`].
pub fn assemble(
    extracted_root: &Utf8Path,
    dest_root: &Utf8Path,
    triplet: &str,
    pattern: CopyPattern,
) -> Result<PackageLayout> {
    let compiled = pattern.compile()?;
    let lib_dest = dest_root.join("lib");
    let mut library_files = Vec::new();

    for candidate in LIBRARY_ROOT_CANDIDATES {
        let source = extracted_root.join(candidate).join(triplet);
        if !source.is_dir() {
            log::debug!("library root {source} absent");
            continue;
        }
        let copied = copy_tree(&source, &lib_dest, |relative| {
            compiled.matches(relative.as_str())
        })?;
        library_files.extend(copied);
    }

    if library_files.is_empty() {
        return Err(PackagerError::MissingExpectedPath {
            path: extracted_root.join(USR_LIB_ROOT).join(triplet),
        });
    }

    let include_source = extracted_root.join(INCLUDE_SOURCE);
    if !include_source.is_dir() {
        return Err(PackagerError::MissingExpectedPath {
            path: include_source,
        });
    }
    copy_tree(&include_source, &dest_root.join("include"), |_| true)?;

    let copyright = extracted_root.join(COPYRIGHT_SOURCE);
    if !copyright.is_file() {
        return Err(PackagerError::MissingExpectedPath { path: copyright });
    }
    fs::copy(&copyright, dest_root.join("copyright"))?;

    Ok(PackageLayout {
        root: dest_root.to_owned(),
        triplet: triplet.to_owned(),
        library_files,
    })
}

/// Copy matching files and links under `source` into `dest`.
///
/// A relative path already present in `dest` is left alone, so an earlier
/// source takes precedence over a later one. Returns the relative paths
/// actually written.
fn copy_tree(
    source: &Utf8Path,
    dest: &Utf8Path,
    selects: impl Fn(&Utf8Path) -> bool,
) -> Result<Vec<Utf8PathBuf>> {
    let mut written = Vec::new();
    for entry_result in walkdir::WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry_result.map_err(|e| PackagerError::Io(e.into()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = relative_utf8(entry.path(), source)?;
        if !selects(&relative) {
            continue;
        }

        let target = dest.join(&relative);
        if fs::symlink_metadata(&target).is_ok() {
            log::debug!("skipping {relative}: already supplied by an earlier root");
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if entry.path_is_symlink() {
            let link_target = fs::read_link(entry.path())?;
            create_symlink(&link_target, target.as_std_path())?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
        written.push(relative);
    }
    Ok(written)
}

fn relative_utf8(path: &Path, base: &Utf8Path) -> Result<Utf8PathBuf> {
    let relative = path.strip_prefix(base).map_err(|_| {
        PackagerError::Io(std::io::Error::other(format!(
            "{} is not under {base}",
            path.display()
        )))
    })?;
    Utf8PathBuf::try_from(relative.to_path_buf()).map_err(|e| PackagerError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
