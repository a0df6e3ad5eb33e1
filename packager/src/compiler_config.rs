//! Compiler and linker metadata for a packaged tree.

use crate::command::{CommandExecutor, Invocation, run_for_stdout};
use crate::error::Result;
use crate::layout::PackageLayout;
use crate::platform::PlatformDescriptor;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// pkg-config module whose link line names the GLib libraries.
pub const PKG_CONFIG_MODULE: &str = "gio-unix-2.0";

/// Header directories relative to the package root, in search order.
pub const RELATIVE_INCLUDE_DIRS: [&str; 4] = [
    "include",
    "include/glib-2.0",
    "include/gio-unix-2.0",
    "lib/glib-2.0/include",
];

/// Search paths and link names a consumer needs to build against the
/// package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Linker search directories.
    pub library_dirs: Vec<Utf8PathBuf>,
    /// Header search directories.
    pub include_dirs: Vec<Utf8PathBuf>,
    /// Library names without the `-l` prefix, first occurrence first.
    pub library_names: Vec<String>,
}

impl CompilerConfig {
    /// Render the configuration as compiler and linker flags.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use glib_packager::compiler_config::CompilerConfig;
    ///
    /// let config = CompilerConfig {
    ///     library_dirs: vec![Utf8PathBuf::from("/pkg/lib")],
    ///     include_dirs: vec![Utf8PathBuf::from("/pkg/include")],
    ///     library_names: vec!["glib-2.0".to_owned()],
    /// };
    /// assert_eq!(config.flags(), ["-I/pkg/include", "-L/pkg/lib", "-lglib-2.0"]);
    /// ```
    #[must_use]
    pub fn flags(&self) -> Vec<String> {
        let includes = self.include_dirs.iter().map(|dir| format!("-I{dir}"));
        let lib_dirs = self.library_dirs.iter().map(|dir| format!("-L{dir}"));
        let libs = self.library_names.iter().map(|name| format!("-l{name}"));
        includes.chain(lib_dirs).chain(libs).collect()
    }

    /// Move every directory under `from` to the same place under `to`.
    ///
    /// Directories outside `from` are kept unchanged.
    #[must_use]
    pub fn rebased(&self, from: &Utf8Path, to: &Utf8Path) -> Self {
        let rebase = |dirs: &[Utf8PathBuf]| -> Vec<Utf8PathBuf> {
            dirs.iter()
                .map(|dir| {
                    dir.strip_prefix(from)
                        .map_or_else(|_| dir.clone(), |relative| to.join(relative))
                })
                .collect()
        };
        Self {
            library_dirs: rebase(&self.library_dirs),
            include_dirs: rebase(&self.include_dirs),
            library_names: self.library_names.clone(),
        }
    }
}

/// Build the compiler configuration for `layout`.
///
/// On Linux the library names come from `pkg-config`, run against the
/// package's own `.pc` files with the prefix redefined to the package
/// root. `PKG_CONFIG_PATH` is set on the child process only. On every other
/// target the package holds headers only, so no libraries are named.
///
/// # Errors
///
/// Returns [`crate::error::PackagerError::DependencyQuery`] if `pkg-config`
/// cannot be run or fails.
pub fn emit_compiler_config(
    layout: &PackageLayout,
    platform: &PlatformDescriptor,
    executor: &dyn CommandExecutor,
) -> Result<CompilerConfig> {
    let library_names = if platform.is_linux() {
        let stdout = run_for_stdout(executor, &pkg_config_invocation(layout))?;
        library_names_from_flags(stdout.split_whitespace())
    } else {
        Vec::new()
    };

    Ok(CompilerConfig {
        library_dirs: vec![layout.lib_dir()],
        include_dirs: RELATIVE_INCLUDE_DIRS
            .iter()
            .map(|dir| layout.root.join(dir))
            .collect(),
        library_names,
    })
}

/// The `pkg-config` query issued for `layout`.
#[must_use]
pub fn pkg_config_invocation(layout: &PackageLayout) -> Invocation {
    Invocation::new("pkg-config")
        .arg("--libs-only-l")
        .arg(format!("--define-variable=prefix={}", layout.root))
        .arg(PKG_CONFIG_MODULE)
        .env("PKG_CONFIG_PATH", layout.pkgconfig_dir().as_str())
}

/// Strip the `-l` prefix from link flags, keeping the first occurrence of
/// each name.
///
/// Tokens that are not `-l` flags are ignored.
///
/// # Examples
///
/// ```
/// use glib_packager::compiler_config::library_names_from_flags;
///
/// let names = library_names_from_flags(["-lgio-2.0", "-lglib-2.0", "-lgio-2.0"]);
/// assert_eq!(names, ["gio-2.0", "glib-2.0"]);
/// ```
#[must_use]
pub fn library_names_from_flags<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in tokens.into_iter().filter_map(|token| token.strip_prefix("-l")) {
        if !name.is_empty() && !names.iter().any(|seen| seen == name) {
            names.push(name.to_owned());
        }
    }
    names
}
