//! Shared test utilities for the packager crate.
//!
//! Only compiled for unit tests and when the `test-support` feature is
//! enabled.

use crate::command::{CommandExecutor, Invocation};
use crate::error::{PackagerError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The invocation the stub expects to receive.
    pub invocation: Invocation,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Creates a stub that expects no invocations at all.
    #[must_use]
    pub fn unused() -> Self {
        Self::new(Vec::new())
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let Some(call) = expected.pop_front() else {
            return Err(PackagerError::StubMismatch {
                message: format!("unexpected invocation of {}", invocation.program),
            });
        };

        if call.invocation != *invocation {
            return Err(PackagerError::StubMismatch {
                message: format!("expected {:?}, got {invocation:?}", call.invocation),
            });
        }

        call.result
    }
}

/// Compression applied to the `data.tar` member of a fixture archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCompression {
    /// Plain `data.tar`.
    None,
    /// `data.tar.gz`.
    Gzip,
    /// `data.tar.xz`, as used by the bionic archives.
    Xz,
    /// `data.tar.zst`.
    Zstd,
}

impl DataCompression {
    fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
            Self::Xz => ".xz",
            Self::Zstd => ".zst",
        }
    }

    fn compress(self, tar: Vec<u8>) -> std::io::Result<Vec<u8>> {
        match self {
            Self::None => Ok(tar),
            Self::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&tar)?;
                encoder.finish()
            }
            Self::Xz => {
                let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
                encoder.write_all(&tar)?;
                encoder.finish()
            }
            Self::Zstd => zstd::encode_all(tar.as_slice(), 0),
        }
    }
}

#[derive(Debug, Clone)]
enum FixtureEntry {
    File { path: String, contents: Vec<u8> },
    Symlink { path: String, target: String },
    Directory { path: String },
}

/// Builder for in-memory `.deb` archives.
///
/// # Examples
///
/// ```
/// use glib_packager::test_utils::{DataCompression, DebFixture};
///
/// let deb = DebFixture::new()
///     .file("./usr/include/glib-2.0/glib.h", b"")
///     .build(DataCompression::Xz)
///     .expect("fixture archive");
/// assert!(deb.starts_with(b"!<arch>\n"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DebFixture {
    entries: Vec<FixtureEntry>,
}

impl DebFixture {
    /// Create an empty fixture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file.
    #[must_use]
    pub fn file(mut self, path: &str, contents: &[u8]) -> Self {
        self.entries.push(FixtureEntry::File {
            path: path.to_owned(),
            contents: contents.to_vec(),
        });
        self
    }

    /// Add a symbolic link pointing at `target`.
    #[must_use]
    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        self.entries.push(FixtureEntry::Symlink {
            path: path.to_owned(),
            target: target.to_owned(),
        });
        self
    }

    /// Add a directory entry.
    #[must_use]
    pub fn directory(mut self, path: &str) -> Self {
        self.entries.push(FixtureEntry::Directory {
            path: path.to_owned(),
        });
        self
    }

    /// Build a complete binary package with the given data compression.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while encoding the archive.
    pub fn build(&self, compression: DataCompression) -> std::io::Result<Vec<u8>> {
        let data = compression.compress(self.data_tar()?)?;
        let name = format!("data.tar{}", compression.suffix());
        wrap_in_container(Some((name.as_str(), data.as_slice())))
    }

    /// Build a container that lacks a `data.tar` member.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while encoding the archive.
    pub fn build_without_data(&self) -> std::io::Result<Vec<u8>> {
        wrap_in_container(None)
    }

    fn data_tar(&self) -> std::io::Result<Vec<u8>> {
        let mut builder = tar::Builder::new(Vec::new());
        for entry in &self.entries {
            let mut header = tar::Header::new_gnu();
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            match entry {
                FixtureEntry::File { path, contents } => {
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_mode(0o644);
                    header.set_size(contents.len() as u64);
                    builder.append_data(&mut header, path, contents.as_slice())?;
                }
                FixtureEntry::Symlink { path, target } => {
                    header.set_entry_type(tar::EntryType::Symlink);
                    header.set_mode(0o777);
                    header.set_size(0);
                    builder.append_link(&mut header, path, target)?;
                }
                FixtureEntry::Directory { path } => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_mode(0o755);
                    header.set_size(0);
                    builder.append_data(&mut header, path, std::io::empty())?;
                }
            }
        }
        builder.into_inner()
    }
}

fn wrap_in_container(data: Option<(&str, &[u8])>) -> std::io::Result<Vec<u8>> {
    let mut archive = Vec::new();
    {
        let mut builder = ar::Builder::new(&mut archive);
        let version: &[u8] = b"2.0\n";
        builder.append(
            &ar::Header::new(b"debian-binary".to_vec(), version.len() as u64),
            version,
        )?;
        let control = tar::Builder::new(Vec::new()).into_inner()?;
        builder.append(
            &ar::Header::new(b"control.tar".to_vec(), control.len() as u64),
            control.as_slice(),
        )?;
        if let Some((name, bytes)) = data {
            builder.append(
                &ar::Header::new(name.as_bytes().to_vec(), bytes.len() as u64),
                bytes,
            )?;
        }
    }
    Ok(archive)
}

/// Runtime package fixture laid out the way the bionic archives are.
///
/// `libglib-2.0` lives under the root-level `lib/<triplet>`, the rest of the
/// family under `usr/lib/<triplet>`.
///
/// # Errors
///
/// Returns any I/O error raised while encoding the archive.
pub fn glib_runtime_deb(triplet: &str) -> std::io::Result<Vec<u8>> {
    DebFixture::new()
        .directory("./")
        .file(
            &format!("./lib/{triplet}/libglib-2.0.so.0.5600.4"),
            b"\x7fELF glib",
        )
        .symlink(
            &format!("./lib/{triplet}/libglib-2.0.so.0"),
            "libglib-2.0.so.0.5600.4",
        )
        .file(
            &format!("./usr/lib/{triplet}/libgio-2.0.so.0.5600.4"),
            b"\x7fELF gio",
        )
        .symlink(
            &format!("./usr/lib/{triplet}/libgio-2.0.so.0"),
            "libgio-2.0.so.0.5600.4",
        )
        .file(
            "./usr/share/doc/libglib2.0-0/copyright",
            b"GLib is licensed under the LGPL.\n",
        )
        .build(DataCompression::Xz)
}

/// Development package fixture with headers, pkg-config data, and the
/// unversioned linker symlinks.
///
/// # Errors
///
/// Returns any I/O error raised while encoding the archive.
pub fn glib_development_deb(triplet: &str) -> std::io::Result<Vec<u8>> {
    DebFixture::new()
        .directory("./")
        .file("./usr/include/glib-2.0/glib.h", b"#include <glibconfig.h>\n")
        .file(
            "./usr/include/gio-unix-2.0/gio/gunixfdlist.h",
            b"#include <gio/gio.h>\n",
        )
        .file(
            &format!("./usr/lib/{triplet}/glib-2.0/include/glibconfig.h"),
            b"#define GLIB_SIZEOF_VOID_P 8\n",
        )
        .file(
            &format!("./usr/lib/{triplet}/pkgconfig/gio-unix-2.0.pc"),
            b"Name: GIO unix specific APIs\nLibs: -lgio-2.0 -lgobject-2.0 -lglib-2.0\n",
        )
        .symlink(
            &format!("./usr/lib/{triplet}/libgio-2.0.so"),
            "libgio-2.0.so.0",
        )
        .file(
            "./usr/share/doc/libglib2.0-dev/copyright",
            b"GLib is licensed under the LGPL.\n",
        )
        .build(DataCompression::Xz)
}
