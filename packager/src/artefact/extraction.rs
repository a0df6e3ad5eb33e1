//! Two-stage extraction of `.deb` archives.
//!
//! A binary package is an `ar` container holding `debian-binary`,
//! `control.tar[.ext]`, and `data.tar[.ext]`. Only the data member matters
//! here: stage one pulls it out of the container, stage two decompresses it
//! and unpacks the tar stream into a staging directory. The data member is
//! held in memory and dropped as soon as stage two has consumed it.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// Trait for extracting artefact archives, enabling test mocking.
///
/// # Examples
///
/// ```no_run
/// use glib_packager::artefact::extraction::{ArtefactExtractor, DebExtractor};
///
/// let archive = std::fs::read("libglib2.0-0.deb")?;
/// let files = DebExtractor.extract(&archive, std::path::Path::new("staging"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Extract the payload of `archive` into `dest_dir`.
    ///
    /// Returns the relative paths of the non-directory entries written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::MissingDataMember`] if the container has
    /// no data member, [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory, and
    /// [`ExtractionError::EmptyArchive`] if no files are found.
    fn extract(&self, archive: &[u8], dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The container holds no `data.tar` member.
    #[error("archive has no data.tar member")]
    MissingDataMember,

    /// The data member uses a compression suffix this extractor cannot read.
    #[error("unknown data.tar compression \"{0}\"")]
    UnknownCompression(String),

    /// The data member contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Compression applied to the `data.tar` member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Xz,
    Zstd,
}

impl Compression {
    fn from_suffix(suffix: &str) -> Result<Self, ExtractionError> {
        match suffix {
            "" => Ok(Self::None),
            ".gz" => Ok(Self::Gzip),
            ".xz" => Ok(Self::Xz),
            ".zst" => Ok(Self::Zstd),
            other => Err(ExtractionError::UnknownCompression(other.to_owned())),
        }
    }

    fn decoder(self, payload: Vec<u8>) -> std::io::Result<Box<dyn Read>> {
        let data = Cursor::new(payload);
        let reader: Box<dyn Read> = match self {
            Self::None => Box::new(data),
            Self::Gzip => Box::new(flate2::read::GzDecoder::new(data)),
            Self::Xz => Box::new(xz2::read::XzDecoder::new(data)),
            Self::Zstd => Box::new(zstd::Decoder::new(data)?),
        };
        Ok(reader)
    }
}

/// The compressed `data.tar` member pulled out of the container.
struct DataMember {
    compression: Compression,
    payload: Vec<u8>,
}

/// Extractor for Debian binary packages.
///
/// Validates each entry path before unpacking to guard against path
/// traversal. Symbolic links are recreated as links.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebExtractor;

impl ArtefactExtractor for DebExtractor {
    fn extract(&self, archive: &[u8], dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let member = read_data_member(archive)?;
        log::debug!(
            "unpacking {:?} data member ({} bytes) into {}",
            member.compression,
            member.payload.len(),
            dest_dir.display()
        );
        let reader = member.compression.decoder(member.payload)?;
        unpack_tar(reader, dest_dir)
    }
}

/// Stage one: locate the `data.tar[.ext]` member of the `ar` container.
fn read_data_member(archive: &[u8]) -> Result<DataMember, ExtractionError> {
    let mut container = ar::Archive::new(Cursor::new(archive));
    while let Some(entry_result) = container.next_entry() {
        let mut entry = entry_result?;
        let identifier = String::from_utf8_lossy(entry.header().identifier()).into_owned();
        let name = identifier.trim_end_matches('/');
        if let Some(suffix) = name.strip_prefix("data.tar") {
            let compression = Compression::from_suffix(suffix)?;
            let mut payload = Vec::new();
            entry.read_to_end(&mut payload)?;
            return Ok(DataMember {
                compression,
                payload,
            });
        }
    }
    Err(ExtractionError::MissingDataMember)
}

/// Stage two: unpack a tar stream into `dest_dir`.
fn unpack_tar(reader: impl Read, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;

        let is_directory = entry.header().entry_type().is_dir();
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }

        if !is_directory {
            extracted.push(normalise(&entry_path));
        }
    }

    if extracted.is_empty() {
        return Err(ExtractionError::EmptyArchive);
    }

    Ok(extracted)
}

/// Drop `.` components so `./usr/include` and `usr/include` compare equal.
fn normalise(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::RootDir));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{DataCompression, DebFixture};
    use rstest::rstest;

    fn staging() -> tempfile::TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    #[rstest]
    #[case::xz(DataCompression::Xz)]
    #[case::gzip(DataCompression::Gzip)]
    #[case::zstd(DataCompression::Zstd)]
    #[case::plain(DataCompression::None)]
    fn extracts_data_member(#[case] compression: DataCompression) {
        let deb = DebFixture::new()
            .file("./usr/include/glib-2.0/glib.h", b"#pragma once\n")
            .build(compression)
            .expect("build deb");
        let dest = staging();

        let files = DebExtractor.extract(&deb, dest.path()).expect("extract");

        assert_eq!(files, vec![PathBuf::from("usr/include/glib-2.0/glib.h")]);
        let contents =
            std::fs::read(dest.path().join("usr/include/glib-2.0/glib.h")).expect("read header");
        assert_eq!(contents, b"#pragma once\n");
    }

    #[cfg(unix)]
    #[test]
    fn preserves_symlinks() {
        let deb = DebFixture::new()
            .file("./usr/lib/x86_64-linux-gnu/libgio-2.0.so.0.5600.4", b"ELF")
            .symlink(
                "./usr/lib/x86_64-linux-gnu/libgio-2.0.so.0",
                "libgio-2.0.so.0.5600.4",
            )
            .build(DataCompression::Xz)
            .expect("build deb");
        let dest = staging();

        DebExtractor.extract(&deb, dest.path()).expect("extract");

        let link = dest.path().join("usr/lib/x86_64-linux-gnu/libgio-2.0.so.0");
        let metadata = std::fs::symlink_metadata(&link).expect("link metadata");
        assert!(metadata.file_type().is_symlink());
        assert_eq!(
            std::fs::read_link(&link).expect("read link"),
            PathBuf::from("libgio-2.0.so.0.5600.4")
        );
    }

    #[test]
    fn rejects_container_without_data_member() {
        let deb = DebFixture::new()
            .build_without_data()
            .expect("build deb");
        let result = DebExtractor.extract(&deb, staging().path());
        assert!(matches!(result, Err(ExtractionError::MissingDataMember)));
    }

    #[test]
    fn rejects_unknown_compression() {
        assert!(matches!(
            Compression::from_suffix(".lzma"),
            Err(ExtractionError::UnknownCompression(suffix)) if suffix == ".lzma"
        ));
    }

    #[test]
    fn rejects_data_member_with_only_directories() {
        let deb = DebFixture::new()
            .directory("./usr/")
            .build(DataCompression::Xz)
            .expect("build deb");
        let result = DebExtractor.extract(&deb, staging().path());
        assert!(matches!(result, Err(ExtractionError::EmptyArchive)));
    }

    #[rstest]
    #[case::parent_dir("../escape.txt")]
    #[case::nested_parent("usr/../../escape.txt")]
    #[case::absolute("/etc/passwd")]
    fn rejects_path_traversal(#[case] bad_path: &str) {
        let result = validate_entry_path(Path::new(bad_path));
        assert!(
            matches!(result, Err(ExtractionError::PathTraversal { .. })),
            "expected PathTraversal for {bad_path}"
        );
    }

    #[test]
    fn accepts_dot_prefixed_paths() {
        assert!(validate_entry_path(Path::new("./usr/lib/libfoo.so")).is_ok());
    }
}
