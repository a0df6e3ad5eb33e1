//! Error types for the GLib packager.
//!
//! Every failure in the pipeline is fatal: the variants here are surfaced to
//! the invoking tool and never recovered locally. Transport and archive
//! failures keep their own error types and are wrapped here.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, fetching, or packaging artefacts.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The architecture has no entry in the fixed artefact table.
    #[error("unsupported architecture \"{value}\"; expected one of: {expected}")]
    UnsupportedArchitecture {
        /// The rejected architecture name.
        value: String,
        /// Comma-separated list of accepted architectures.
        expected: String,
    },

    /// A downloaded artefact did not hash to the recorded digest.
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The URL the artefact was fetched from.
        url: String,
        /// The digest recorded in the artefact table.
        expected: String,
        /// The digest of the bytes actually received.
        actual: String,
    },

    /// The transport failed to retrieve an artefact.
    #[error(transparent)]
    DownloadFailure(#[from] DownloadError),

    /// The extracted tree lacks a path the package layout depends on.
    #[error("expected path missing from extracted archive: {path}")]
    MissingExpectedPath {
        /// The path that was looked for.
        path: Utf8PathBuf,
    },

    /// Unpacking a `.deb` archive failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A file-selection pattern failed to compile.
    #[error("invalid copy pattern \"{pattern}\": {reason}")]
    InvalidCopyPattern {
        /// The rejected pattern.
        pattern: String,
        /// Description of the failure.
        reason: String,
    },

    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// An external query tool (`pkg-config`, the C compiler) failed.
    #[error("{tool} failed: {message}")]
    DependencyQuery {
        /// Name of the tool that was invoked.
        tool: String,
        /// Description of the failure.
        message: String,
    },

    /// The output directory already holds a package.
    #[error("output directory {path} is not empty; pass --replace to overwrite it")]
    OutputExists {
        /// The occupied output directory.
        path: Utf8PathBuf,
    },

    /// No output directory was given and no default could be derived.
    #[error("could not determine a default output directory; pass --output")]
    OutputDirUnavailable,

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// Serialising emitted metadata failed.
    #[error("failed to serialise package metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
