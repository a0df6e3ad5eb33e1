//! The fetch-and-verify gate.
//!
//! Downloaded bytes are only handed on once their SHA-256 digest equals the
//! digest recorded in the artefact table. A mismatch discards the bytes and
//! is never retried.

use super::catalogue::ArtifactSpec;
use super::download::ArtefactDownloader;
use super::sha256_digest::Sha256Digest;
use crate::error::{PackagerError, Result};

/// Download the archive described by `spec` and verify its digest.
///
/// # Errors
///
/// Returns [`PackagerError::DownloadFailure`] if the transport fails and
/// [`PackagerError::ChecksumMismatch`] if the digest differs.
pub fn fetch_and_verify(downloader: &dyn ArtefactDownloader, spec: &ArtifactSpec) -> Result<Vec<u8>> {
    let bytes = downloader.download(&spec.url)?;
    verify_checksum(spec, &bytes)?;
    log::info!("verified {} ({} bytes)", spec.url, bytes.len());
    Ok(bytes)
}

/// Verify that `bytes` hash to the digest recorded in `spec`.
///
/// # Errors
///
/// Returns [`PackagerError::ChecksumMismatch`] if the digests differ.
///
/// # Examples
///
/// ```
/// use glib_packager::artefact::catalogue::ArtifactSpec;
/// use glib_packager::artefact::sha256_digest::Sha256Digest;
/// use glib_packager::artefact::verification::verify_checksum;
///
/// let spec = ArtifactSpec {
///     url: "http://example.com/a.deb".to_owned(),
///     expected_checksum: Sha256Digest::of(b"payload"),
/// };
/// assert!(verify_checksum(&spec, b"payload").is_ok());
/// assert!(verify_checksum(&spec, b"tampered").is_err());
/// ```
pub fn verify_checksum(spec: &ArtifactSpec, bytes: &[u8]) -> Result<()> {
    let actual = Sha256Digest::of(bytes);
    if actual != spec.expected_checksum {
        return Err(PackagerError::ChecksumMismatch {
            url: spec.url.clone(),
            expected: spec.expected_checksum.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}
