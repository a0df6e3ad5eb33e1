//! Artefact download logic.
//!
//! Provides a trait-based abstraction over the HTTP transport so the
//! pipeline can be exercised without network access.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Connection timeout for archive mirrors.
///
/// Transfers themselves are not bounded; the archives are static files and
/// a slow mirror is still a correct one.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for downloading artefact archives.
///
/// # Examples
///
/// ```no_run
/// use glib_packager::artefact::download::{ArtefactDownloader, HttpDownloader};
///
/// let bytes = HttpDownloader.download("http://example.com/archive.deb")?;
/// # Ok::<(), glib_packager::artefact::download::DownloadError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download `url` and return the full response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with an
    /// error status, or the body cannot be read.
    fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Errors arising from artefact download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested artefact was not found (HTTP 404).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error while reading the response body.
    #[error("I/O error reading download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl ArtefactDownloader for HttpDownloader {
    fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        log::debug!("GET {url}");
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut body = Vec::new();
        response.into_body().as_reader().read_to_end(&mut body)?;
        log::debug!("received {} bytes from {url}", body.len());
        Ok(body)
    }
}

/// Shared `ureq` agent with connection timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
