// Page fetching capability.
//
// The scrapers depend on the `BoardFetcher` trait rather than on reqwest
// directly, so tests and offline runs can substitute recorded pages for live
// ones. `HttpFetcher` is the production implementation; `FixtureFetcher`
// reads pages from a directory keyed by URL-derived file names.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {source}")]
    Client { source: reqwest::Error },

    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no fixture for {url} (expected {path})")]
    MissingFixture { url: String, path: PathBuf },

    #[error("failed to read fixture {path}: {source}")]
    FixtureIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait BoardFetcher: Send + Sync {
    /// Fetch the document at `url` as text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client { source: e })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BoardFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })
    }
}

// ---------------------------------------------------------------------------
// Fixture implementation
// ---------------------------------------------------------------------------

/// Serves recorded pages from a directory. The file name for a URL is the
/// URL with its scheme stripped and path separators flattened, plus `.html`.
pub struct FixtureFetcher {
    dir: PathBuf,
}

impl FixtureFetcher {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The fixture path a URL maps to.
    pub fn fixture_path(&self, url: &str) -> PathBuf {
        let name = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .replace(['/', '?', '&', '='], "_")
            + ".html";
        self.dir.join(name)
    }
}

#[async_trait]
impl BoardFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let path = self.fixture_path(url);
        if !path.exists() {
            return Err(FetchError::MissingFixture {
                url: url.to_string(),
                path,
            });
        }
        debug!("reading fixture {}", path.display());
        std::fs::read_to_string(&path).map_err(|e| FetchError::FixtureIo { path, source: e })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
