//! Source image fetching
//!
//! Narrow seam between the sync engine and the network so tests can feed
//! canned bytes. The production fetcher is a blocking reqwest client with a
//! per-request timeout; a timeout is an ordinary per-item failure.

use std::time::Duration;

/// Errors from fetching a source image
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Fetch failed for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fetch failed for {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Fetch failed for {url}: {reason}")]
    Other { url: String, reason: String },
}

/// Fetches raw bytes from a source URL.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Production fetcher over HTTP.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}
