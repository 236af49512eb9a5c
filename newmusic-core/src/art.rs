//! Fetching and decoding album art ahead of the layout pass.

use std::time::Duration;

use futures::StreamExt as _;

use crate::{release::Release, surface::ArtImage, validate};

/// Why one release's art is unavailable. Always recovered from by skipping
/// that release.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetLoadError {
    #[error("release has no album art URL")]
    MissingUrl,
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("timed out after {timeout:?} fetching {url}")]
    Timeout { url: String, timeout: Duration },
    #[error("failed to read {url}: {message}")]
    Io { url: String, message: String },
    #[error("failed to decode {url}: {message}")]
    Decode { url: String, message: String },
    #[error("album art was not fetched")]
    NotFetched,
}

/// Produces the raw bytes behind an album art URL.
pub trait ArtFetcher: Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, AssetLoadError>> + Send;
}

/// Fetches `http(s)://` URLs over the network and anything else from the
/// local filesystem (an optional `file://` prefix is stripped).
#[derive(Debug, Clone, Default)]
pub struct HttpArtFetcher {
    client: reqwest::Client,
}
impl HttpArtFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}
impl ArtFetcher for HttpArtFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetLoadError> {
        if !validate::is_http_url(url) {
            let path = url.strip_prefix("file://").unwrap_or(url);
            return tokio::fs::read(path).await.map_err(|e| AssetLoadError::Io {
                url: url.to_string(),
                message: e.to_string(),
            });
        }

        let fetch_error = |e: reqwest::Error| AssetLoadError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetLoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await.map_err(fetch_error)?.into())
    }
}

pub fn decode_art(url: &str, bytes: &[u8]) -> Result<ArtImage, AssetLoadError> {
    image::load_from_memory(bytes)
        .map(|image| ArtImage(image.into_rgba8()))
        .map_err(|e| AssetLoadError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
}

/// Fetch and decode a single asset, giving up after `timeout`.
pub async fn load_art(
    fetcher: &impl ArtFetcher,
    url: &str,
    timeout: Duration,
) -> Result<ArtImage, AssetLoadError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AssetLoadError::MissingUrl);
    }

    let bytes = tokio::time::timeout(timeout, fetcher.fetch(url))
        .await
        .map_err(|_| AssetLoadError::Timeout {
            url: url.to_string(),
            timeout,
        })??;
    let art = decode_art(url, &bytes)?;
    tracing::debug!("loaded album art from {url} ({}x{})", art.width(), art.height());
    Ok(art)
}

/// Load the art for every release, at most `concurrency` at a time. The result
/// is index-aligned with `releases` regardless of completion order.
pub async fn prefetch_art(
    fetcher: &impl ArtFetcher,
    releases: &[Release],
    concurrency: usize,
    timeout: Duration,
) -> Vec<Result<ArtImage, AssetLoadError>> {
    futures::stream::iter(
        releases
            .iter()
            .map(|release| load_art(fetcher, release.album_art_url(), timeout)),
    )
    .buffered(concurrency.max(1))
    .collect()
    .await
}
