//! The fetch seam between crawlers and the network.

use std::path::Path;

use async_trait::async_trait;

use super::error::DownloadError;

/// Retrieves pages and files.
///
/// [`HttpClient`](super::HttpClient) is the production implementation;
/// tests substitute canned responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the response body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, DownloadError>;

    /// Downloads `url` into the file at `path`, replacing it if present.
    /// Returns the number of bytes written.
    async fn download_to_path(&self, url: &str, path: &Path) -> Result<u64, DownloadError>;
}
