//! HTTP access for crawls: page fetches, file downloads and request pacing.
//!
//! # Features
//!
//! - Page fetches returning text for HTML parsing
//! - Streaming file downloads (memory-efficient for large PDFs)
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Fixed-interval request pacing per crawl
//! - A [`Fetcher`] trait so crawlers can be driven without a network
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let bytes = client
//!     .download_to_path("https://example.com/paper.pdf", Path::new("./1.pdf"))
//!     .await?;
//! println!("Downloaded {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod fetcher;
pub mod rate_limiter;

pub use client::HttpClient;
pub use error::DownloadError;
pub use fetcher::Fetcher;
pub use rate_limiter::RateLimiter;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
