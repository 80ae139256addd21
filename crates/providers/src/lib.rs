//! Clients for the external search and scraping providers.

use reqwest::StatusCode;
use thiserror::Error;

pub mod scrape;
pub mod search;

pub use scrape::FirecrawlClient;
pub use search::SerpApiClient;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}")]
    Status { status: StatusCode },
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl ProviderError {
    /// Rate-limit responses are worth one retry with backoff.
    pub(crate) fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            ProviderError::Status {
                status: StatusCode::TOO_MANY_REQUESTS
            }
        )
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
