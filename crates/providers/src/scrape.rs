//! Firecrawl scrape client.
//!
//! Requests rendered page text restricted to semantic content tags, with a
//! fixed wait for dynamic content.  Rate-limit responses get one retry with
//! exponential backoff; everything else surfaces to the caller, which treats
//! the link as failed and moves on.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use pricelens_pipeline::PageScraper;

use crate::ProviderError;

const FIRECRAWL_URL: &str = "https://api.firecrawl.dev/v1/scrape";

const INCLUDE_TAGS: &[&str] = &["title", "meta", "h1", "h2", "h3", "p", "span", "div"];
const EXCLUDE_TAGS: &[&str] = &["script", "style", "nav", "footer", "header"];

const BACKOFF_BASE: Duration = Duration::from_millis(500);
const MAX_RETRIES: u32 = 1;

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: ScrapeData,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    html: Option<String>,
}

impl ScrapeResponse {
    fn into_content(self) -> Result<String, ProviderError> {
        if !self.success {
            return Err(ProviderError::Upstream("scrape reported failure".into()));
        }
        let content = self
            .data
            .markdown
            .filter(|text| !text.is_empty())
            .or(self.data.html)
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::Upstream("scrape returned no content".into()));
        }
        Ok(content)
    }
}

#[derive(Debug, Clone)]
pub struct FirecrawlClient {
    client: reqwest::Client,
    api_key: String,
    wait_for_ms: u64,
}

impl FirecrawlClient {
    pub fn new(
        api_key: impl Into<String>,
        wait_for_ms: u64,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            wait_for_ms,
        })
    }

    /// Fetch one page as readable text (markdown preferred, raw HTML as the
    /// fallback format).
    pub async fn scrape(&self, url: &str) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.scrape_once(url).await {
                Err(err) if err.is_rate_limited() && attempt < MAX_RETRIES => {
                    let delay = BACKOFF_BASE * 2u32.pow(attempt);
                    warn!(url, attempt, ?delay, "scrape rate-limited, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn scrape_once(&self, url: &str) -> Result<String, ProviderError> {
        let payload = json!({
            "url": url,
            "formats": ["markdown", "html"],
            "includeTags": INCLUDE_TAGS,
            "excludeTags": EXCLUDE_TAGS,
            "waitFor": self.wait_for_ms,
        });

        let response = self
            .client
            .post(FIRECRAWL_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { status });
        }

        let body: ScrapeResponse = response.json().await?;
        let content = body.into_content()?;
        info!(url, chars = content.len(), "scrape complete");
        Ok(content)
    }
}

#[async_trait]
impl PageScraper for FirecrawlClient {
    async fn fetch_content(&self, url: &str) -> Result<String> {
        Ok(self.scrape(url).await?)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
