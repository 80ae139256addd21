//! The classify → extract → scrape-fallback pipeline.
//!
//! All state is request-scoped: [`Pipeline::run`] builds and returns a
//! [`PriceReport`] value; nothing is accumulated in shared state, so
//! concurrent requests cannot interleave their results.  Every external
//! failure degrades to an empty or partial report with a per-link status —
//! a pipeline run never errors.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pricelens_llm::GeminiClient;

pub mod classify;
pub mod extract;
pub mod fallback;
pub mod prompts;
pub mod sanitize;
pub mod snippet;

pub use classify::Partition;
pub use sanitize::sanitize_price;

// ── Domain types ─────────────────────────────────────────────────────────────

/// One organic search result as returned by the search provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
}

/// A finalized price finding.  `price` is a sanitized numeric string (`"0"`
/// when nothing could be determined); `link` may be empty when the extraction
/// could not recover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub link: String,
    pub price: String,
}

/// What happened to one input link as it moved through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    UpstreamError,
    Unparseable,
    NoPrice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub link: String,
    pub status: SourceStatus,
}

/// Request-scoped result of one pipeline run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PriceReport {
    pub records: Vec<PriceRecord>,
    pub sources: Vec<SourceOutcome>,
}

/// The wire shape served by the HTTP endpoint and printed by the CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct PriceResponse {
    pub currency: String,
    pub product: String,
    pub price_list: Vec<PriceRecord>,
    pub sources: Vec<SourceOutcome>,
}

impl PriceReport {
    pub fn into_response(
        self,
        currency: impl Into<String>,
        product: impl Into<String>,
    ) -> PriceResponse {
        PriceResponse {
            currency: currency.into(),
            product: product.into(),
            price_list: self.records,
            sources: self.sources,
        }
    }
}

// ── Provider seams ───────────────────────────────────────────────────────────

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, country: &str) -> Result<Vec<SearchResult>>;
}

#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Fetch a page and return its readable text content.
    async fn fetch_content(&self, url: &str) -> Result<String>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        GeminiClient::generate(self, prompt).await
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

/// Tunables threaded into the scrape fallback.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Upper bound on pages fetched per request.
    pub max_links: usize,
    /// Width of the scrape worker pool.
    pub concurrency: usize,
    /// Page content is truncated to this many characters before extraction.
    pub content_limit: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_links: 10,
            concurrency: 4,
            content_limit: 5000,
        }
    }
}

pub struct Pipeline {
    search: Arc<dyn SearchProvider>,
    scraper: Arc<dyn PageScraper>,
    /// `None` when no LLM key is configured; classification and extraction
    /// then run on the regex patterns alone.
    llm: Option<Arc<dyn TextGenerator>>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        scraper: Arc<dyn PageScraper>,
        llm: Option<Arc<dyn TextGenerator>>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            search,
            scraper,
            llm,
            options,
        }
    }

    /// Run search → classify → extract / scrape-fallback for one request.
    pub async fn run(&self, country: &str, query: &str) -> PriceReport {
        let results = match self.search.search(query, country).await {
            Ok(results) => results,
            Err(err) => {
                warn!(error = %err, "search failed");
                Vec::new()
            }
        };

        let results: Vec<SearchResult> = results
            .into_iter()
            .filter(|result| !result.link.is_empty())
            .collect();
        if results.is_empty() {
            info!(query, country, "no search results");
            return PriceReport::default();
        }
        info!(query, country, count = results.len(), "search complete");

        let split = match &self.llm {
            Some(llm) => classify::classify(llm.as_ref(), &results).await,
            None => classify::classify_local(&results),
        };

        let mut report = PriceReport::default();

        let (records, sources) = match &self.llm {
            Some(llm) => extract::extract_snippet_prices(llm.as_ref(), &split.with_price).await,
            None => extract::extract_snippet_prices_local(&split.with_price),
        };
        report.records.extend(records);
        report.sources.extend(sources);

        let (records, sources) = fallback::scrape_prices(
            self.scraper.as_ref(),
            self.llm.as_deref(),
            &split.needs_fetch,
            &self.options,
        )
        .await;
        report.records.extend(records);
        report.sources.extend(sources);

        info!(
            records = report.records.len(),
            sources = report.sources.len(),
            "pipeline complete"
        );
        report
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticSearch(Vec<SearchResult>);

    #[async_trait]
    impl SearchProvider for StaticSearch {
        async fn search(&self, _query: &str, _country: &str) -> Result<Vec<SearchResult>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl SearchProvider for FailingSearch {
        async fn search(&self, _query: &str, _country: &str) -> Result<Vec<SearchResult>> {
            anyhow::bail!("search provider unreachable")
        }
    }

    struct MapScraper(HashMap<String, String>);

    #[async_trait]
    impl PageScraper for MapScraper {
        async fn fetch_content(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    /// Answers each of the three prompt kinds by a marker it carries.
    struct ScriptedLlm;

    #[async_trait]
    impl TextGenerator for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            if prompt.starts_with("TASK: Identify") {
                return Ok("```json\n[0]\n```".to_string());
            }
            if prompt.starts_with("Extract the price and link") {
                return Ok(
                    "```json\n[{\"link\": \"https://store.example/iphone\", \"price\": \"₹1,19,900\"}]\n```"
                        .to_string(),
                );
            }
            Ok("₹69,999".to_string())
        }
    }

    fn two_results() -> Vec<SearchResult> {
        vec![
            SearchResult {
                title: "iPhone 16 Pro, 128GB".into(),
                snippet: "Best price ₹1,19,900 with discount".into(),
                link: "https://store.example/iphone".into(),
            },
            SearchResult {
                title: "iPhone 16 Pro — compare offers".into(),
                snippet: "Check the latest offers and reviews".into(),
                link: "https://compare.example/iphone".into(),
            },
        ]
    }

    #[tokio::test]
    async fn end_to_end_one_record_per_path() {
        let scraper = MapScraper(HashMap::from([(
            "https://compare.example/iphone".to_string(),
            "# iPhone 16 Pro\nDeal of the day".to_string(),
        )]));
        let pipeline = Pipeline::new(
            Arc::new(StaticSearch(two_results())),
            Arc::new(scraper),
            Some(Arc::new(ScriptedLlm)),
            PipelineOptions::default(),
        );

        let report = pipeline.run("IN", "iPhone 16 Pro, 128GB").await;

        assert_eq!(report.records.len(), 2);
        // One record from snippet extraction, one from the scrape fallback.
        assert_eq!(report.records[0].link, "https://store.example/iphone");
        assert_eq!(report.records[0].price, "119900");
        assert_eq!(report.records[1].link, "https://compare.example/iphone");
        assert_eq!(report.records[1].price, "69999");
        assert!(report.sources.iter().all(|s| s.status == SourceStatus::Ok));
    }

    #[tokio::test]
    async fn search_failure_degrades_to_empty_report() {
        let pipeline = Pipeline::new(
            Arc::new(FailingSearch),
            Arc::new(MapScraper(HashMap::new())),
            Some(Arc::new(ScriptedLlm)),
            PipelineOptions::default(),
        );

        let report = pipeline.run("IN", "anything").await;
        assert!(report.records.is_empty());
        assert!(report.sources.is_empty());
    }

    #[tokio::test]
    async fn results_without_links_are_dropped_before_classification() {
        let mut results = two_results();
        results.push(SearchResult::default());
        let scraper = MapScraper(HashMap::new());
        let pipeline = Pipeline::new(
            Arc::new(StaticSearch(results)),
            Arc::new(scraper),
            Some(Arc::new(ScriptedLlm)),
            PipelineOptions::default(),
        );

        let report = pipeline.run("IN", "iPhone 16 Pro, 128GB").await;
        // The linkless result contributes neither a record nor a status.
        assert_eq!(report.sources.len(), 2);
    }

    #[tokio::test]
    async fn no_llm_runs_the_regex_paths() {
        let scraper = MapScraper(HashMap::from([(
            "https://compare.example/iphone".to_string(),
            "Grab it for ₹1,09,900 while stocks last".to_string(),
        )]));
        let pipeline = Pipeline::new(
            Arc::new(StaticSearch(two_results())),
            Arc::new(scraper),
            None,
            PipelineOptions::default(),
        );

        let report = pipeline.run("IN", "iPhone 16 Pro, 128GB").await;
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].price, "119900");
        assert_eq!(report.records[1].price, "109900");
    }

    #[test]
    fn report_into_response_keeps_order() {
        let report = PriceReport {
            records: vec![
                PriceRecord {
                    link: "https://a.example".into(),
                    price: "1".into(),
                },
                PriceRecord {
                    link: "https://b.example".into(),
                    price: "2".into(),
                },
            ],
            sources: Vec::new(),
        };
        let response = report.into_response("INR", "widget");
        assert_eq!(response.currency, "INR");
        assert_eq!(response.product, "widget");
        assert_eq!(response.price_list.len(), 2);
        assert_eq!(response.price_list[0].price, "1");
    }
}
