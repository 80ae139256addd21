//! SerpApi search client.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use pricelens_pipeline::{SearchProvider, SearchResult};

use crate::ProviderError;

const SERPAPI_URL: &str = "https://serpapi.com/search";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<SearchResult>,
}

#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    result_count: usize,
}

impl SerpApiClient {
    pub fn new(
        api_key: impl Into<String>,
        result_count: usize,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            result_count,
        })
    }

    /// Top organic results for the product query, scoped to the country's
    /// locale.  Source order is preserved.
    pub async fn search(
        &self,
        query: &str,
        country: &str,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let search_query = build_query(query, country);
        info!(query = %search_query, country, "serpapi search");

        let response = self
            .client
            .get(SERPAPI_URL)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
                ("q", &search_query),
                ("gl", &country.to_lowercase()),
                ("hl", "en"),
                ("num", &self.result_count.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { status });
        }

        let body: SerpResponse = response.json().await?;
        info!(count = body.organic_results.len(), "serpapi search complete");
        Ok(body.organic_results)
    }
}

fn build_query(query: &str, country: &str) -> String {
    format!(
        "{query} price in {} all stores",
        pricelens_country::country_name(country)
    )
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str, country: &str) -> Result<Vec<SearchResult>> {
        Ok(SerpApiClient::search(self, query, country).await?)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_embeds_country_display_name() {
        assert_eq!(
            build_query("iPhone 16 Pro, 128GB", "IN"),
            "iPhone 16 Pro, 128GB price in India all stores"
        );
    }

    #[test]
    fn query_echoes_unknown_country_codes() {
        assert_eq!(build_query("widget", "ZZ"), "widget price in ZZ all stores");
    }

    #[test]
    fn response_deserializes_organic_results_in_order() {
        let raw = r#"{
            "search_metadata": {"status": "Success"},
            "organic_results": [
                {"position": 1, "title": "A", "snippet": "costs $1", "link": "https://a.example"},
                {"position": 2, "title": "B", "link": "https://b.example"}
            ]
        }"#;
        let body: SerpResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.organic_results.len(), 2);
        assert_eq!(body.organic_results[0].title, "A");
        assert_eq!(body.organic_results[0].snippet, "costs $1");
        // Missing snippet defaults to empty rather than failing the decode.
        assert_eq!(body.organic_results[1].snippet, "");
        assert_eq!(body.organic_results[1].link, "https://b.example");
    }

    #[test]
    fn response_without_results_key_is_empty() {
        let body: SerpResponse = serde_json::from_str("{}").unwrap();
        assert!(body.organic_results.is_empty());
    }
}
