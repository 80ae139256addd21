//! Scrape-and-extract fallback for results with no price in their snippet.
//!
//! Pages are fetched through the scraping provider with a bounded-width,
//! order-preserving worker pool; a failure on one link never aborts the rest.

use futures::StreamExt;
use futures::stream;
use tracing::{debug, warn};

use crate::sanitize::sanitize_price;
use crate::{
    PageScraper, PipelineOptions, PriceRecord, SearchResult, SourceOutcome, SourceStatus,
    TextGenerator, prompts, snippet,
};

/// Fetch each page and extract a single price from its content.
///
/// Only links that both scraped successfully and produced a non-`"0"` price
/// contribute a record; every processed link contributes a status.
pub async fn scrape_prices(
    scraper: &dyn PageScraper,
    llm: Option<&dyn TextGenerator>,
    needs_fetch: &[SearchResult],
    options: &PipelineOptions,
) -> (Vec<PriceRecord>, Vec<SourceOutcome>) {
    if needs_fetch.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let capped = &needs_fetch[..needs_fetch.len().min(options.max_links)];
    if capped.len() < needs_fetch.len() {
        warn!(
            dropped = needs_fetch.len() - capped.len(),
            cap = options.max_links,
            "scrape cap reached; remaining links skipped"
        );
    }

    let outcomes: Vec<(Option<PriceRecord>, SourceOutcome)> = stream::iter(0..capped.len())
        .map(|i| scrape_one(scraper, llm, &capped[i], options))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut records = Vec::new();
    let mut sources = Vec::new();
    for (record, outcome) in outcomes {
        records.extend(record);
        sources.push(outcome);
    }
    (records, sources)
}

async fn scrape_one(
    scraper: &dyn PageScraper,
    llm: Option<&dyn TextGenerator>,
    result: &SearchResult,
    options: &PipelineOptions,
) -> (Option<PriceRecord>, SourceOutcome) {
    let link = result.link.clone();

    let content = match scraper.fetch_content(&link).await {
        Ok(content) => content,
        Err(err) => {
            warn!(link = %link, error = %err, "page fetch failed");
            return (
                None,
                SourceOutcome {
                    link,
                    status: SourceStatus::UpstreamError,
                },
            );
        }
    };

    let content = truncate_chars(&content, options.content_limit);
    let price = extract_page_price(llm, &content).await;
    debug!(link = %link, price = %price, "page extraction complete");

    if price == "0" {
        return (
            None,
            SourceOutcome {
                link,
                status: SourceStatus::NoPrice,
            },
        );
    }

    let record = PriceRecord {
        link: link.clone(),
        price,
    };
    (
        Some(record),
        SourceOutcome {
            link,
            status: SourceStatus::Ok,
        },
    )
}

/// Single-value extraction: the LLM when available, the regex patterns when it
/// is absent or its call fails.
async fn extract_page_price(llm: Option<&dyn TextGenerator>, content: &str) -> String {
    if let Some(llm) = llm {
        match llm.generate(&prompts::page_price_prompt(content)).await {
            Ok(reply) => return sanitize_price(reply.trim()),
            Err(err) => {
                warn!(error = %err, "page extraction generation failed, using regex fallback");
            }
        }
    }
    snippet::extract_price(content).unwrap_or_else(|| "0".to_string())
}

fn truncate_chars(content: &str, limit: usize) -> String {
    content.chars().take(limit).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────
