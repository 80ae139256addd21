//! Price extraction from the snippet-priced partition.

use serde::Deserialize;
use tracing::warn;

use pricelens_llm::extract_json_output;

use crate::sanitize::sanitize_price;
use crate::{PriceRecord, SearchResult, SourceOutcome, SourceStatus, TextGenerator, prompts, snippet};

/// One element of the model's reply.  Both keys must be present for the
/// element to count; extra keys are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    link: Option<String>,
    price: Option<String>,
}

/// Run the extraction prompt over the snippet-priced results.
///
/// A reply that is not a fenced JSON array of objects yields zero records and
/// an `Unparseable` status per input link.  Records whose sanitized price is
/// `"0"` are kept (the snippet said a price was there; the status records
/// that none was recovered).
pub async fn extract_snippet_prices(
    llm: &dyn TextGenerator,
    with_price: &[SearchResult],
) -> (Vec<PriceRecord>, Vec<SourceOutcome>) {
    if with_price.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let payload = match serde_json::to_string_pretty(with_price) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize priced results");
            return (Vec::new(), all_with(with_price, SourceStatus::Unparseable));
        }
    };

    let reply = match llm.generate(&prompts::extract_prompt(&payload)).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(error = %err, "price extraction generation failed");
            return (Vec::new(), all_with(with_price, SourceStatus::UpstreamError));
        }
    };

    let Some(raw) = extract_json_output::<Vec<RawRecord>>(&reply) else {
        warn!("extraction reply was not a fenced record array");
        return (Vec::new(), all_with(with_price, SourceStatus::Unparseable));
    };

    let mut records = Vec::new();
    for item in raw {
        let (Some(link), Some(price)) = (item.link, item.price) else {
            continue;
        };
        records.push(PriceRecord {
            link: link.trim().to_string(),
            price: sanitize_price(&price),
        });
    }

    let sources = with_price
        .iter()
        .map(|result| {
            let status = match records.iter().find(|r| r.link == result.link) {
                Some(record) if record.price == "0" => SourceStatus::NoPrice,
                Some(_) => SourceStatus::Ok,
                None => SourceStatus::Unparseable,
            };
            SourceOutcome {
                link: result.link.clone(),
                status,
            }
        })
        .collect();

    (records, sources)
}

/// Regex-only extraction, used when no LLM is configured.
pub fn extract_snippet_prices_local(
    with_price: &[SearchResult],
) -> (Vec<PriceRecord>, Vec<SourceOutcome>) {
    let mut records = Vec::new();
    let mut sources = Vec::new();
    for result in with_price {
        let text = format!("{} {}", result.title, result.snippet);
        let price = snippet::extract_price(&text).unwrap_or_else(|| "0".to_string());
        sources.push(SourceOutcome {
            link: result.link.clone(),
            status: if price == "0" {
                SourceStatus::NoPrice
            } else {
                SourceStatus::Ok
            },
        });
        records.push(PriceRecord {
            link: result.link.clone(),
            price,
        });
    }
    (records, sources)
}

fn all_with(results: &[SearchResult], status: SourceStatus) -> Vec<SourceOutcome> {
    results
        .iter()
        .map(|result| SourceOutcome {
            link: result.link.clone(),
            status,
        })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────
