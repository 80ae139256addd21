//! Partition search results into "price visible in snippet" and "needs a
//! page fetch".
//!
//! The LLM path asks for a fenced JSON index array and fails closed: any
//! generation or parse failure routes every result to the scrape fallback.

use std::collections::HashSet;

use tracing::{debug, warn};

use pricelens_llm::extract_json_output;

use crate::snippet;
use crate::{SearchResult, TextGenerator, prompts};

/// Disjoint, order-preserving split of the input results.
#[derive(Debug, Default)]
pub struct Partition {
    pub with_price: Vec<SearchResult>,
    pub needs_fetch: Vec<SearchResult>,
}

/// Classify with the LLM.  Out-of-range indices are discarded; a malformed
/// reply yields an empty index set so everything routes to the fallback.
pub async fn classify(llm: &dyn TextGenerator, results: &[SearchResult]) -> Partition {
    let indices = request_indices(llm, results).await.unwrap_or_default();
    debug!(total = results.len(), with_price = indices.len(), "classified");
    partition(results, &indices)
}

async fn request_indices(llm: &dyn TextGenerator, results: &[SearchResult]) -> Option<Vec<i64>> {
    let payload = match serde_json::to_string_pretty(results) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize results for classification");
            return None;
        }
    };

    let reply = match llm.generate(&prompts::classify_prompt(&payload)).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(error = %err, "classifier generation failed");
            return None;
        }
    };

    let indices = extract_json_output::<Vec<i64>>(&reply);
    if indices.is_none() {
        warn!("classifier reply was not a fenced index array; routing all results to fallback");
    }
    indices
}

/// Split `results` by the given indices.  Every result lands in exactly one
/// side; indices outside `[0, len)` are ignored.
pub fn partition(results: &[SearchResult], indices: &[i64]) -> Partition {
    let keep: HashSet<usize> = indices
        .iter()
        .filter(|&&i| i >= 0 && (i as usize) < results.len())
        .map(|&i| i as usize)
        .collect();

    let mut split = Partition::default();
    for (i, result) in results.iter().enumerate() {
        if keep.contains(&i) {
            split.with_price.push(result.clone());
        } else {
            split.needs_fetch.push(result.clone());
        }
    }
    split
}

/// Regex-only classification, used when no LLM is configured.
pub fn classify_local(results: &[SearchResult]) -> Partition {
    let mut split = Partition::default();
    for result in results {
        let text = format!("{} {}", result.title, result.snippet);
        if snippet::contains_price(&text) {
            split.with_price.push(result.clone());
        } else {
            split.needs_fetch.push(result.clone());
        }
    }
    split
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    fn result(link: &str, snippet: &str) -> SearchResult {
        SearchResult {
            title: String::new(),
            snippet: snippet.to_string(),
            link: link.to_string(),
        }
    }

    fn five_results() -> Vec<SearchResult> {
        (0..5).map(|i| result(&format!("https://s{i}.example"), "x")).collect()
    }

    struct FixedReply(&'static str);

    #[async_trait]
    impl TextGenerator for FixedReply {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl TextGenerator for FailingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("upstream down")
        }
    }

    // ── partition ──────────────────────────────────────────────────────────

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let results = five_results();
        let split = partition(&results, &[1, 3]);
        assert_eq!(split.with_price.len() + split.needs_fetch.len(), results.len());
        for r in &results {
            let in_priced = split.with_price.contains(r);
            let in_fetch = split.needs_fetch.contains(r);
            assert!(in_priced ^ in_fetch, "{} must land in exactly one side", r.link);
        }
    }

    #[test]
    fn partition_discards_out_of_range_indices() {
        let results = five_results();
        let split = partition(&results, &[1, 3, 99]);
        assert_eq!(split.with_price.len(), 2);
        assert_eq!(split.with_price[0].link, "https://s1.example");
        assert_eq!(split.with_price[1].link, "https://s3.example");
        let fetch_links: Vec<_> = split.needs_fetch.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            fetch_links,
            ["https://s0.example", "https://s2.example", "https://s4.example"]
        );
    }

    #[test]
    fn partition_handles_negative_indices() {
        let results = five_results();
        let split = partition(&results, &[-1, 2]);
        assert_eq!(split.with_price.len(), 1);
        assert_eq!(split.with_price[0].link, "https://s2.example");
    }

    // ── classify (LLM path) ────────────────────────────────────────────────

    #[tokio::test]
    async fn classify_uses_fenced_indices() {
        let results = five_results();
        let llm = FixedReply("Sure:\n```json\n[0, 4]\n```");
        let split = classify(&llm, &results).await;
        assert_eq!(split.with_price.len(), 2);
        assert_eq!(split.needs_fetch.len(), 3);
    }

    #[tokio::test]
    async fn malformed_reply_routes_everything_to_fallback() {
        let results = five_results();
        let llm = FixedReply("results 1 and 3 look priced to me");
        let split = classify(&llm, &results).await;
        assert!(split.with_price.is_empty());
        assert_eq!(split.needs_fetch.len(), 5);
    }

    #[tokio::test]
    async fn generation_failure_routes_everything_to_fallback() {
        let results = five_results();
        let split = classify(&FailingLlm, &results).await;
        assert!(split.with_price.is_empty());
        assert_eq!(split.needs_fetch.len(), 5);
    }

    // ── classify_local ─────────────────────────────────────────────────────

    #[test]
    fn local_classification_uses_snippet_patterns() {
        let results = vec![
            result("https://a.example", "Buy now for $999.00"),
            result("https://b.example", "Learn about prices and features"),
        ];
        let split = classify_local(&results);
        assert_eq!(split.with_price.len(), 1);
        assert_eq!(split.with_price[0].link, "https://a.example");
        assert_eq!(split.needs_fetch.len(), 1);
    }
}
