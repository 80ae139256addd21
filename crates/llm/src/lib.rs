use std::time::Duration;

use anyhow::{Result, bail};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Send one prompt and return the model's reply text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let endpoint = format!("{GEMINI_BASE_URL}/{}:generateContent", self.model);
        let payload = json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gemini error ({status}): {body}");
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            bail!("Gemini response contained no text");
        }

        debug!(model = %self.model, chars = text.len(), "generation complete");
        Ok(text)
    }
}

// ── Structured output extraction ──────────────────────────────────────────────

/// Parse a typed value out of an LLM reply that was instructed to answer with
/// a fenced ` ```json ` block.
///
/// The contract is deliberately strict: when a fence is present its content is
/// authoritative — an invalid fenced body fails the whole extraction rather
/// than falling back to scanning the surrounding prose.  A reply with no fence
/// is accepted only when the entire trimmed text parses as the expected type.
/// Everything else returns `None`, and callers are expected to fail closed.
pub fn extract_json_output<T: serde::de::DeserializeOwned>(response: &str) -> Option<T> {
    if let Some(fence_start) = response.find("```json") {
        let after_fence = &response[fence_start + "```json".len()..];
        let fence_end = after_fence.find("```")?;
        let json_str = after_fence[..fence_end].trim();
        return serde_json::from_str(json_str).ok();
    }

    serde_json::from_str(response.trim()).ok()
}

// ── Tests ────────────────────────────────────────────────────────────────────
