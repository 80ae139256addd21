use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// SerpApi key.  Can also be set via `SERP_API_KEY` (env takes precedence).
    pub api_key: String,
    /// Number of organic results requested per search.
    pub result_count: usize,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            result_count: 20,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Gemini API key.  Can also be set via `GEMINI_API_KEY` (env takes
    /// precedence).  When empty the pipeline falls back to local regex
    /// classification and extraction.
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Firecrawl key.  Can also be set via `FIRECRAWL_API_KEY` (env takes
    /// precedence).
    pub api_key: String,
    /// Milliseconds the scraping provider waits for dynamic content.
    pub wait_for_ms: u64,
    /// Upper bound on pages fetched per request.
    pub max_links: usize,
    /// Width of the scrape worker pool.
    pub concurrency: usize,
    /// Page content is truncated to this many characters before extraction.
    pub content_limit: usize,
    pub timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            wait_for_ms: 2000,
            max_links: 10,
            concurrency: 4,
            content_limit: 5000,
            timeout_secs: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub scrape: ScrapeConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply env-var overrides.
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(key) = env::var("SERP_API_KEY") {
            if !key.is_empty() {
                config.search.api_key = key;
            }
        }
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                config.llm.api_key = key;
            }
        }
        if let Ok(key) = env::var("FIRECRAWL_API_KEY") {
            if !key.is_empty() {
                config.scrape.api_key = key;
            }
        }

        Ok(config)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
