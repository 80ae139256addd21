mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pricelens_config::AppConfig;
use pricelens_llm::GeminiClient;
use pricelens_pipeline::{Pipeline, PipelineOptions, TextGenerator};
use pricelens_providers::{FirecrawlClient, SerpApiClient};

#[derive(Debug, Parser)]
#[command(name = "pricelens", version, about = "Price-comparison lookup service")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "pricelens.toml")]
    config: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP server (the default).
    Serve {
        /// Listen address override.
        #[arg(long)]
        addr: Option<String>,
    },
    /// Run a single lookup and print the JSON response.
    Lookup {
        /// Two-letter country code, e.g. IN.
        #[arg(long)]
        country: String,
        /// Product query, e.g. "iPhone 16 Pro, 128GB".
        #[arg(long)]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    let pipeline = Arc::new(build_pipeline(&config)?);

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            server::serve(&addr, pipeline).await
        }
        Commands::Lookup { country, query } => {
            let response = server::lookup(&pipeline, &country, &query).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let search = SerpApiClient::new(
        config.search.api_key.clone(),
        config.search.result_count,
        Duration::from_secs(config.search.timeout_secs),
    )?;
    let scraper = FirecrawlClient::new(
        config.scrape.api_key.clone(),
        config.scrape.wait_for_ms,
        Duration::from_secs(config.scrape.timeout_secs),
    )?;

    let llm: Option<Arc<dyn TextGenerator>> = if config.llm.api_key.is_empty() {
        warn!("no Gemini key configured; classification and extraction fall back to regex patterns");
        None
    } else {
        Some(Arc::new(GeminiClient::new(
            config.llm.api_key.clone(),
            config.llm.model.clone(),
            Duration::from_secs(config.llm.timeout_secs),
        )?))
    };

    let options = PipelineOptions {
        max_links: config.scrape.max_links,
        concurrency: config.scrape.concurrency,
        content_limit: config.scrape.content_limit,
    };

    Ok(Pipeline::new(
        Arc::new(search),
        Arc::new(scraper),
        llm,
        options,
    ))
}
