mod error;
mod models;
mod output;
mod scrapers;
#[cfg(test)]
mod testing;

use anyhow::Context;
use models::Column;
use output::{CsvSink, RecordAccumulator};
use scrapers::{random_user_agent, ChromeRenderer, CrawlConfig, CrawlController};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "scout.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🏠 Nepremicnine Scout");
    info!("=====================");

    let config_path = std::env::var_os("SCOUT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = CrawlConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if config.seeds.is_empty() {
        warn!("No seeds configured; the output will only contain the header");
    }
    info!(
        "Crawling {} seeds into {}",
        config.seeds.len(),
        config.output.path
    );

    // Start from a fresh table even if Chrome never comes up
    let mut accumulator = RecordAccumulator::new(
        CsvSink::new(&config.output.path),
        Column::layout(config.output.detail_columns),
    );
    accumulator
        .begin()
        .with_context(|| format!("Failed to prepare {}", config.output.path))?;

    let user_agent = random_user_agent();
    info!("Using user agent: {}", user_agent);

    let renderer = ChromeRenderer::new(&config.browser, user_agent)?;
    let mut controller = CrawlController::new(&renderer, &config, accumulator, user_agent);
    let summary = controller.run().await.context("Crawl aborted")?;
    let sink = controller.into_sink()?;

    let elapsed = summary.finished_at - summary.started_at;
    info!(
        "✅ Crawled {} seeds, {} pages in {}s",
        summary.seeds_crawled,
        summary.pages_visited,
        elapsed.num_seconds()
    );
    info!(
        "💾 Saved {} listings to {}",
        summary.records_written,
        sink.path().display()
    );

    Ok(())
}
