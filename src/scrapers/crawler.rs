use crate::error::Result;
use crate::models::{PageContext, ParsedListing, RawListingBlock};
use crate::output::{RecordAccumulator, Sink};
use crate::scrapers::extractor::PageExtractor;
use crate::scrapers::parser::parse_listing;
use crate::scrapers::types::{CrawlConfig, PacingConfig};
use crate::scrapers::Renderer;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a finished run did
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub seeds_crawled: usize,
    pub pages_visited: usize,
    pub records_written: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Walks every seed through all of its result pages, one page at a time.
///
/// The sink is reset before the first page is requested. Each page is then
/// extracted, parsed and flushed before the next one is requested. Any renderer
/// or sink failure aborts the run; rows flushed before the failure stay in the
/// sink.
pub struct CrawlController<'a, R: Renderer, S: Sink> {
    renderer: &'a R,
    config: &'a CrawlConfig,
    extractor: PageExtractor,
    accumulator: RecordAccumulator<S>,
    user_agent: String,
    pages_visited: usize,
}

impl<'a, R: Renderer, S: Sink> CrawlController<'a, R, S> {
    pub fn new(
        renderer: &'a R,
        config: &'a CrawlConfig,
        accumulator: RecordAccumulator<S>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            config,
            extractor: PageExtractor::new(config.browser.wait_timeout()),
            accumulator,
            user_agent: user_agent.into(),
            pages_visited: 0,
        }
    }

    /// Crawl all seeds in order and return the run summary
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        let started_at = Utc::now();
        let config = self.config;
        self.accumulator.begin()?;

        for (i, seed) in config.seeds.iter().enumerate() {
            info!("Seed {}/{}: {}", i + 1, config.seeds.len(), seed);
            self.crawl_seed(seed).await?;
        }

        Ok(CrawlSummary {
            seeds_crawled: config.seeds.len(),
            pages_visited: self.pages_visited,
            records_written: self.accumulator.records_written(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Hand back the sink, whether or not the run succeeded
    pub fn into_sink(self) -> Result<S> {
        self.accumulator.finish()
    }

    /// Crawl one seed on its own page, closing the page even when crawling fails
    async fn crawl_seed(&mut self, seed: &str) -> Result<()> {
        let renderer = self.renderer;
        let url = self.config.first_page_url(seed);

        let page = renderer.open().await?;
        let crawled = self.crawl_pages(&page, &url).await;
        match crawled {
            Ok(()) => renderer.close(page).await,
            Err(e) => {
                if let Err(close_err) = renderer.close(page).await {
                    warn!("Failed to close page for {}: {}", url, close_err);
                }
                Err(e)
            }
        }
    }

    async fn crawl_pages(&mut self, page: &R::Page, url: &str) -> Result<()> {
        let renderer = self.renderer;

        renderer.set_identity(page, &self.user_agent).await?;
        renderer
            .set_viewport(
                page,
                self.config.browser.viewport_width,
                self.config.browser.viewport_height,
            )
            .await?;
        renderer.load(page, url).await?;

        let context = PageContext::from_url(&renderer.current_url(page).await?);
        if context.category.is_empty() || context.region.is_empty() {
            warn!("Could not derive category/region from {}", url);
        }
        debug!(
            "Seed context: category={}, region={}",
            context.category, context.region
        );

        self.emit_page(page, &context).await?;

        while let Some(next) = renderer.find_next(page).await? {
            renderer.navigate_via(page, next).await?;
            self.emit_page(page, &context).await?;
            pause(&self.config.pacing).await;
        }

        info!("Seed exhausted after {} pages so far", self.pages_visited);
        Ok(())
    }

    async fn emit_page(&mut self, page: &R::Page, context: &PageContext) -> Result<()> {
        let blocks = self.extractor.extract(self.renderer, page, context).await?;
        let batch: Vec<ParsedListing> = blocks.iter().map(parse_checked).collect();

        let records = self.accumulator.flush(batch)?;
        for record in &records {
            debug!("#{} {}", record.id(), record.listing().location_detail);
        }
        self.pages_visited += 1;
        info!(
            "Page {}: saved {} listings (total {})",
            self.pages_visited,
            records.len(),
            self.accumulator.records_written()
        );
        Ok(())
    }
}

fn parse_checked(block: &RawListingBlock) -> ParsedListing {
    let listing = parse_listing(block);
    let missing = listing.missing_fields();
    if !missing.is_empty() {
        warn!(
            "Listing \"{}\" is missing {}",
            listing.location_detail,
            missing.join(", ")
        );
    }
    listing
}

async fn pause(pacing: &PacingConfig) {
    let millis = if pacing.max_delay_ms <= pacing.min_delay_ms {
        pacing.min_delay_ms
    } else {
        rand::thread_rng().gen_range(pacing.min_delay_ms..=pacing.max_delay_ms)
    };
    if millis > 0 {
        debug!("Waiting {} ms before the next page", millis);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}
