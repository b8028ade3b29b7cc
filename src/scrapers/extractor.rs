use crate::error::Result;
use crate::models::{ListingLayout, PageContext, RawListingBlock};
use crate::scrapers::Renderer;
use std::time::Duration;
use tracing::debug;

pub const LISTING_SELECTOR: &str = ".property-details";
pub const TITLE_SELECTOR: &str = "h2";
pub const AREA_SELECTOR: &str = "ul[itemprop='disambiguatingDescription'] li:nth-child(1)";
pub const YEAR_SELECTOR: &str = "ul[itemprop='disambiguatingDescription'] li:nth-child(2)";

/// Pulls the raw listing blocks off the page a renderer currently shows
pub struct PageExtractor {
    wait_timeout: Duration,
}

impl PageExtractor {
    pub fn new(wait_timeout: Duration) -> Self {
        Self { wait_timeout }
    }

    /// Wait for listings to appear, then read every one in document order
    pub async fn extract<R: Renderer>(
        &self,
        renderer: &R,
        page: &R::Page,
        context: &PageContext,
    ) -> Result<Vec<RawListingBlock>> {
        renderer
            .wait_for_selector(page, LISTING_SELECTOR, self.wait_timeout)
            .await?;

        let elements = renderer.query_all(page, LISTING_SELECTOR).await?;
        let mut blocks = Vec::with_capacity(elements.len());

        for element in &elements {
            let title = match renderer.extract_text(element, Some(TITLE_SELECTOR)).await? {
                Some(title) => title.trim().to_string(),
                None => {
                    debug!("Listing without a title");
                    String::new()
                }
            };

            let text = renderer
                .extract_text(element, None)
                .await?
                .map(|t| collapse_whitespace(&t))
                .unwrap_or_default();

            let layout = match renderer.extract_text(element, Some(AREA_SELECTOR)).await? {
                Some(area) => ListingLayout::Described {
                    area: area.trim().to_string(),
                    year_built: renderer.extract_text(element, Some(YEAR_SELECTOR)).await?,
                },
                None => ListingLayout::TextOnly,
            };

            blocks.push(RawListingBlock {
                title,
                text,
                layout,
                context: context.clone(),
            });
        }

        debug!("Extracted {} listing blocks", blocks.len());
        Ok(blocks)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
