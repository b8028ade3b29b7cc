//! In-memory renderer and sink used by the unit tests

use crate::error::{Result, ScrapeError};
use crate::models::{Column, ListingRecord, OfferType, ParsedListing};
use crate::output::Sink;
use crate::scrapers::extractor::{AREA_SELECTOR, TITLE_SELECTOR, YEAR_SELECTOR};
use crate::scrapers::Renderer;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn parsed(title: &str) -> ParsedListing {
    ParsedListing {
        category: "stanovanje".to_string(),
        room_count: Some(2.0),
        property_type_detail: None,
        region: "ljubljana-mesto".to_string(),
        location_detail: title.to_string(),
        area_sqm: Some(54.0),
        year_built: Some("1968".to_string()),
        year_renovated: None,
        offer_type: OfferType::Agency,
        price: Some("210.000".to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Reset,
    Header(Vec<Column>),
    /// IDs of the appended records
    Append(Vec<u64>),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    pub records: Vec<ListingRecord>,
}

impl RecordingSink {
    pub fn count(&self, matches: impl Fn(&SinkCall) -> bool) -> usize {
        self.calls.iter().filter(|c| matches(*c)).count()
    }
}

impl Sink for RecordingSink {
    fn reset(&mut self) -> Result<()> {
        self.calls.push(SinkCall::Reset);
        self.records.clear();
        Ok(())
    }

    fn write_header(&mut self, columns: &[Column]) -> Result<()> {
        self.calls.push(SinkCall::Header(columns.to_vec()));
        Ok(())
    }

    fn append_rows(&mut self, _columns: &[Column], records: &[ListingRecord]) -> Result<()> {
        self.calls
            .push(SinkCall::Append(records.iter().map(ListingRecord::id).collect()));
        self.records.extend_from_slice(records);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockListing {
    pub title: Option<String>,
    pub text: String,
    pub area: Option<String>,
    pub year: Option<String>,
}

impl MockListing {
    pub fn text_only(title: &str, text: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn described(title: &str, text: &str, area: &str, year: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            text: text.to_string(),
            area: Some(area.to_string()),
            year: Some(year.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockPage {
    pub url: String,
    pub listings: Vec<MockListing>,
}

/// Pages reachable from one seed, walked through by `navigate_via`.
///
/// Blank until `load` fills in the site.
#[derive(Default)]
pub struct MockTab {
    pages: Mutex<Vec<MockPage>>,
    current: AtomicUsize,
}

impl MockTab {
    fn page(&self) -> Result<MockPage> {
        self.pages
            .lock()
            .unwrap()
            .get(self.current.load(Ordering::SeqCst))
            .cloned()
            .ok_or_else(|| ScrapeError::Browser("page is blank".to_string()))
    }

    fn page_count(&self) -> usize {
        self.pages.lock().unwrap().len()
    }
}

pub enum MockElement {
    Listing(MockListing),
    Next,
}

#[derive(Default)]
pub struct MockRenderer {
    sites: HashMap<String, Vec<MockPage>>,
    /// Page index whose navigation fails
    pub fail_navigation_to: Option<usize>,
    pub log: Mutex<Vec<String>>,
}

impl MockRenderer {
    /// Register the pages served when `url` is loaded
    pub fn with_site(mut self, url: &str, pages: Vec<MockPage>) -> Self {
        self.sites.insert(url.to_string(), pages);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    type Page = MockTab;
    type Element = MockElement;

    async fn open(&self) -> Result<MockTab> {
        self.record("open".to_string());
        Ok(MockTab::default())
    }

    async fn load(&self, page: &MockTab, url: &str) -> Result<()> {
        self.record(format!("load {url}"));
        let pages = self
            .sites
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Browser(format!("no such site: {url}")))?;
        *page.pages.lock().unwrap() = pages;
        page.current.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn set_identity(&self, _page: &MockTab, user_agent: &str) -> Result<()> {
        self.record(format!("identity {user_agent}"));
        Ok(())
    }

    async fn set_viewport(&self, _page: &MockTab, width: u32, height: u32) -> Result<()> {
        self.record(format!("viewport {width}x{height}"));
        Ok(())
    }

    async fn current_url(&self, page: &MockTab) -> Result<String> {
        Ok(page.page()?.url)
    }

    async fn wait_for_selector(
        &self,
        page: &MockTab,
        selector: &str,
        timeout: Duration,
    ) -> Result<()> {
        let current = page.page()?;
        if current.listings.is_empty() {
            return Err(ScrapeError::ExtractionTimeout {
                selector: selector.to_string(),
                url: current.url.clone(),
                timeout,
            });
        }
        Ok(())
    }

    async fn query_all(&self, page: &MockTab, _selector: &str) -> Result<Vec<MockElement>> {
        Ok(page
            .page()?
            .listings
            .into_iter()
            .map(MockElement::Listing)
            .collect())
    }

    async fn extract_text(
        &self,
        element: &MockElement,
        selector: Option<&str>,
    ) -> Result<Option<String>> {
        let MockElement::Listing(listing) = element else {
            return Ok(None);
        };
        Ok(match selector {
            None => Some(listing.text.clone()),
            Some(TITLE_SELECTOR) => listing.title.clone(),
            Some(AREA_SELECTOR) => listing.area.clone(),
            Some(YEAR_SELECTOR) => listing.year.clone(),
            Some(_) => None,
        })
    }

    async fn find_next(&self, page: &MockTab) -> Result<Option<MockElement>> {
        let has_next = page.current.load(Ordering::SeqCst) + 1 < page.page_count();
        Ok(has_next.then_some(MockElement::Next))
    }

    async fn navigate_via(&self, page: &MockTab, element: MockElement) -> Result<()> {
        if !matches!(element, MockElement::Next) {
            return Err(ScrapeError::NavigationFailure(
                "element is not a link".to_string(),
            ));
        }
        let target = page.current.load(Ordering::SeqCst) + 1;
        if self.fail_navigation_to == Some(target) {
            return Err(ScrapeError::NavigationFailure(format!(
                "page {target} did not load"
            )));
        }
        let url = page.pages.lock().unwrap()[target].url.clone();
        self.record(format!("navigate {url}"));
        page.current.store(target, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self, page: MockTab) -> Result<()> {
        let first = page
            .pages
            .lock()
            .unwrap()
            .first()
            .map(|p| p.url.clone())
            .unwrap_or_default();
        self.record(format!("close {first}"));
        Ok(())
    }
}
