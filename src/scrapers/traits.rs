use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Browser-like backend that renders listing pages and navigates between them
///
/// The crawler only talks to the site through this trait, so a headless Chrome
/// session and an in-memory fake can be swapped freely.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Handle to an open page
    type Page: Send + Sync;
    /// Handle to an element on a page
    type Element: Send + Sync;

    /// Open a new blank page
    async fn open(&self) -> Result<Self::Page>;

    /// Navigate `page` to `url` and wait for it to finish loading
    async fn load(&self, page: &Self::Page, url: &str) -> Result<()>;

    async fn set_identity(&self, page: &Self::Page, user_agent: &str) -> Result<()>;

    async fn set_viewport(&self, page: &Self::Page, width: u32, height: u32) -> Result<()>;

    /// URL the page currently shows, after any redirects
    async fn current_url(&self, page: &Self::Page) -> Result<String>;

    /// Block until `selector` matches, failing with `ExtractionTimeout` after `timeout`
    async fn wait_for_selector(
        &self,
        page: &Self::Page,
        selector: &str,
        timeout: Duration,
    ) -> Result<()>;

    /// All elements matching `selector`, in document order
    async fn query_all(&self, page: &Self::Page, selector: &str) -> Result<Vec<Self::Element>>;

    /// Text of `element`, or of its first descendant matching `selector`.
    ///
    /// Returns `None` when the selector matches nothing.
    async fn extract_text(
        &self,
        element: &Self::Element,
        selector: Option<&str>,
    ) -> Result<Option<String>>;

    /// The next-page control, if the page has one
    async fn find_next(&self, page: &Self::Page) -> Result<Option<Self::Element>>;

    /// Activate `element` and wait for the resulting navigation in one step
    async fn navigate_via(&self, page: &Self::Page, element: Self::Element) -> Result<()>;

    async fn close(&self, page: Self::Page) -> Result<()>;
}
