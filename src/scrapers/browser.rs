use crate::error::{Result, ScrapeError};
use crate::scrapers::types::BrowserConfig;
use crate::scrapers::Renderer;
use anyhow::Context;
use async_trait::async_trait;
use headless_chrome::types::Bounds;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::seq::SliceRandom;
use scraper::{Html, Selector};
use std::ffi::{OsStr, OsString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Link to the following results page
pub const NEXT_PAGE_SELECTOR: &str = ".paging_next a";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
];

/// Pick a desktop browser user agent for this run
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Open Chrome tab
pub struct ChromePage {
    tab: Arc<Tab>,
}

/// Outer HTML of an element at query time
pub struct ChromeElement {
    html: String,
}

/// Renderer backed by headless Chrome.
///
/// CDP calls are blocking, so each one runs on the blocking thread pool and is
/// awaited before the next is issued. Element reads work on HTML snapshots
/// parsed with `scraper`; only navigation touches the live tab.
pub struct ChromeRenderer {
    browser: Browser,
}

impl ChromeRenderer {
    /// Launch a new Chrome instance that identifies itself as `user_agent`
    pub fn new(config: &BrowserConfig, user_agent: &str) -> anyhow::Result<Self> {
        info!("Launching Chrome (headless: {})...", config.headless);

        let user_agent_arg = OsString::from(format!("--user-agent={user_agent}"));
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.viewport_width, config.viewport_height)))
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                user_agent_arg.as_os_str(),
            ])
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self { browser })
    }
}

/// Run a blocking tab operation off the async runtime
async fn on_tab<T, F>(tab: &Arc<Tab>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
{
    let tab = Arc::clone(tab);
    tokio::task::spawn_blocking(move || op(&tab))
        .await
        .map_err(|e| ScrapeError::Browser(format!("browser task panicked: {e}")))?
        .map_err(|e| ScrapeError::Browser(format!("{e:#}")))
}

/// Whether a failed wait ran out of time rather than losing the tab
fn is_wait_timeout(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Timeout>().is_some()
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Browser(format!("invalid selector `{selector}`: {e}")))
}

/// Outer HTML of every element in `html` matching `selector`
fn select_outer_html(html: &str, selector: &str) -> Result<Vec<String>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).map(|el| el.html()).collect())
}

/// Text content of a fragment, or of its first descendant matching `selector`
fn select_text(fragment: &str, selector: Option<&str>) -> Result<Option<String>> {
    let document = Html::parse_fragment(fragment);
    match selector {
        None => Ok(Some(document.root_element().text().collect())),
        Some(selector) => {
            let selector = parse_selector(selector)?;
            Ok(document
                .select(&selector)
                .next()
                .map(|el| el.text().collect()))
        }
    }
}

/// Absolute URL of the first link in `fragment`, resolved against `base`
fn link_target(fragment: &str, base: &str) -> Result<String> {
    let anchor = parse_selector("a[href]")?;
    let document = Html::parse_fragment(fragment);
    let href = document
        .select(&anchor)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| ScrapeError::NavigationFailure("next-page link has no href".to_string()))?;

    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|target| target.to_string())
        .map_err(|e| {
            ScrapeError::NavigationFailure(format!("cannot resolve {href} against {base}: {e}"))
        })
}

#[async_trait]
impl Renderer for ChromeRenderer {
    type Page = ChromePage;
    type Element = ChromeElement;

    async fn open(&self) -> Result<ChromePage> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| ScrapeError::Browser(format!("failed to open tab: {e:#}")))?;
        Ok(ChromePage { tab })
    }

    async fn load(&self, page: &ChromePage, url: &str) -> Result<()> {
        info!("Opening {}", url);
        let target = url.to_string();
        on_tab(&page.tab, move |tab| {
            tab.navigate_to(&target)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await
    }

    async fn set_identity(&self, page: &ChromePage, user_agent: &str) -> Result<()> {
        let user_agent = user_agent.to_string();
        on_tab(&page.tab, move |tab| {
            tab.set_user_agent(&user_agent, None, None)?;
            Ok(())
        })
        .await
    }

    async fn set_viewport(&self, page: &ChromePage, width: u32, height: u32) -> Result<()> {
        on_tab(&page.tab, move |tab| {
            tab.set_bounds(Bounds::Normal {
                left: None,
                top: None,
                width: Some(f64::from(width)),
                height: Some(f64::from(height)),
            })?;
            Ok(())
        })
        .await
    }

    async fn current_url(&self, page: &ChromePage) -> Result<String> {
        Ok(page.tab.get_url())
    }

    async fn wait_for_selector(
        &self,
        page: &ChromePage,
        selector: &str,
        timeout: Duration,
    ) -> Result<()> {
        let owned = selector.to_string();
        let found = on_tab(&page.tab, move |tab| {
            match tab.wait_for_element_with_custom_timeout(&owned, timeout) {
                Ok(_) => Ok(true),
                Err(e) if is_wait_timeout(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await?;

        if !found {
            debug!("Gave up waiting for {} after {:?}", selector, timeout);
            return Err(ScrapeError::ExtractionTimeout {
                selector: selector.to_string(),
                url: page.tab.get_url(),
                timeout,
            });
        }
        Ok(())
    }

    async fn query_all(&self, page: &ChromePage, selector: &str) -> Result<Vec<ChromeElement>> {
        let html = on_tab(&page.tab, |tab| Ok(tab.get_content()?)).await?;
        let elements = select_outer_html(&html, selector)?
            .into_iter()
            .map(|html| ChromeElement { html })
            .collect();
        Ok(elements)
    }

    async fn extract_text(
        &self,
        element: &ChromeElement,
        selector: Option<&str>,
    ) -> Result<Option<String>> {
        select_text(&element.html, selector)
    }

    async fn find_next(&self, page: &ChromePage) -> Result<Option<ChromeElement>> {
        let html = on_tab(&page.tab, |tab| Ok(tab.get_content()?)).await?;
        Ok(select_outer_html(&html, NEXT_PAGE_SELECTOR)?
            .into_iter()
            .next()
            .map(|html| ChromeElement { html }))
    }

    async fn navigate_via(&self, page: &ChromePage, element: ChromeElement) -> Result<()> {
        let target = link_target(&element.html, &page.tab.get_url())?;
        debug!("Following next-page link to {}", target);

        on_tab(&page.tab, move |tab| {
            tab.navigate_to(&target)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await
        .map_err(|e| ScrapeError::NavigationFailure(e.to_string()))?;

        debug!("Navigated to {}", page.tab.get_url());
        Ok(())
    }

    async fn close(&self, page: ChromePage) -> Result<()> {
        on_tab(&page.tab, |tab| {
            tab.close(true)?;
            Ok(())
        })
        .await
    }
}
