use std::time::Duration;
use thiserror::Error;

/// Errors that can abort a crawl run
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The listing container never appeared on the page
    #[error("Timed out after {timeout:?} waiting for `{selector}` on {url}")]
    ExtractionTimeout {
        selector: String,
        url: String,
        timeout: Duration,
    },

    /// Clicking the next-page control did not complete a navigation
    #[error("Navigation to next page failed: {0}")]
    NavigationFailure(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
