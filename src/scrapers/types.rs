use crate::error::{Result, ScrapeError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Crawl configuration, read from a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Listing collections to crawl, in order
    pub seeds: Vec<String>,
    /// Query string appended to each seed's first load (without the `?`)
    pub query: String,
    pub output: OutputConfig,
    pub browser: BrowserConfig,
    pub pacing: PacingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the CSV file, truncated at the start of each run
    pub path: String,
    /// Include the `hisa_tip` and `lokacija_podrobno` columns
    pub detail_columns: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "scraped_results.csv".to_string(),
            detail_columns: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// How long to wait for listings to appear on a page
    pub wait_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            wait_timeout_secs: 30,
        }
    }
}

impl BrowserConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// Random delay between page transitions
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            max_delay_ms: 6000,
        }
    }
}

impl CrawlConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CrawlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`CrawlConfig::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using defaults (no seeds)",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pacing.min_delay_ms > self.pacing.max_delay_ms {
            return Err(ScrapeError::Config(format!(
                "pacing min-delay-ms ({}) exceeds max-delay-ms ({})",
                self.pacing.min_delay_ms, self.pacing.max_delay_ms
            )));
        }
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(ScrapeError::Config(
                "viewport dimensions must be non-zero".to_string(),
            ));
        }
        if self.browser.wait_timeout_secs == 0 {
            return Err(ScrapeError::Config(
                "wait-timeout-secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// URL used for the first load of `seed`
    pub fn first_page_url(&self, seed: &str) -> String {
        if self.query.is_empty() {
            seed.to_string()
        } else if seed.contains('?') {
            format!("{}&{}", seed, self.query)
        } else {
            format!("{}?{}", seed, self.query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
seeds = [
    "https://www.nepremicnine.net/oglasi-prodaja/ljubljana-mesto/stanovanje/",
    "https://www.nepremicnine.net/oglasi-prodaja/gorenjska/hisa/",
]
query = "s=16"

[output]
path = "out/results.csv"
detail-columns = false

[browser]
headless = false
viewport-width = 1920
viewport-height = 1080
wait-timeout-secs = 10

[pacing]
min-delay-ms = 500
max-delay-ms = 900
"#,
        );

        let config = CrawlConfig::load(file.path()).unwrap();
        assert_eq!(config.seeds.len(), 2);
        assert_eq!(config.query, "s=16");
        assert_eq!(config.output.path, "out/results.csv");
        assert!(!config.output.detail_columns);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.viewport_width, 1920);
        assert_eq!(config.browser.wait_timeout(), Duration::from_secs(10));
        assert_eq!(config.pacing.min_delay_ms, 500);
        assert_eq!(config.pacing.max_delay_ms, 900);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = write_config(r#"seeds = ["https://www.nepremicnine.net/oglasi-prodaja/pomurska/hisa/"]"#);

        let config = CrawlConfig::load(file.path()).unwrap();
        assert_eq!(config.seeds.len(), 1);
        assert_eq!(config.query, "");
        assert_eq!(config.output.path, "scraped_results.csv");
        assert!(config.output.detail_columns);
        assert_eq!(config.browser.viewport_width, 1280);
        assert_eq!(config.browser.viewport_height, 720);
        assert_eq!(config.pacing.min_delay_ms, 1000);
        assert_eq!(config.pacing.max_delay_ms, 6000);
    }

    #[test]
    fn test_invalid_pacing_is_rejected() {
        let file = write_config(
            r#"
[pacing]
min-delay-ms = 5000
max-delay-ms = 100
"#,
        );

        let result = CrawlConfig::load(file.path());
        assert!(matches!(result, Err(ScrapeError::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("seeds = [ this is not toml");
        let result = CrawlConfig::load(file.path());
        assert!(matches!(result, Err(ScrapeError::Toml(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = CrawlConfig::load_or_default(Path::new("/nonexistent/scout.toml")).unwrap();
        assert!(config.seeds.is_empty());

        assert!(CrawlConfig::load(Path::new("/nonexistent/scout.toml")).is_err());
    }

    #[test]
    fn test_first_page_url() {
        let mut config = CrawlConfig::default();
        let seed = "https://www.nepremicnine.net/oglasi-prodaja/ljubljana-mesto/stanovanje/";
        assert_eq!(config.first_page_url(seed), seed);

        config.query = "s=16".to_string();
        assert_eq!(config.first_page_url(seed), format!("{seed}?s=16"));
        assert_eq!(
            config.first_page_url("https://example.com/list?a=1"),
            "https://example.com/list?a=1&s=16"
        );
    }
}
