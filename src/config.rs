use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Configuration for a bounty crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Paginated JSON feed listing every bounty summary
    #[serde(default = "default_discovery_url")]
    pub discovery_url: String,

    /// Site root; detail pages live under `<site_url>/bounties/<slug>`
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Contributions live under `<contributions_url>/<id>/contributions`
    #[serde(default = "default_contributions_url")]
    pub contributions_url: String,

    /// Minimum delay between contribution page requests of one record
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Maximum number of records processed at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-request timeout handed to the HTTP client
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Selectors and patterns used on detail pages
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Where each field lives on a detail page.
///
/// Every selector and pattern is plain text so a markup change on the site
/// is a configuration update. `parsers::Layout` compiles it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_title_selector")]
    pub title: String,

    /// Paragraphs holding the goal/why/requirements sections
    #[serde(default = "default_about_selector")]
    pub about_sections: String,

    #[serde(default)]
    pub about_positions: AboutPositions,

    /// Blocks carrying the amounts; the first is the minimum, the second the current amount
    #[serde(default = "default_amount_blocks_selector")]
    pub amount_blocks: String,

    /// Literal pattern with one capture group around the amount digits
    #[serde(default = "default_amount_pattern")]
    pub amount_pattern: String,

    /// Children of the updates container, alternating date block and text block
    #[serde(default = "default_update_blocks_selector")]
    pub update_blocks: String,

    /// Literal pattern with one capture group around the update timestamp
    #[serde(default = "default_update_timestamp_pattern")]
    pub update_timestamp_pattern: String,

    #[serde(default = "default_update_text_selector")]
    pub update_text: String,

    #[serde(default = "default_content_container_selector")]
    pub content_container: String,
}

/// Ordinal position of each about section among the matched paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutPositions {
    pub goal: usize,
    pub why: usize,
    pub requirements: usize,
}

impl Default for AboutPositions {
    fn default() -> Self {
        // The third paragraph is a heading on the live site
        Self {
            goal: 0,
            why: 1,
            requirements: 3,
        }
    }
}

fn default_discovery_url() -> String {
    "https://www.wesearchr.com/api/discover/newest".to_string()
}

fn default_site_url() -> String {
    "https://www.wesearchr.com".to_string()
}

fn default_contributions_url() -> String {
    "https://www.wesearchr.com/api/bounties".to_string()
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_max_concurrency() -> usize {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("bounty-crawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_title_selector() -> String {
    "div.row > h1".to_string()
}

fn default_about_selector() -> String {
    "div.single-project-content > p".to_string()
}

fn default_amount_blocks_selector() -> String {
    "div.bounty-data.data-group:not(.deadline)".to_string()
}

fn default_amount_pattern() -> String {
    r"amount\s*:\s*(\d+)".to_string()
}

fn default_update_blocks_selector() -> String {
    "div.row.column.content > div".to_string()
}

fn default_update_timestamp_pattern() -> String {
    r"moment\.utc\('(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})".to_string()
}

fn default_update_text_selector() -> String {
    "p".to_string()
}

fn default_content_container_selector() -> String {
    "div.single-project-content".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            title: default_title_selector(),
            about_sections: default_about_selector(),
            about_positions: AboutPositions::default(),
            amount_blocks: default_amount_blocks_selector(),
            amount_pattern: default_amount_pattern(),
            update_blocks: default_update_blocks_selector(),
            update_timestamp_pattern: default_update_timestamp_pattern(),
            update_text: default_update_text_selector(),
            content_container: default_content_container_selector(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            discovery_url: default_discovery_url(),
            site_url: default_site_url(),
            contributions_url: default_contributions_url(),
            pacing_ms: default_pacing_ms(),
            max_concurrency: default_max_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            layout: LayoutConfig::default(),
        }
    }
}

impl CrawlerConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrawlError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, CrawlError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every endpoint is an absolute URL and concurrency is usable
    pub fn validate(&self) -> Result<(), CrawlError> {
        for (name, value) in [
            ("discovery_url", &self.discovery_url),
            ("site_url", &self.site_url),
            ("contributions_url", &self.contributions_url),
        ] {
            Url::parse(value)
                .map_err(|e| CrawlError::Config(format!("{name} '{value}' is not a URL: {e}")))?;
        }
        if self.max_concurrency == 0 {
            return Err(CrawlError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
