// Re-export modules
pub mod config;
pub mod correlator;
pub mod crawlers;
pub mod error;
pub mod pagination;
pub mod parsers;
pub mod results;
pub mod transport;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::CrawlerConfig;
pub use crawlers::bounty::{BountyCrawler, CrawlRun};
pub use error::CrawlError;
pub use results::{About, Bounty, RunSummary, SkippedRecord, Update};

use parsers::Layout;
use std::sync::Arc;
use tokio::sync::watch;
use transport::{HttpTransport, Transport};

/// Main builder for a bounty crawl
pub struct Crawl {
    config: CrawlerConfig,
    transport: Option<Arc<dyn Transport>>,
    layout: Option<Layout>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Default for Crawl {
    fn default() -> Self {
        Self::new(CrawlerConfig::default())
    }
}

impl Crawl {
    /// Create a new Crawl builder with the given configuration
    pub fn new(config: CrawlerConfig) -> Self {
        Self {
            config,
            transport: None,
            layout: None,
            shutdown: None,
        }
    }

    /// Load configuration from a file
    pub fn with_config_file(mut self, path: impl AsRef<std::path::Path>) -> Result<Self, CrawlError> {
        self.config = CrawlerConfig::from_file(path)?;
        Ok(self)
    }

    /// Load configuration from a string
    pub fn with_config_str(mut self, config_str: &str) -> Result<Self, CrawlError> {
        self.config = CrawlerConfig::from_json(config_str)?;
        Ok(self)
    }

    /// Set the maximum number of records processed at the same time
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Set the delay before each contributions page request
    pub fn with_pacing_ms(mut self, pacing_ms: u64) -> Self {
        self.config.pacing_ms = pacing_ms;
        self
    }

    /// Use a custom transport instead of the HTTP client
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a prebuilt layout, e.g. one with its own script value strategy,
    /// instead of compiling `config.layout`
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Stop starting new records once `true` is sent on this channel
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Start the crawler and get a receiver for bounties
    pub async fn generate(self) -> Result<CrawlRun, CrawlError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        let mut crawler = BountyCrawler::new(&self.config, transport)?;
        if let Some(layout) = self.layout {
            crawler = crawler.with_layout(layout);
        }
        if let Some(shutdown) = self.shutdown {
            crawler = crawler.with_shutdown(shutdown);
        }

        crawler.start().await
    }
}
