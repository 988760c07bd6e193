use bounty_crawl::CrawlerConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bounty-crawl")]
#[command(about = "Crawls bounty campaigns and writes one JSON record per line")]
#[command(version)]
pub struct Args {
    /// Path to JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Discovery feed URL
    #[arg(long)]
    pub discovery_url: Option<String>,

    /// Site root that serves /bounties/<slug>
    #[arg(long)]
    pub site_url: Option<String>,

    /// Base URL of the /<id>/contributions feed
    #[arg(long)]
    pub contributions_url: Option<String>,

    /// Delay in milliseconds before each contributions page request
    #[arg(short, long)]
    pub pacing_ms: Option<u64>,

    /// Number of bounties processed concurrently
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Write records to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Args {
    /// Applies command-line overrides on top of a loaded configuration
    pub fn apply(&self, mut config: CrawlerConfig) -> CrawlerConfig {
        if let Some(url) = &self.discovery_url {
            config.discovery_url = url.clone();
        }
        if let Some(url) = &self.site_url {
            config.site_url = url.clone();
        }
        if let Some(url) = &self.contributions_url {
            config.contributions_url = url.clone();
        }
        if let Some(pacing_ms) = self.pacing_ms {
            config.pacing_ms = pacing_ms;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        config
    }
}
