use crate::config::CrawlerConfig;
use crate::correlator::{BountyId, Correlator};
use crate::error::CrawlError;
use crate::pagination::Paginator;
use crate::parsers::{DetailDocument, DetailFields, Layout};
use crate::results::{Bounty, RunSummary, SkippedRecord};
use crate::transport::Transport;
use crate::utils;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, watch};
use tokio::task::JoinHandle;
use url::Url;

/// Drives one crawl run: discovery, then detail page and contributions per
/// bounty, emitting finished records in discovery order.
#[derive(Clone)]
pub struct BountyCrawler {
    discovery_url: Url,
    site_url: Url,
    contributions_url: Url,
    pacing: Duration,
    max_concurrency: usize,
    transport: Arc<dyn Transport>,
    layout: Arc<Layout>,
    correlator: Arc<Correlator>,
    shutdown: watch::Receiver<bool>,
}

/// A running crawl: records arrive on `records`, `summary` resolves once
/// the run is over.
pub struct CrawlRun {
    pub records: mpsc::Receiver<Bounty>,
    pub summary: JoinHandle<RunSummary>,
}

impl CrawlRun {
    /// Receives every remaining record, then waits for the run summary
    pub async fn collect(mut self) -> (Vec<Bounty>, RunSummary) {
        let mut bounties = Vec::new();
        while let Some(bounty) = self.records.recv().await {
            bounties.push(bounty);
        }
        (bounties, self.finish().await)
    }

    pub async fn finish(self) -> RunSummary {
        drop(self.records);
        self.summary.await.unwrap_or_else(|e| {
            ::log::error!("Crawl task ended abnormally: {}", e);
            RunSummary {
                cancelled: true,
                ..RunSummary::default()
            }
        })
    }
}

impl BountyCrawler {
    pub fn new(config: &CrawlerConfig, transport: Arc<dyn Transport>) -> Result<Self, CrawlError> {
        config.validate()?;
        // No sender: the run is never cancelled unless `with_shutdown` is used
        let (_, shutdown) = watch::channel(false);

        Ok(Self {
            discovery_url: utils::parse_endpoint("discovery_url", &config.discovery_url)?,
            site_url: utils::parse_endpoint("site_url", &config.site_url)?,
            contributions_url: utils::parse_endpoint(
                "contributions_url",
                &config.contributions_url,
            )?,
            pacing: config.pacing(),
            max_concurrency: config.max_concurrency,
            transport,
            layout: Arc::new(Layout::new(&config.layout)?),
            correlator: Arc::new(Correlator::new()),
            shutdown,
        })
    }

    /// Stop dispatching new records once `true` is sent on this channel
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Arc::new(layout);
        self
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Fetches the first discovery page and starts the run in the background.
    ///
    /// Fails with [`CrawlError::FatalFetch`] when that first page cannot be
    /// fetched or decoded; every later problem is handled inside the run.
    pub async fn start(self) -> Result<CrawlRun, CrawlError> {
        ::log::info!("Starting bounty crawl from {}", self.discovery_url);

        let mut discovery =
            Paginator::new(Arc::clone(&self.transport), utils::first_page(&self.discovery_url));
        let first = discovery
            .next_page()
            .await
            .map_err(|e| CrawlError::FatalFetch(Box::new(e)))?
            .unwrap_or_default();

        let (result_tx, result_rx) = mpsc::channel::<Bounty>(self.max_concurrency * 4);
        let summary = tokio::spawn(self.run(discovery, first, result_tx));

        Ok(CrawlRun {
            records: result_rx,
            summary,
        })
    }

    async fn run(
        self,
        mut discovery: Paginator,
        first: Vec<Value>,
        result_tx: mpsc::Sender<Bounty>,
    ) -> RunSummary {
        let mut pipeline = Pipeline::new(self.max_concurrency, result_tx);
        let mut batch = Some(first);

        'discovery: while let Some(items) = batch.take() {
            for slug in self.register(&items, &mut pipeline) {
                if !pipeline.dispatch(&self, slug).await {
                    break 'discovery;
                }
            }

            if self.shutdown_requested() {
                pipeline.cancel();
                break;
            }

            batch = match discovery.next_page().await {
                Ok(next) => next,
                Err(e) => {
                    ::log::error!(
                        "Discovery stopped after {} pages: {}",
                        discovery.pages_read(),
                        e
                    );
                    None
                }
            };
        }

        let summary = pipeline.finish().await;
        ::log::info!(
            "Crawl complete - {} discovered, {} emitted, {} skipped{}",
            summary.discovered,
            summary.emitted,
            summary.skipped.len(),
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        summary
    }

    /// Records each discovery item with the correlator and returns the slugs
    /// ready for detail processing, in feed order.
    fn register(&self, items: &[Value], pipeline: &mut Pipeline) -> Vec<String> {
        let mut slugs = Vec::with_capacity(items.len());
        for item in items {
            let slug = item
                .get("slug")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|slug| !slug.is_empty());
            let Some(slug) = slug else {
                ::log::warn!("Skipping discovery item without slug: {}", item);
                continue;
            };
            pipeline.discovered += 1;
            match self.correlator.record(slug, item) {
                Ok(_) => slugs.push(slug.to_string()),
                Err(e) => pipeline.skip(slug, &CrawlError::for_record(slug, e)),
            }
        }
        slugs
    }

    /// Processes one discovered bounty end to end.
    ///
    /// Any failure comes back as [`CrawlError::Record`] carrying the slug.
    pub async fn process_record(&self, slug: &str) -> Result<Bounty, CrawlError> {
        self.enrich(slug)
            .await
            .map_err(|e| CrawlError::for_record(slug, e))
    }

    async fn enrich(&self, slug: &str) -> Result<Bounty, CrawlError> {
        let summary = self.correlator.lookup(slug)?;

        let url = utils::join_segments(&self.site_url, &["bounties", slug])?;
        let fetched = self.transport.get(&url).await?;
        if !fetched.is_success() {
            return Err(CrawlError::HttpStatus {
                url: url.to_string(),
                status: fetched.status,
            });
        }
        let fields = self.extract_detail(url.clone(), &fetched.body)?;

        let contributions = self.contributions(&summary.id).await?;

        ::log::debug!(
            "Bounty '{}' has {} updates, {} contributions, {} links",
            slug,
            fields.updates.len(),
            contributions.len(),
            fields.content_links.len()
        );

        Ok(Bounty {
            id: summary.id,
            slug: summary.slug,
            url: url.to_string(),
            title: fields.title,
            status: summary.status,
            deadline: summary.deadline,
            min_bounty: fields.min_bounty,
            cur_bounty: fields.cur_bounty,
            updates: fields.updates,
            contributions,
            content_links: fields.content_links,
            about: fields.about,
        })
    }

    fn extract_detail(&self, url: Url, body: &str) -> Result<DetailFields, CrawlError> {
        DetailDocument::parse(url, body).extract(&self.layout)
    }

    /// All contribution entries of one bounty, paced per request.
    /// An undecodable first page means the bounty has none.
    async fn contributions(&self, id: &BountyId) -> Result<Vec<Value>, CrawlError> {
        let id = id.to_string();
        let endpoint = utils::join_segments(&self.contributions_url, &[id.as_str(), "contributions"])?;
        Paginator::new(Arc::clone(&self.transport), utils::first_page(&endpoint))
            .with_pacing(self.pacing)
            .collect_lenient()
            .await
    }
}

/// A record task together with the slug it is working on
type Pending = (String, JoinHandle<Result<Bounty, CrawlError>>);

struct Emitted {
    count: usize,
    skipped: Vec<SkippedRecord>,
}

/// Bounded fan-out of record tasks with in-order emission.
///
/// At most `max_concurrency` records are in flight. Their handles queue up in
/// dispatch order and a single emitter awaits them front to back, so output
/// order matches discovery order.
struct Pipeline {
    permits: Arc<Semaphore>,
    pending_tx: mpsc::Sender<Pending>,
    result_tx: mpsc::Sender<Bounty>,
    emitter: JoinHandle<Emitted>,
    discovered: usize,
    skipped: Vec<SkippedRecord>,
    cancelled: bool,
}

impl Pipeline {
    fn new(max_concurrency: usize, result_tx: mpsc::Sender<Bounty>) -> Self {
        let (pending_tx, pending_rx) = mpsc::channel::<Pending>(max_concurrency);
        let emitter = tokio::spawn(emit_in_order(pending_rx, result_tx.clone()));

        Self {
            permits: Arc::new(Semaphore::new(max_concurrency)),
            pending_tx,
            result_tx,
            emitter,
            discovered: 0,
            skipped: Vec::new(),
            cancelled: false,
        }
    }

    fn should_stop(&self, crawler: &BountyCrawler) -> bool {
        crawler.shutdown_requested() || self.result_tx.is_closed()
    }

    fn cancel(&mut self) {
        if !self.cancelled {
            ::log::info!("Run cancelled, no further bounties will be fetched");
        }
        self.cancelled = true;
    }

    fn skip(&mut self, slug: &str, error: &CrawlError) {
        ::log::error!("Skipping bounty '{}': {}", slug, error);
        self.skipped.push(SkippedRecord {
            slug: slug.to_string(),
            error: error.to_string(),
        });
    }

    /// Starts processing `slug` once a slot is free. Returns `false` when
    /// the run has been cancelled and nothing was started.
    async fn dispatch(&mut self, crawler: &BountyCrawler, slug: String) -> bool {
        if self.should_stop(crawler) {
            self.cancel();
            return false;
        }

        let permit: OwnedSemaphorePermit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                self.cancel();
                return false;
            }
        };

        // Waiting for a slot may have outlasted a shutdown
        if self.should_stop(crawler) {
            self.cancel();
            return false;
        }

        ::log::debug!("Dispatching bounty '{}'", slug);
        let worker = crawler.clone();
        let task_slug = slug.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            worker.process_record(&task_slug).await
        });

        if self.pending_tx.send((slug, handle)).await.is_err() {
            ::log::error!("Emitter stopped early, abandoning the run");
            self.cancel();
            return false;
        }
        true
    }

    async fn finish(self) -> RunSummary {
        let Pipeline {
            pending_tx,
            result_tx,
            emitter,
            discovered,
            mut skipped,
            cancelled,
            ..
        } = self;

        drop(pending_tx);
        drop(result_tx);

        let emitted = match emitter.await {
            Ok(emitted) => emitted,
            Err(e) => {
                ::log::error!("Emitter task ended abnormally: {}", e);
                Emitted {
                    count: 0,
                    skipped: Vec::new(),
                }
            }
        };
        skipped.extend(emitted.skipped);

        RunSummary {
            discovered,
            emitted: emitted.count,
            skipped,
            cancelled,
        }
    }
}

async fn emit_in_order(
    mut pending_rx: mpsc::Receiver<Pending>,
    result_tx: mpsc::Sender<Bounty>,
) -> Emitted {
    let mut emitted = Emitted {
        count: 0,
        skipped: Vec::new(),
    };

    while let Some((slug, handle)) = pending_rx.recv().await {
        let error = match handle.await {
            Ok(Ok(bounty)) => {
                ::log::info!("Emitting bounty '{}'", slug);
                if result_tx.send(bounty).await.is_err() {
                    ::log::warn!("Record receiver dropped, discarding '{}'", slug);
                } else {
                    emitted.count += 1;
                }
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("record task aborted: {e}"),
        };

        ::log::error!("Skipping bounty '{}': {}", slug, error);
        emitted.skipped.push(SkippedRecord { slug, error });
    }

    emitted
}
