use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use async_trait::async_trait;
use url::Url;

/// A fetched response: status code and full body text
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u16,
    pub body: String,
}

impl Fetched {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP collaborator the crawler talks through
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a GET request. Timeouts and connection failures are errors;
    /// non-success statuses are not.
    async fn get(&self, url: &Url) -> Result<Fetched, CrawlError>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CrawlError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Fetched, CrawlError> {
        ::log::trace!("GET {}", url);

        let failed = |e: reqwest::Error| CrawlError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url.clone()).send().await.map_err(failed)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(failed)?;

        if !(200..300).contains(&status) {
            ::log::debug!("{} answered with HTTP {}", url, status);
        }

        Ok(Fetched { status, body })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::{mpsc, watch};

    /// A request that waits for `release` to turn `true`, announcing itself
    /// on `entered` first
    struct Hold {
        entered: mpsc::UnboundedSender<String>,
        release: watch::Receiver<bool>,
    }

    /// In-memory transport keyed by full URL; unknown URLs fail like a refused connection
    #[derive(Default)]
    pub struct MockTransport {
        responses: HashMap<String, Fetched>,
        holds: HashMap<String, Hold>,
        requests: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                Fetched {
                    status: 200,
                    body: body.to_string(),
                },
            );
            self
        }

        pub fn with_status(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                Fetched {
                    status,
                    body: body.to_string(),
                },
            );
            self
        }

        /// Requests for `url` stall until `release` carries `true`
        pub fn with_hold(
            mut self,
            url: &str,
            entered: mpsc::UnboundedSender<String>,
            release: watch::Receiver<bool>,
        ) -> Self {
            self.holds.insert(url.to_string(), Hold { entered, release });
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(&self, url: &Url) -> Result<Fetched, CrawlError> {
            self.requests.lock().unwrap().push(url.to_string());
            if let Some(hold) = self.holds.get(url.as_str()) {
                let _ = hold.entered.send(url.to_string());
                let mut release = hold.release.clone();
                let _ = release.wait_for(|open| *open).await;
            }
            self.responses
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| CrawlError::Transport {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                })
        }
    }
}
