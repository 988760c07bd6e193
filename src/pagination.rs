use crate::error::CrawlError;
use crate::transport::Transport;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One decoded page of a paginated resource
#[derive(Debug, Deserialize)]
pub struct Page {
    pub data: Vec<Value>,
    #[serde(default)]
    pub next_page_url: Option<String>,
}

impl Page {
    /// Decodes `{ data: [...], next_page_url: string|null }`
    pub fn decode(url: &Url, body: &str) -> Result<Self, CrawlError> {
        serde_json::from_str(body).map_err(|e| CrawlError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

enum State {
    Fetching(Url),
    Done,
}

/// Follows `next_page_url` cursors until the resource runs out.
///
/// Each call to [`Paginator::next_page`] fetches one page and yields its
/// items. The sequence is finite, never revisits a cursor and cannot be
/// restarted.
pub struct Paginator {
    transport: Arc<dyn Transport>,
    state: State,
    pacing: Option<Duration>,
    visited: HashSet<String>,
    pages_read: usize,
}

impl Paginator {
    pub fn new(transport: Arc<dyn Transport>, start: Url) -> Self {
        Self {
            transport,
            state: State::Fetching(start),
            pacing: None,
            visited: HashSet::new(),
            pages_read: 0,
        }
    }

    /// Sleep for `delay` before every page request, the first one included
    pub fn with_pacing(mut self, delay: Duration) -> Self {
        self.pacing = (!delay.is_zero()).then_some(delay);
        self
    }

    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(None)` once the resource reports no further cursor. A decode
    /// failure on the first page is returned as an error; on any later page
    /// it ends the sequence, keeping what was already yielded. Transport
    /// failures are always returned.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, CrawlError> {
        let url = match std::mem::replace(&mut self.state, State::Done) {
            State::Fetching(url) => url,
            State::Done => return Ok(None),
        };

        if let Some(delay) = self.pacing {
            tokio::time::sleep(delay).await;
        }

        self.visited.insert(url.to_string());
        let fetched = self.transport.get(&url).await?;

        let page = match Page::decode(&url, &fetched.body) {
            Ok(page) => page,
            Err(e) if self.pages_read == 0 => return Err(e),
            Err(e) => {
                ::log::warn!(
                    "Stopping pagination after {} pages: {}",
                    self.pages_read,
                    e
                );
                return Ok(None);
            }
        };
        self.pages_read += 1;

        ::log::debug!("Page {} of {} has {} items", self.pages_read, url, page.data.len());

        if let Some(next) = page.next_page_url.as_deref() {
            self.advance(&url, next);
        }

        Ok(Some(page.data))
    }

    fn advance(&mut self, current: &Url, next: &str) {
        match current.join(next) {
            Ok(next_url) if self.visited.contains(next_url.as_str()) => {
                ::log::warn!("Cursor {} was already visited, stopping", next_url);
            }
            Ok(next_url) => self.state = State::Fetching(next_url),
            Err(e) => {
                ::log::warn!("Unusable cursor '{}' on {}: {}", next, current, e);
            }
        }
    }

    /// Drains every page into one list.
    ///
    /// A first page that does not decode counts as "no data" and yields an
    /// empty list. Transport failures are returned.
    pub async fn collect_lenient(mut self) -> Result<Vec<Value>, CrawlError> {
        let mut items = Vec::new();
        loop {
            match self.next_page().await {
                Ok(Some(batch)) => items.extend(batch),
                Ok(None) => return Ok(items),
                Err(e) if e.is_decode() => {
                    ::log::debug!("Treating undecodable first page as empty: {}", e);
                    return Ok(items);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    const BASE: &str = "https://example.com/api/items";

    fn page(n: u32) -> String {
        format!("{BASE}?page={n}")
    }

    fn body(items: &[u32], next: Option<u32>) -> String {
        json!({
            "data": items.iter().map(|i| json!({ "n": i })).collect::<Vec<_>>(),
            "next_page_url": next.map(page),
        })
        .to_string()
    }

    fn paginator(transport: MockTransport) -> Paginator {
        Paginator::new(Arc::new(transport), Url::parse(&page(1)).unwrap())
    }

    #[tokio::test]
    async fn test_single_page_terminates() {
        let transport = MockTransport::new().with(&page(1), &body(&[1, 2], None));
        let mut pages = paginator(transport);

        assert_eq!(pages.next_page().await.unwrap().unwrap().len(), 2);
        assert!(pages.next_page().await.unwrap().is_none());
        assert!(pages.next_page().await.unwrap().is_none());
        assert_eq!(pages.pages_read(), 1);
    }

    #[tokio::test]
    async fn test_follows_cursor_until_null() {
        let transport = MockTransport::new()
            .with(&page(1), &body(&[1], Some(2)))
            .with(&page(2), &body(&[2], Some(3)))
            .with(&page(3), &body(&[3], None));

        let items = paginator(transport).collect_lenient().await.unwrap();
        let ns: Vec<_> = items.iter().map(|v| v["n"].as_u64().unwrap()).collect();
        assert_eq!(ns, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_malformed_later_page_truncates() {
        let transport = MockTransport::new()
            .with(&page(1), &body(&[1], Some(2)))
            .with(&page(2), &body(&[2], Some(3)))
            .with(&page(3), "<html>Server Error</html>")
            .with(&page(4), &body(&[4], None));

        let items = paginator(transport).collect_lenient().await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_first_page() {
        let transport = MockTransport::new().with(&page(1), "not json");
        let mut pages = paginator(transport);
        let err = pages.next_page().await.unwrap_err();
        assert!(err.is_decode());

        let transport = MockTransport::new().with(&page(1), "not json");
        assert!(paginator(transport).collect_lenient().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_data_key_is_decode_failure() {
        let transport = MockTransport::new().with(&page(1), r#"{"next_page_url": null}"#);
        let err = paginator(transport).next_page().await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = MockTransport::new().with(&page(1), &body(&[1], Some(2)));
        let result = paginator(transport).collect_lenient().await;
        assert!(matches!(result, Err(CrawlError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_revisited_cursor_stops() {
        let transport = Arc::new(
            MockTransport::new()
                .with(&page(1), &body(&[1], Some(2)))
                .with(&page(2), &body(&[2], Some(1))),
        );
        let pages = Paginator::new(transport.clone(), Url::parse(&page(1)).unwrap());

        let items = pages.collect_lenient().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(transport.requests(), vec![page(1), page(2)]);
    }

    #[tokio::test]
    async fn test_relative_cursor_resolved() {
        let transport = MockTransport::new()
            .with(&page(1), r#"{"data": [1], "next_page_url": "?page=2"}"#)
            .with(&page(2), r#"{"data": [2], "next_page_url": null}"#);

        let items = paginator(transport).collect_lenient().await.unwrap();
        assert_eq!(items, vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_pacing_applies_before_every_page() {
        let transport = MockTransport::new()
            .with(&page(1), &body(&[1], Some(2)))
            .with(&page(2), &body(&[2], None));
        let pages = paginator(transport).with_pacing(Duration::from_millis(20));

        let start = std::time::Instant::now();
        pages.collect_lenient().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
