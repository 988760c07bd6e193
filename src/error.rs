use thiserror::Error;

/// Errors raised while crawling, from a single field up to the whole run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The page body does not have the expected structure.
    #[error("could not decode {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Detail processing was reached for a slug never seen during discovery.
    #[error("no summary recorded for slug '{0}'")]
    UnknownSlug(String),

    #[error("malformed summary: {0}")]
    MalformedSummary(String),

    /// Unrecovered failure while processing one record.
    #[error("record '{slug}' failed: {source}")]
    Record {
        slug: String,
        #[source]
        source: Box<CrawlError>,
    },

    /// The discovery resource could not be fetched or decoded at all.
    #[error("discovery failed: {0}")]
    FatalFetch(#[source] Box<CrawlError>),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CrawlError {
    /// Wraps an error as the failure of the record identified by `slug`.
    pub fn for_record(slug: &str, error: CrawlError) -> Self {
        match error {
            already @ CrawlError::Record { .. } => already,
            other => CrawlError::Record {
                slug: slug.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, CrawlError::Decode { .. })
    }
}
