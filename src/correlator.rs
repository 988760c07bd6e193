use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Identifier of a bounty as the discovery feed reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BountyId {
    Number(u64),
    Text(String),
}

impl fmt::Display for BountyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BountyId::Number(n) => write!(f, "{n}"),
            BountyId::Text(s) => f.write_str(s),
        }
    }
}

/// Lightweight record seen during discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub id: BountyId,
    pub slug: String,
    pub deadline: Option<String>,
    pub status: Option<String>,
}

impl Summary {
    /// Reads a discovery blob. `slug` and `id` are required; `deadline` and
    /// `status` resolve to `None` when absent or of an unexpected shape.
    pub fn from_blob(blob: &Value) -> Result<Self, CrawlError> {
        let slug = blob
            .get("slug")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CrawlError::MalformedSummary("missing slug".to_string()))?;

        let id = match blob.get("id") {
            Some(Value::Number(n)) => n.as_u64().map(BountyId::Number),
            Some(Value::String(s)) if !s.is_empty() => Some(BountyId::Text(s.clone())),
            _ => None,
        }
        .ok_or_else(|| CrawlError::MalformedSummary(format!("missing id for '{slug}'")))?;

        Ok(Self {
            id,
            slug: slug.to_string(),
            deadline: scalar(blob, "deadline"),
            status: scalar(blob, "status"),
        })
    }
}

fn scalar(blob: &Value, key: &str) -> Option<String> {
    match blob.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Run-scoped mapping from slug to the summary seen during discovery
#[derive(Debug, Default)]
pub struct Correlator {
    summaries: RwLock<HashMap<String, Summary>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes and stores a discovery blob under `slug`; a repeated slug
    /// replaces the earlier summary.
    pub fn record(&self, slug: &str, blob: &Value) -> Result<Summary, CrawlError> {
        let summary = Summary::from_blob(blob)?;
        let mut summaries = self
            .summaries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if summaries.insert(slug.to_string(), summary.clone()).is_some() {
            ::log::debug!("Summary for '{}' replaced", slug);
        }
        Ok(summary)
    }

    pub fn lookup(&self, slug: &str) -> Result<Summary, CrawlError> {
        self.summaries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(slug)
            .cloned()
            .ok_or_else(|| CrawlError::UnknownSlug(slug.to_string()))
    }
}
