use crate::correlator::BountyId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One update posted on a bounty page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// `YYYY-MM-DD HH:MM:SS`, as written in the page
    pub date: String,
    pub text: String,
}

/// The long-text sections describing a bounty; each one may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct About {
    pub goal: Option<String>,
    pub why: Option<String>,
    pub requirements: Option<String>,
}

/// A fully processed bounty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounty {
    pub id: BountyId,
    pub slug: String,
    /// Absolute URL of the detail page
    pub url: String,
    pub title: String,
    pub status: Option<String>,
    pub deadline: Option<String>,
    pub min_bounty: Option<u64>,
    pub cur_bounty: Option<u64>,
    pub updates: Vec<Update>,
    /// Entries of the contributions feed, kept as returned
    pub contributions: Vec<Value>,
    /// Absolute links found in the page content, without duplicates
    pub content_links: Vec<String>,
    pub about: About,
}

/// A record dropped from the output, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub slug: String,
    pub error: String,
}

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub emitted: usize,
    pub skipped: Vec<SkippedRecord>,
    /// Set when a shutdown signal or a closed receiver stopped the run early
    pub cancelled: bool,
}
