use crate::config::LayoutConfig;
use crate::error::CrawlError;
use regex::Regex;

/// Pulls values the page only exposes inside inline scripts.
///
/// This is the part of extraction most exposed to markup changes, so it sits
/// behind one trait and the rest of the extractor never looks at script text.
pub trait ScriptValues: Send + Sync {
    /// Amount literal in the script text of an amount block
    fn amount(&self, script: &str) -> Option<u64>;

    /// Timestamp literal in the script text of an update date block
    fn timestamp(&self, script: &str) -> Option<String>;
}

/// Fixed literal patterns, each with one capture group around the value
#[derive(Debug, Clone)]
pub struct LiteralPatterns {
    amount: Regex,
    timestamp: Regex,
}

impl LiteralPatterns {
    pub fn new(amount: &str, timestamp: &str) -> Result<Self, CrawlError> {
        Ok(Self {
            amount: compile("amount_pattern", amount)?,
            timestamp: compile("update_timestamp_pattern", timestamp)?,
        })
    }

    pub fn from_layout(layout: &LayoutConfig) -> Result<Self, CrawlError> {
        Self::new(&layout.amount_pattern, &layout.update_timestamp_pattern)
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex, CrawlError> {
    let regex = Regex::new(pattern)
        .map_err(|e| CrawlError::Config(format!("{name} is not a valid pattern: {e}")))?;
    if regex.captures_len() < 2 {
        return Err(CrawlError::Config(format!(
            "{name} needs a capture group around the value"
        )));
    }
    Ok(regex)
}

impl ScriptValues for LiteralPatterns {
    fn amount(&self, script: &str) -> Option<u64> {
        let digits = self.amount.captures(script)?.get(1)?.as_str();
        digits.parse().ok()
    }

    fn timestamp(&self, script: &str) -> Option<String> {
        let captured = self.timestamp.captures(script)?.get(1)?;
        Some(captured.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> LiteralPatterns {
        LiteralPatterns::from_layout(&LayoutConfig::default()).unwrap()
    }

    #[test]
    fn test_amount_literal() {
        let p = patterns();
        assert_eq!(p.amount("new Vue({ data: { amount: 500 } })"), Some(500));
        assert_eq!(p.amount("var amount:12000;"), Some(12000));
        assert_eq!(p.amount("var total = 3;"), None);
        assert_eq!(p.amount(""), None);
    }

    #[test]
    fn test_amount_overflow_is_absent() {
        assert_eq!(patterns().amount("amount: 99999999999999999999999"), None);
    }

    #[test]
    fn test_timestamp_literal() {
        let p = patterns();
        let script = "document.write(moment.utc('2017-03-04 18:22:10').local().fromNow());";
        assert_eq!(p.timestamp(script).as_deref(), Some("2017-03-04 18:22:10"));
        assert_eq!(p.timestamp("moment.utc('yesterday')"), None);
    }

    #[test]
    fn test_pattern_without_group_rejected() {
        let err = LiteralPatterns::new(r"amount:\d+", r"(x)").unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
        assert!(LiteralPatterns::new(r"(", r"(x)").is_err());
    }
}
