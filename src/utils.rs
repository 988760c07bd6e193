use crate::error::CrawlError;
use url::Url;

/// Parses a configured endpoint, reporting which setting was wrong
pub fn parse_endpoint(name: &str, value: &str) -> Result<Url, CrawlError> {
    Url::parse(value).map_err(|e| CrawlError::Config(format!("{name} '{value}': {e}")))
}

/// Appends path segments to a base URL without dropping its own path
pub fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, CrawlError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CrawlError::Config(format!("'{base}' cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// First page of a paginated resource: `<endpoint>?page=1`
pub fn first_page(endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut().append_pair("page", "1");
    url
}

/// Resolves a content link found on `base` into an absolute URL.
///
/// Relative and path-absolute references are joined onto the page URL and
/// absolute ones come back as they are. Empty and fragment-only hrefs point
/// back at the page itself and yield `None`, as does anything unparseable.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    match base.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            ::log::debug!("Could not resolve {} against {}: {}", href, base, e);
            None
        }
    }
}
