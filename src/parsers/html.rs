use crate::error::CrawlError;
use crate::parsers::text;
use scraper::{ElementRef, Selector};

/// Compiles a configured CSS selector
pub fn selector(name: &str, css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::Config(format!("{name} selector '{css}' is invalid: {e:?}")))
}

/// Plain text of an element, or `None` if it has no visible text
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    text::plain_text(element.text())
}

/// Concatenated contents of every `<script>` inside an element
pub fn script_text(element: ElementRef<'_>, scripts: &Selector) -> String {
    element
        .select(scripts)
        .flat_map(|script| script.text())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Raw `href` values of the matching anchors inside an element
pub fn hrefs<'a>(element: ElementRef<'a>, anchors: &'a Selector) -> impl Iterator<Item = &'a str> {
    element
        .select(anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
}
