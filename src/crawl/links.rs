// src/crawl/links.rs
// =============================================================================
// This module turns anchors on a rendered page into URLs worth crawling.
//
// We use the `scraper` crate to read <a href> (and <base href>) out of the
// rendered HTML, and the `url` crate to:
// - Resolve relative hrefs against the page
// - Compare host and port with the start URL
// - Build the normalized URL that identifies a page
//
// Filtering order:
// 1. Skip javascript:, mailto: and tel: hrefs
// 2. Resolve against the document base; unparseable hrefs are dropped
// 3. Keep only links on the same host and port as the start URL
// 4. Normalize (origin + path without trailing slash + query)
//
// Rust concepts:
// - Iterators: filter_map chains instead of manual loops
// - Option<T>: "no usable link" is None, not an error
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

use crate::normalize::normalized_url;

// Href prefixes that never point at a page
const SKIPPED_SCHEMES: [&str; 3] = ["javascript:", "mailto:", "tel:"];

// Extracts raw href values from rendered HTML
//
// Returns: (hrefs of every <a href>, href of the first <base href> if any)
//
// Example:
//   html = "<base href='/docs/'><a href='intro'>Intro</a>"
//   result = (["intro"], Some("/docs/"))
pub fn anchor_hrefs(html: &str) -> (Vec<String>, Option<String>) {
    let document = Html::parse_document(html);

    // Both selectors are constants and known to be valid
    let anchors = Selector::parse("a[href]").unwrap();
    let base = Selector::parse("base[href]").unwrap();

    let hrefs = document
        .select(&anchors)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.to_string())
        .collect();

    let base_href = document
        .select(&base)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.to_string());

    (hrefs, base_href)
}

// Resolves the base URL for a page's relative links
//
// A <base href> wins when it parses; otherwise the page's own URL is used.
pub fn document_base(page_url: &Url, base_href: Option<&str>) -> Url {
    base_href
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone())
}

// Returns true when both URLs live on the same site
//
// Scheme is ignored on purpose: http://a.com and https://a.com are the same
// site, but a.com:8080 and a.com are not. Default ports compare as None.
pub fn is_same_site(start: &Url, candidate: &Url) -> bool {
    start.host_str() == candidate.host_str() && start.port() == candidate.port()
}

// Filters a page's hrefs down to normalized same-site URLs
//
// Parameters:
//   hrefs: raw href values from the page
//   base: URL relative hrefs resolve against
//   start: the crawl's start URL (defines "same site")
//
// Returns: normalized absolute URLs, in page order, possibly with repeats
pub fn same_site_links(hrefs: &[String], base: &Url, start: &Url) -> Vec<String> {
    hrefs
        .iter()
        .filter_map(|href| resolve_href(base, href))
        .filter(|url| is_same_site(start, url))
        .map(|url| normalized_url(&url))
        .collect()
}

// Resolves one href, or None when it is skipped or unparseable
fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    base.join(href).ok()
}
