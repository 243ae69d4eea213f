// src/normalize.rs
// =============================================================================
// Path keys: turning URLs into strings we can compare.
//
// There are two levels and they must never be mixed up:
//
// 1. Crawl key (per site): the URL path with one trailing slash removed,
//    plus the query string. "/" stays "/". Used to avoid visiting the same
//    page twice inside one crawl.
//
// 2. Match key (across sites): only the last non-empty path segment, with
//    one of "-cc.htm", ".html", ".htm" stripped (first match wins). Used to
//    pair pages between two sites whose directory layouts differ.
//
// Every function here is pure and total: any input gives an answer.
//
// Rust concepts:
// - &str vs String: borrow the input, return an owned key
// - Iterators: split / filter / last to find the final segment
// - Option combinators: strip_suffix returns Option<&str>
// =============================================================================

use url::Url;

// Suffixes removed from the final path segment, checked in this order.
// "-cc.htm" must come before ".htm" so "report-cc.htm" becomes "report".
const MATCH_SUFFIXES: [&str; 3] = ["-cc.htm", ".html", ".htm"];

// Computes the crawl key of a URL (path without trailing slash + query)
//
// Examples:
//   https://a.com/          -> "/"
//   https://a.com/docs/     -> "/docs"
//   https://a.com/p?x=1     -> "/p?x=1"
//   https://a.com/p/?x=1#f  -> "/p?x=1"   (fragments are never part of a key)
pub fn crawl_key(url: &Url) -> String {
    let path = url.path();
    let path = path.strip_suffix('/').unwrap_or(path);
    let path = if path.is_empty() { "/" } else { path };

    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}

// Computes the full normalized URL: origin + crawl key
//
// This is the identity the crawler stores in its visited set and frontier,
// so http://a.com/x and https://a.com/x stay distinct pages.
//
// Example:
//   https://a.com:8080/docs/?v=2#top -> "https://a.com:8080/docs?v=2"
pub fn normalized_url(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), crawl_key(url))
}

// Computes the cross-site match key from a crawl key
//
// The query part of the crawl key is ignored; only the path counts.
//
// Examples:
//   "/"                  -> "/"
//   "/a/b/page.html"     -> "page"
//   "/x/report-cc.htm"   -> "report"
//   "/contact?lang=en"   -> "contact"
//   "/.html"             -> "/"
pub fn match_key(crawl_key: &str) -> String {
    let path = crawl_key.split('?').next().unwrap_or_default();

    let segment = match path.split('/').filter(|s| !s.is_empty()).next_back() {
        Some(segment) => segment,
        None => return "/".to_string(),
    };

    let stem = MATCH_SUFFIXES
        .iter()
        .find_map(|suffix| segment.strip_suffix(suffix))
        .unwrap_or(segment);

    if stem.is_empty() {
        "/".to_string()
    } else {
        stem.to_string()
    }
}

// Orders two keys for presentation: "/" first, then alphabetically
// ignoring case ("about" < "Zeta"), with byte order breaking ties so
// "About" and "about" still sort the same way every run
//
// Used for sorting both per-site page lists and match rows.
pub fn compare_keys(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (a == "/", b == "/") {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}
