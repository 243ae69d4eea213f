// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling starting from a URL, one page at a time
// - Same-site restriction (same host and port as the start URL)
// - Hard cap on visited pages and a navigation timeout per page
// - Redirect-aware deduplication: a page is never rendered twice
//
// Submodules:
// - frontier: queued / visited bookkeeping
// - links: anchor extraction, resolution and same-site filtering
// - queue: the crawl loop itself
// - result: captured pages keyed by crawl key
// =============================================================================

mod frontier;
mod links;
mod queue;
mod result;

// Re-export the crawling API
pub use links::anchor_hrefs;
pub use queue::crawl_site;
pub use result::{CrawlResult, PageRecord};
