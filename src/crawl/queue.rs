// src/crawl/queue.rs
// =============================================================================
// This module crawls one website breadth-first and captures every page.
//
// How it works:
// 1. Seed the frontier with the normalized start URL
// 2. While the frontier has URLs and fewer than max_pages were visited:
//    a. Take the next unvisited URL and mark it visited
//    b. Render it (navigation bounded by a timeout)
//    c. After a redirect, mark the final URL visited too and store the
//       image under the final URL's crawl key
//    d. If still under the cap, queue same-site links not seen before
// 3. A page that fails to render is logged and skipped; the crawl goes on
//
// Pages are visited one at a time so the target site sees at most one
// request from us per crawl, and the frontier never needs locking.
//
// Rust concepts:
// - Generics: SiteCrawl works with any PageRenderer (Chrome or a test mock)
// - Ownership: run(self) consumes the crawl, so a finished crawl can't be reused
// =============================================================================

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use super::frontier::Frontier;
use super::links::{document_base, same_site_links};
use super::result::{CrawlResult, PageRecord};
use crate::browser::PageRenderer;
use crate::config::CrawlConfig;
use crate::normalize::{crawl_key, normalized_url};

// A crawl in progress for one site
//
// Holds the frontier and the pages captured so far. Both are owned here and
// handed over only when run() finishes.
pub struct SiteCrawl<'a, R: PageRenderer + ?Sized> {
    renderer: &'a R,
    start: Url,
    config: &'a CrawlConfig,
    frontier: Frontier,
    result: CrawlResult,
}

impl<'a, R: PageRenderer + ?Sized> SiteCrawl<'a, R> {
    pub fn new(renderer: &'a R, start: &Url, config: &'a CrawlConfig) -> Self {
        Self {
            renderer,
            start: start.clone(),
            config,
            frontier: Frontier::new(normalized_url(start)),
            result: CrawlResult::new(),
        }
    }

    // Runs the crawl to completion and returns the captured pages
    pub async fn run(mut self) -> CrawlResult {
        let started = Instant::now();
        info!(site = %self.start, max_pages = self.config.max_pages, "crawl started");

        while !self.frontier.is_empty() && self.frontier.visited_count() < self.config.max_pages {
            if let Some(deadline) = self.config.deadline {
                if started.elapsed() >= deadline {
                    warn!(site = %self.start, "crawl deadline reached, stopping early");
                    break;
                }
            }

            let Some(url) = self.frontier.take() else {
                break;
            };
            self.visit(&url).await;
        }

        info!(
            site = %self.start,
            pages = self.result.len(),
            visited = self.frontier.visited_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "crawl finished"
        );

        self.result
    }

    // Renders one URL taken from the frontier and records the outcome
    async fn visit(&mut self, url: &str) {
        debug!(url = %url, "rendering");

        let page = match self.renderer.render(url, self.config.nav_timeout).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "failed to capture page, skipping");
                return;
            }
        };

        // Relative links resolve against where the browser actually ended up
        let final_url = match Url::parse(&page.final_url) {
            Ok(final_url) => final_url,
            Err(_) => match Url::parse(url) {
                Ok(requested) => requested,
                Err(e) => {
                    warn!(url = %url, error = %e, "unparseable page URL, skipping");
                    return;
                }
            },
        };

        let final_normalized = normalized_url(&final_url);
        if final_normalized != url {
            debug!(from = %url, to = %final_normalized, "redirected");
            self.frontier.mark_visited(final_normalized);
        }

        self.result.insert(PageRecord {
            key: crawl_key(&final_url),
            url: final_url.to_string(),
            image: Arc::from(page.image),
        });

        if self.frontier.visited_count() < self.config.max_pages {
            let base = document_base(&final_url, page.base_href.as_deref());
            for link in same_site_links(&page.hrefs, &base, &self.start) {
                self.frontier.push(link);
            }
        }
    }
}

// Crawls a website starting from a URL
//
// Parameters:
//   renderer: the browser (or mock) that renders pages
//   start_url: where the crawl begins; also defines "same site"
//   config: page cap, navigation timeout, optional deadline
//
// Returns: every page captured, keyed by crawl key. Never fails: pages that
// could not be rendered are simply missing.
pub async fn crawl_site<R: PageRenderer + ?Sized>(
    renderer: &R,
    start_url: &Url,
    config: &CrawlConfig,
) -> CrawlResult {
    SiteCrawl::new(renderer, start_url, config).run().await
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is `let ... else`?
//    - let Some(url) = frontier.take() else { break };
//    - Binds `url` if the pattern matches, otherwise runs the else block
//    - The else block must leave the scope (break, continue, return)
//
// 2. What does `R: PageRenderer + ?Sized` mean?
//    - R is any type implementing the PageRenderer trait
//    - ?Sized also allows trait objects like `dyn PageRenderer`
//
// 3. Why does run() take `mut self`?
//    - The crawl is consumed when it runs
//    - Its frontier and result move out; nobody can keep using them
//
// 4. What is Arc::from(page.image)?
//    - Turns the Vec<u8> into a shared, read-only Arc<[u8]>
//    - Cloning an Arc copies a pointer, not the image bytes
// -----------------------------------------------------------------------------
