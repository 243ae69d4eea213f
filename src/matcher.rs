// src/matcher.rs
// =============================================================================
// Pairs the pages of two crawls.
//
// Two strategies build rows the same way and differ only in the key:
// - Exact: the crawl key itself ("/docs/about.html")
// - Normalized: the match key ("about"), so pages still pair up when the
//   second site moved them to another directory or renamed the extension
//
// When several pages on one site produce the same key, the first one captured
// wins and the rest are left out of the rows. They still appear in that
// site's own page list.
//
// Rows come out sorted: "/" first, then by key alphabetically, ignoring case.
// =============================================================================

use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::crawl::{CrawlResult, PageRecord};
use crate::normalize::{compare_keys, match_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Pair pages with identical path and query
    Exact,
    /// Pair pages by last path segment with .html/.htm/-cc.htm removed
    #[default]
    Normalized,
}

impl MatchStrategy {
    // Computes the key a page is paired under
    pub fn key_for(self, page: &PageRecord) -> String {
        match self {
            MatchStrategy::Exact => page.key.clone(),
            MatchStrategy::Normalized => match_key(&page.key),
        }
    }
}

// One comparison unit: a key plus the page from each site, if any
//
// At least one of page1 / page2 is always present.
#[derive(Debug, Clone)]
pub struct MatchRow {
    pub key: String,
    pub page1: Option<PageRecord>,
    pub page2: Option<PageRecord>,
}

impl MatchRow {
    // Both sides have a page
    pub fn is_pair(&self) -> bool {
        self.page1.is_some() && self.page2.is_some()
    }
}

// Builds the match rows for two crawls
//
// Parameters:
//   site1, site2: finished crawl results
//   strategy: which key pages are paired by
//
// Returns: one row per key found on either site, sorted for presentation
pub fn match_pages(site1: &CrawlResult, site2: &CrawlResult, strategy: MatchStrategy) -> Vec<MatchRow> {
    let mut rows: BTreeMap<String, MatchRow> = BTreeMap::new();

    for page in site1.pages() {
        let key = strategy.key_for(page);
        let row = rows.entry(key.clone()).or_insert_with(|| empty_row(key));
        if row.page1.is_none() {
            row.page1 = Some(page.clone());
        }
    }

    for page in site2.pages() {
        let key = strategy.key_for(page);
        let row = rows.entry(key.clone()).or_insert_with(|| empty_row(key));
        if row.page2.is_none() {
            row.page2 = Some(page.clone());
        }
    }

    let mut rows: Vec<MatchRow> = rows.into_values().collect();
    rows.sort_by(|a, b| compare_keys(&a.key, &b.key));
    rows
}

fn empty_row(key: String) -> MatchRow {
    MatchRow {
        key,
        page1: None,
        page2: None,
    }
}
