// src/crawl/result.rs
// =============================================================================
// What one site crawl produces: captured pages keyed by crawl key.
//
// Pages keep the order they were captured in. Storing a page under a key
// that already exists replaces the record in place (same position, newer
// image), which is what happens when a redirect lands on a page captured
// earlier.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

// One captured page
//
// The image is behind an Arc so match rows and diff tasks can share it
// without copying the bytes.
#[derive(Debug, Clone)]
pub struct PageRecord {
    /// Crawl key, e.g. "/about" or "/search?q=x"
    pub key: String,
    /// URL the image was captured from (the final URL after redirects)
    pub url: String,
    /// Encoded raster image of the full page
    pub image: Arc<[u8]>,
}

#[derive(Debug, Default)]
pub struct CrawlResult {
    pages: Vec<PageRecord>,
    index: HashMap<String, usize>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    // Stores a page, replacing any earlier page with the same key
    pub fn insert(&mut self, record: PageRecord) {
        match self.index.get(&record.key) {
            Some(&position) => self.pages[position] = record,
            None => {
                self.index.insert(record.key.clone(), self.pages.len());
                self.pages.push(record);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&PageRecord> {
        self.index.get(key).map(|&position| &self.pages[position])
    }

    /// Pages in capture order
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
