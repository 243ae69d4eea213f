// src/crawl/frontier.rs
// =============================================================================
// Per-crawl bookkeeping: which pages are queued and which were visited.
//
// Both sets hold normalized URLs (origin + crawl key). The Frontier is owned
// by exactly one crawl and moved through it; nothing else ever touches it.
//
// Invariants:
// - a URL is never queued while it is queued or visited
// - take() hands out each URL at most once, so no page renders twice
// =============================================================================

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    // Creates a frontier seeded with the start URL (already normalized)
    pub fn new(start: String) -> Self {
        let mut frontier = Self::default();
        frontier.push(start);
        frontier
    }

    // Queues a URL unless it was already visited or is already queued
    //
    // Returns: true if the URL was added
    pub fn push(&mut self, url: String) -> bool {
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    // Takes the next URL that has not been visited, marking it visited
    //
    // URLs visited after being queued (through a redirect) are skipped.
    pub fn take(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            self.queued.remove(&url);
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    // Records a URL as visited without it having been queued (redirect target)
    pub fn mark_visited(&mut self, url: String) {
        self.queued.remove(&url);
        self.visited.insert(url);
    }

    #[cfg(test)]
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
