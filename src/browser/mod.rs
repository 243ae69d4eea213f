// src/browser/mod.rs
// =============================================================================
// This module is the boundary with the browser that renders pages.
//
// The crawler only needs three things from a browser, and asks for them in a
// single call:
// - navigate to a URL (bounded by a timeout) and report the final URL
// - capture an image of the whole rendered page
// - list the raw href values of the page's anchors
//
// Submodules:
// - chrome: the real implementation, a headless Chrome via chromiumoxide
//
// Tests use their own in-memory renderer implementing the same trait.
//
// Rust concepts:
// - Traits: the crawler is generic over anything that can render a page
// - async-trait: lets trait methods be async and still be Send
// - thiserror: derive Display/Error for our error enum
// =============================================================================

mod chrome;
#[cfg(test)]
pub mod mock;

pub use chrome::ChromeRenderer;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

// What the browser hands back for one successfully rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL the browser ended on (differs from the request after a redirect)
    pub final_url: String,
    /// Encoded raster image of the full page
    pub image: Vec<u8>,
    /// Raw href values of <a> elements, unresolved
    pub hrefs: Vec<String>,
    /// href of the document's <base> element, if any
    pub base_href: Option<String>,
}

// Why a single page could not be rendered
//
// None of these stop a crawl; the page is skipped and the crawl goes on.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("browser unavailable: {0}")]
    Launch(String),
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    // Renders one page
    //
    // Parameters:
    //   url: absolute URL to load
    //   timeout: upper bound on navigation
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError>;

    // Releases the browser. Called once, after the crawl finished.
    async fn shutdown(&self) {}
}
