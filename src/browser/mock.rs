// src/browser/mock.rs
// =============================================================================
// In-memory renderer for tests: a tiny fake website.
//
// Pages are registered by normalized URL. Rendering an unknown URL fails
// like an unreachable page would. Every render call is recorded so tests
// can assert nothing was loaded twice.
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{PageRenderer, RenderError, RenderedPage};

#[derive(Debug, Clone)]
enum MockPage {
    Ok {
        final_url: Option<String>,
        image: Vec<u8>,
        hrefs: Vec<String>,
    },
    Timeout,
}

#[derive(Debug, Default)]
pub struct MockRenderer {
    pages: HashMap<String, MockPage>,
    calls: Mutex<Vec<String>>,
    delay: Duration,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    // Adds a page whose image is its own URL as bytes
    pub fn page(self, url: &str, hrefs: &[&str]) -> Self {
        let image = url.as_bytes().to_vec();
        self.page_with_image(url, hrefs, image)
    }

    pub fn page_with_image(mut self, url: &str, hrefs: &[&str], image: Vec<u8>) -> Self {
        self.pages.insert(
            url.to_string(),
            MockPage::Ok {
                final_url: None,
                image,
                hrefs: hrefs.iter().map(|h| h.to_string()).collect(),
            },
        );
        self
    }

    // Adds a page that lands on `final_url` after navigation
    pub fn redirect(mut self, url: &str, final_url: &str, hrefs: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            MockPage::Ok {
                final_url: Some(final_url.to_string()),
                image: final_url.as_bytes().to_vec(),
                hrefs: hrefs.iter().map(|h| h.to_string()).collect(),
            },
        );
        self
    }

    // Adds a page that never finishes navigating
    pub fn timeout(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), MockPage::Timeout);
        self
    }

    // Makes every render take `delay` (on tokio's clock, so paused tests
    // advance instantly)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// URLs passed to render(), in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError> {
        self.calls.lock().unwrap().push(url.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.pages.get(url) {
            Some(MockPage::Ok {
                final_url,
                image,
                hrefs,
            }) => Ok(RenderedPage {
                final_url: final_url.clone().unwrap_or_else(|| url.to_string()),
                image: image.clone(),
                hrefs: hrefs.clone(),
                base_href: None,
            }),
            Some(MockPage::Timeout) => Err(RenderError::Timeout(timeout)),
            None => Err(RenderError::Navigation(format!("net::ERR_NAME_NOT_RESOLVED at {}", url))),
        }
    }
}
