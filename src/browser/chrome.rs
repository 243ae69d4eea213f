// src/browser/chrome.rs
// =============================================================================
// Renders pages with a headless Chrome driven over the DevTools protocol.
//
// One browser is launched per site crawl, each with its own throwaway
// profile directory. Both crawls run at the same time, and two Chrome
// processes can't share a profile. Every URL gets a fresh tab:
// 1. Open a blank tab and set the user agent
// 2. Navigate, bounded by the navigation timeout
// 3. Read the final URL (after redirects)
// 4. Wait for the settle delay, then hide overlay chrome with a <style> tag
// 5. Capture a full-page JPEG
// 6. Read the rendered HTML and collect anchor hrefs
// 7. Close the tab (also when any step above failed)
//
// Rust concepts:
// - tokio::time::timeout: wraps a future and gives up after a Duration
// - tokio::spawn: the browser's event handler runs as a background task
// - Mutex: the Browser needs &mut for close(), so it lives behind a lock
// =============================================================================

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{PageRenderer, RenderError, RenderedPage};
use crate::config::BrowserSettings;
use crate::crawl::anchor_hrefs;

pub struct ChromeRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    settings: BrowserSettings,
    // Deleted when the renderer is dropped, after shutdown() closed Chrome
    profile: TempDir,
}

impl ChromeRenderer {
    // Launches a headless browser with the configured viewport
    //
    // Returns: a renderer ready to load pages, or an error if Chrome
    // could not be found or started
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let profile = profile_dir()?;
        debug!(profile = %profile.path().display(), "launching browser");

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .window_size(settings.viewport_width, settings.viewport_height)
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        if let Some(path) = &settings.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow!("Invalid browser configuration: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch headless Chrome")?;

        // The handler must be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            settings: settings.clone(),
            profile,
        })
    }

    async fn open_tab(&self) -> Result<Page, RenderError> {
        let browser = self.browser.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        page.set_user_agent(SetUserAgentOverrideParams::new(self.settings.user_agent.clone()))
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?;

        Ok(page)
    }

    // Runs steps 2-6 on an already opened tab
    async fn render_in(
        &self,
        page: &Page,
        url: &str,
        timeout: Duration,
    ) -> Result<RenderedPage, RenderError> {
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(categorize_error(e, timeout)),
            Err(_) => return Err(RenderError::Timeout(timeout)),
        }

        let final_url = page
            .url()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?
            .unwrap_or_else(|| url.to_string());

        tokio::time::sleep(self.settings.settle_delay).await;

        self.hide_overlays(page).await?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(self.settings.jpeg_quality)
            .full_page(true)
            .build();
        let image = page
            .screenshot(params)
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))?;

        let html = page
            .content()
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?;
        let (hrefs, base_href) = anchor_hrefs(&html);

        Ok(RenderedPage {
            final_url,
            image,
            hrefs,
            base_href,
        })
    }

    // Appends a <style> element that hides the configured overlays
    async fn hide_overlays(&self, page: &Page) -> Result<(), RenderError> {
        let css = serde_json::to_string(&self.settings.overlay_css())
            .map_err(|e| RenderError::Script(e.to_string()))?;
        let script = format!(
            "(() => {{ const s = document.createElement('style'); s.textContent = {}; \
             (document.head || document.documentElement).appendChild(s); }})()",
            css
        );

        page.evaluate(script)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let page = self.open_tab().await?;
        let result = self.render_in(&page, url, timeout).await;

        if let Err(e) = page.close().await {
            warn!(url = %url, "failed to close tab: {}", e);
        }

        result
    }

    async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("failed to close browser: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!(profile = %self.profile.path().display(), "failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
    }
}

// Maps a DevTools error from navigation to a RenderError
//
// Chrome reports unreachable hosts as "net::ERR_..." navigation errors;
// chromiumoxide's own request timeout shows up as CdpError::Timeout.
fn categorize_error(error: CdpError, timeout: Duration) -> RenderError {
    match error {
        CdpError::Timeout => RenderError::Timeout(timeout),
        other => RenderError::Navigation(other.to_string()),
    }
}

// Creates an empty Chrome profile directory unique to one launch
fn profile_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("site-diff-chrome-")
        .tempdir()
        .context("Failed to create temp profile dir")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_launch_gets_its_own_profile() {
        let first = profile_dir().unwrap();
        let second = profile_dir().unwrap();

        assert_ne!(first.path(), second.path());
        assert!(first.path().is_dir());
        assert!(second.path().is_dir());
    }

    #[test]
    fn test_profile_is_removed_on_drop() {
        let profile = profile_dir().unwrap();
        let path = profile.path().to_path_buf();
        drop(profile);
        assert!(!path.exists());
    }
}
