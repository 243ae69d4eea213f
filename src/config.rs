// src/config.rs
// =============================================================================
// Settings for one comparison run.
//
// Everything has a default, and the CLI
// overrides individual fields from flags. Nothing is read from or written to
// disk: every run starts from these values.
//
// Rust concepts:
// - Default trait: `..Default::default()` fills in the fields you don't set
// - Duration: typed time spans instead of bare millisecond integers
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

/// Hard cap on pages visited per site.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Navigation timeout per page.
pub const DEFAULT_NAV_TIMEOUT_MS: u64 = 5_000;

/// Pause after navigation so late content can paint.
pub const DEFAULT_SETTLE_MS: u64 = 1_500;

/// Longest canvas side used for the pixel diff.
pub const DEFAULT_MAX_SIDE: u32 = 600;

/// Summed RGB distance above which a pixel counts as changed.
pub const DEFAULT_CHANNEL_THRESHOLD: u32 = 30;

/// Regions narrower or shorter than this (canvas pixels) are noise.
pub const DEFAULT_MIN_BOX_PX: u32 = 5;

// CSS selectors for overlay chrome hidden before every capture
// (OneTrust cookie consent banner and its floating button).
pub const HIDDEN_OVERLAYS: [&str; 4] = [
    "#onetrust-consent-sdk",
    "#onetrust-banner-sdk",
    ".onetrust-pc-dark-filter",
    "#ot-sdk-btn-floating",
];

// Settings for one site crawl
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Stop once this many pages have been visited
    pub max_pages: usize,
    /// Upper bound on a single page navigation
    pub nav_timeout: Duration,
    /// Optional wall-clock budget for the whole crawl
    pub deadline: Option<Duration>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            nav_timeout: Duration::from_millis(DEFAULT_NAV_TIMEOUT_MS),
            deadline: None,
        }
    }
}

// Settings for the headless browser used to render pages
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub settle_delay: Duration,
    /// Chrome/Chromium binary; None lets chromiumoxide find one
    pub chrome_path: Option<PathBuf>,
    pub jpeg_quality: i64,
    pub hidden_selectors: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 800,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36"
                .to_string(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            chrome_path: None,
            jpeg_quality: 85,
            hidden_selectors: HIDDEN_OVERLAYS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BrowserSettings {
    // Builds the stylesheet injected before capture
    //
    // Example:
    //   "#a { display: none !important; }\n#b { display: none !important; }"
    pub fn overlay_css(&self) -> String {
        self.hidden_selectors
            .iter()
            .map(|selector| format!("{} {{ display: none !important; }}", selector))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// Settings for the visual diff engine
#[derive(Debug, Clone)]
pub struct DiffConfig {
    pub max_side: u32,
    pub channel_threshold: u32,
    pub min_box_px: u32,
    /// How many pairs are diffed at once
    pub concurrency: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_side: DEFAULT_MAX_SIDE,
            channel_threshold: DEFAULT_CHANNEL_THRESHOLD,
            min_box_px: DEFAULT_MIN_BOX_PX,
            concurrency: 4,
        }
    }
}

// Everything a comparison run needs
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub crawl: CrawlConfig,
    pub browser: BrowserSettings,
    pub diff: DiffConfig,
}
