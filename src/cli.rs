// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - compare: crawl two sites, pair their pages and diff every pair
// - diff: compare two image files already on disk
//
// Flags map onto the settings structs in config.rs; anything not given on
// the command line keeps its default.
//
// Rust concepts:
// - Derive macros: #[derive(Parser)] generates the argument parser
// - Enums: one variant per subcommand, with its own arguments
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    BrowserSettings, CrawlConfig, DiffConfig, Settings, DEFAULT_MAX_PAGES, DEFAULT_NAV_TIMEOUT_MS,
    DEFAULT_SETTLE_MS,
};
use crate::matcher::MatchStrategy;

#[derive(Parser, Debug)]
#[command(
    name = "site-diff",
    version,
    about = "Crawl two websites and highlight visual differences page by page",
    long_about = "site-diff captures every reachable page of two websites, pairs pages that \
                  represent the same content, and marks the regions that look different."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl two websites and compare their pages
    ///
    /// Example: site-diff compare https://old.example.com https://new.example.com
    Compare(CompareArgs),

    /// Compare two image files and print the regions that differ
    ///
    /// Example: site-diff diff before.png after.png --json
    Diff {
        /// First image (PNG, JPEG, ...)
        image1: PathBuf,

        /// Second image
        image2: PathBuf,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First website (e.g., https://example.com)
    pub url1: String,

    /// Second website
    pub url2: String,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// How pages are paired between the two sites
    #[arg(long, value_enum, default_value_t = MatchStrategy::Normalized)]
    pub strategy: MatchStrategy,

    /// Maximum number of pages visited per site
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Navigation timeout per page, in milliseconds
    #[arg(long, default_value_t = DEFAULT_NAV_TIMEOUT_MS)]
    pub nav_timeout_ms: u64,

    /// Pause after navigation before capturing, in milliseconds
    #[arg(long, default_value_t = DEFAULT_SETTLE_MS)]
    pub settle_ms: u64,

    /// Stop crawling each site after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Chrome/Chromium executable (detected automatically if not set)
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Write captured images and report.json into this directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Include base64-encoded images in the JSON report
    #[arg(long)]
    pub embed_images: bool,

    /// Number of page pairs diffed at the same time
    #[arg(long, default_value_t = 4)]
    pub diff_concurrency: usize,
}

impl CompareArgs {
    // Builds run settings from the flags
    pub fn settings(&self) -> Settings {
        Settings {
            crawl: CrawlConfig {
                max_pages: self.max_pages,
                nav_timeout: Duration::from_millis(self.nav_timeout_ms),
                deadline: self.deadline_secs.map(Duration::from_secs),
            },
            browser: BrowserSettings {
                settle_delay: Duration::from_millis(self.settle_ms),
                chrome_path: self.chrome_path.clone(),
                ..Default::default()
            },
            diff: DiffConfig {
                concurrency: self.diff_concurrency,
                ..Default::default()
            },
        }
    }
}
