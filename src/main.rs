// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, to stderr so JSON on stdout stays clean)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Print the results
// 5. Exit with a code a script can act on:
//      0 = no differences, 1 = differences found,
//      2 = bad input, 3 = unexpected error
//
// Rust concepts used:
// - async/await: both sites are crawled at the same time
// - Result<T, E>: for error handling (T = success type, E = error type)
// - downcast_ref: tell typed errors apart inside an anyhow::Error
// =============================================================================

// Module declarations - tells Rust about our other source files
mod browser; // src/browser/ - rendering pages in headless Chrome
mod cli; // src/cli.rs - command-line parsing
mod compare; // src/compare.rs - one full comparison run
mod config; // src/config.rs - settings and defaults
mod crawl; // src/crawl/ - same-site crawling
mod diff; // src/diff/ - visual difference regions
mod matcher; // src/matcher.rs - pairing pages across sites
mod normalize; // src/normalize.rs - crawl keys and match keys
mod report; // src/report.rs - table / JSON / directory output

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use cli::{Cli, CompareArgs, Commands};
use compare::CompareError;
use config::DiffConfig;
use diff::DiffError;

const EXIT_OK: i32 = 0;
const EXIT_DIFFERENCES: i32 = 1;
const EXIT_BAD_INPUT: i32 = 2;
const EXIT_ERROR: i32 = 3;

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if is_input_error(&e) {
                EXIT_BAD_INPUT
            } else {
                EXIT_ERROR
            }
        }
    };

    std::process::exit(exit_code);
}

// Installs the log subscriber; RUST_LOG overrides the default level
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("site_diff=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Errors caused by what the user passed in, rather than by the run itself
fn is_input_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<CompareError>(),
        Some(CompareError::InvalidUrl { .. })
    ) || error.downcast_ref::<DiffError>().is_some()
}

// This is the main application logic
// Returns:
//   Ok(0) = no differences
//   Ok(1) = differences found
//   Err = the run could not complete
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare(args) => handle_compare(args).await,
        Commands::Diff {
            image1,
            image2,
            json,
        } => handle_diff(&image1, &image2, json),
    }
}

// Handles the 'compare' subcommand
async fn handle_compare(args: CompareArgs) -> Result<i32> {
    let settings = args.settings();

    eprintln!("🔍 Comparing {} with {}", args.url1, args.url2);
    eprintln!(
        "📊 Up to {} page(s) per site, matching by {:?}",
        settings.crawl.max_pages, args.strategy
    );

    let comparison = compare::run_comparison(&args.url1, &args.url2, args.strategy, &settings).await?;

    eprintln!(
        "📄 Captured {} page(s) on site 1 and {} on site 2",
        comparison.site1.len(),
        comparison.site2.len()
    );

    let mut report = report::Report::new(&comparison, args.embed_images);

    if let Some(dir) = &args.out_dir {
        report
            .write_to_dir(&comparison, dir)
            .with_context(|| format!("Failed to write results to {}", dir.display()))?;
        eprintln!("💾 Results written to {}", dir.display());
    }

    report::print_report(&report, args.json)?;

    if comparison.rows.iter().any(|row| row.has_differences()) {
        Ok(EXIT_DIFFERENCES)
    } else {
        Ok(EXIT_OK)
    }
}

// Handles the 'diff' subcommand
fn handle_diff(image1: &Path, image2: &Path, json: bool) -> Result<i32> {
    let boxes = diff::diff_files(image1, image2, &DiffConfig::default())?;

    report::print_boxes(&boxes, json)?;

    if boxes.is_empty() {
        Ok(EXIT_OK)
    } else {
        Ok(EXIT_DIFFERENCES)
    }
}
