// src/compare.rs
// =============================================================================
// One full comparison run: crawl both sites, pair their pages, diff the pairs.
//
// Flow:
// 1. Validate both input URLs (nothing is crawled if either is malformed)
// 2. Launch one renderer per site and crawl both sites at the same time
// 3. Match the two results with the chosen strategy
// 4. Diff every row that has a page on both sides
//
// Failure handling:
// - a page that fails is simply missing from its site's result
// - a site whose browser can't start contributes an empty result
// - when neither site produced a single page the run fails, since there
//   is nothing to compare
// =============================================================================

use anyhow::Result;
use std::future::Future;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::browser::{ChromeRenderer, PageRenderer};
use crate::config::Settings;
use crate::crawl::{crawl_site, CrawlResult};
use crate::diff::{diff_pairs, DiffBox};
use crate::matcher::{match_pages, MatchRow, MatchStrategy};

// Errors the caller should be able to tell apart from internal failures
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Invalid URL format for {which}: '{input}' ({source})")]
    InvalidUrl {
        which: &'static str,
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("No pages captured on either site; site 1: {site1}; site 2: {site2}")]
    NoResults { site1: String, site2: String },
}

// Outcome of diffing one row
#[derive(Debug, Clone)]
pub enum RowDiff {
    /// Only one site has this page
    OneSided,
    /// Both pages diffed; empty means visually identical
    Boxes(Vec<DiffBox>),
    /// Both pages exist but could not be compared
    Failed(String),
}

#[derive(Debug)]
pub struct ComparedRow {
    pub row: MatchRow,
    pub diff: RowDiff,
}

impl ComparedRow {
    // True when this row shows any difference between the sites
    pub fn has_differences(&self) -> bool {
        match &self.diff {
            RowDiff::OneSided => true,
            RowDiff::Boxes(boxes) => !boxes.is_empty(),
            RowDiff::Failed(_) => false,
        }
    }
}

#[derive(Debug)]
pub struct Comparison {
    pub url1: String,
    pub url2: String,
    pub strategy: MatchStrategy,
    pub site1: CrawlResult,
    pub site2: CrawlResult,
    pub rows: Vec<ComparedRow>,
}

// Validates one input URL
fn parse_input(which: &'static str, input: &str) -> Result<Url, CompareError> {
    let input = input.trim();
    Url::parse(input).map_err(|source| CompareError::InvalidUrl {
        which,
        input: input.to_string(),
        source,
    })
}

// Runs a comparison with headless Chrome
pub async fn run_comparison(
    url1: &str,
    url2: &str,
    strategy: MatchStrategy,
    settings: &Settings,
) -> Result<Comparison> {
    run_comparison_with(url1, url2, strategy, settings, || {
        ChromeRenderer::launch(&settings.browser)
    })
    .await
}

// Runs a comparison with renderers produced by `launch`
//
// `launch` is called once per site; each crawl gets its own renderer.
pub async fn run_comparison_with<R, F, Fut>(
    url1: &str,
    url2: &str,
    strategy: MatchStrategy,
    settings: &Settings,
    launch: F,
) -> Result<Comparison>
where
    R: PageRenderer,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let start1 = parse_input("url1", url1)?;
    let start2 = parse_input("url2", url2)?;

    info!(site1 = %start1, site2 = %start2, ?strategy, "comparison started");

    let (site1, site2) = tokio::join!(
        crawl_one(&start1, settings, &launch),
        crawl_one(&start2, settings, &launch)
    );

    let (site1, site2) = match (site1, site2) {
        (Ok(a), Ok(b)) => (a, b),
        (Ok(a), Err(e)) => {
            warn!(site = %start2, error = %e, "site 2 could not be crawled");
            (a, CrawlResult::new())
        }
        (Err(e), Ok(b)) => {
            warn!(site = %start1, error = %e, "site 1 could not be crawled");
            (CrawlResult::new(), b)
        }
        (Err(e1), Err(e2)) => {
            return Err(CompareError::NoResults {
                site1: format!("{:#}", e1),
                site2: format!("{:#}", e2),
            }
            .into());
        }
    };

    if site1.is_empty() && site2.is_empty() {
        return Err(CompareError::NoResults {
            site1: format!("{}: no page could be captured", start1),
            site2: format!("{}: no page could be captured", start2),
        }
        .into());
    }

    let rows = match_pages(&site1, &site2, strategy);
    let rows = diff_rows(rows, settings).await;

    info!(
        pages1 = site1.len(),
        pages2 = site2.len(),
        rows = rows.len(),
        pairs = rows.iter().filter(|r| r.row.is_pair()).count(),
        "comparison finished"
    );

    Ok(Comparison {
        url1: url1.trim().to_string(),
        url2: url2.trim().to_string(),
        strategy,
        site1,
        site2,
        rows,
    })
}

// Launches a renderer, crawls one site, and shuts the renderer down
async fn crawl_one<R, F, Fut>(start: &Url, settings: &Settings, launch: &F) -> Result<CrawlResult>
where
    R: PageRenderer,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let renderer = launch().await?;
    let result = crawl_site(&renderer, start, &settings.crawl).await;
    renderer.shutdown().await;
    Ok(result)
}

// Diffs every paired row and attaches the outcome to each row
async fn diff_rows(rows: Vec<MatchRow>, settings: &Settings) -> Vec<ComparedRow> {
    let pairs: Vec<_> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| match (&row.page1, &row.page2) {
            (Some(a), Some(b)) => Some((index, a.image.clone(), b.image.clone())),
            _ => None,
        })
        .collect();

    let mut diffs: Vec<RowDiff> = vec![RowDiff::OneSided; rows.len()];
    for (index, result) in diff_pairs(pairs, &settings.diff).await {
        diffs[index] = match result {
            Ok(boxes) => RowDiff::Boxes(boxes),
            Err(e) => RowDiff::Failed(e.to_string()),
        };
    }

    rows.into_iter()
        .zip(diffs)
        .map(|(row, diff)| ComparedRow { row, diff })
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does tokio::join! do?
//    - Runs several futures at the same time on the current task
//    - Waits until all of them finish and returns their outputs as a tuple
//    - Unlike try_join!, one Err does not cancel the others
//
// 2. Why is launch a closure (F: Fn() -> Fut)?
//    - Each site needs its own renderer, so we call it twice
//    - Tests pass a closure returning a fake renderer instead of Chrome
//
// 3. What is downcast_ref?
//    - anyhow::Error can hold any error type
//    - downcast_ref::<CompareError>() checks if it is one of ours
//    - main uses this to choose the exit code
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::MockRenderer;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(color: [u8; 3]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(64, 48, Rgba([color[0], color[1], color[2], 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    // Site A: "/", "/about.html". Site B: "/", "/about-cc.htm", "/contact".
    // B's about page is a different colour.
    fn fake_web() -> MockRenderer {
        let white = png([255, 255, 255]);
        let blue = png([0, 0, 255]);
        MockRenderer::new()
            .page_with_image("https://a.com/", &["/about.html"], white.clone())
            .page_with_image("https://a.com/about.html", &["/"], white.clone())
            .page_with_image("https://b.com/", &["/about-cc.htm", "/contact"], white.clone())
            .page_with_image("https://b.com/about-cc.htm", &[], blue)
            .page_with_image("https://b.com/contact", &[], white)
    }

    #[tokio::test]
    async fn test_end_to_end_normalized_matching() {
        let comparison = run_comparison_with(
            "https://a.com/",
            " https://b.com ",
            MatchStrategy::Normalized,
            &Settings::default(),
            || async { anyhow::Ok(fake_web()) },
        )
        .await
        .unwrap();

        assert_eq!(comparison.url2, "https://b.com");
        assert_eq!(comparison.site1.len(), 2);
        assert_eq!(comparison.site2.len(), 3);

        let keys: Vec<_> = comparison.rows.iter().map(|r| r.row.key.as_str()).collect();
        assert_eq!(keys, vec!["/", "about", "contact"]);

        assert!(matches!(&comparison.rows[0].diff, RowDiff::Boxes(b) if b.is_empty()));
        assert!(matches!(&comparison.rows[1].diff, RowDiff::Boxes(b) if b.len() == 1));
        assert!(matches!(comparison.rows[2].diff, RowDiff::OneSided));
        assert!(comparison.rows[2].row.page1.is_none());

        assert!(!comparison.rows[0].has_differences());
        assert!(comparison.rows[1].has_differences());
        assert!(comparison.rows[2].has_differences());
    }

    #[tokio::test]
    async fn test_invalid_url_crawls_nothing() {
        let launches = AtomicUsize::new(0);
        let err = run_comparison_with(
            "https://a.com/",
            "not a url",
            MatchStrategy::Normalized,
            &Settings::default(),
            || {
                launches.fetch_add(1, Ordering::SeqCst);
                async { anyhow::Ok(MockRenderer::new()) }
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CompareError>(),
            Some(CompareError::InvalidUrl { which: "url2", .. })
        ));
        assert_eq!(launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_failed_launch_keeps_other_site() {
        let launches = AtomicUsize::new(0);
        let comparison = run_comparison_with(
            "https://a.com/",
            "https://b.com/",
            MatchStrategy::Normalized,
            &Settings::default(),
            || {
                let n = launches.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(fake_web())
                    } else {
                        Err(anyhow::anyhow!("Chrome not found"))
                    }
                }
            },
        )
        .await
        .unwrap();

        // Whichever site got the failed browser is empty, the other is intact
        let sizes = (comparison.site1.len(), comparison.site2.len());
        assert!(sizes == (2, 0) || sizes == (0, 3), "sizes {:?}", sizes);
        assert!(comparison.rows.iter().all(|r| matches!(r.diff, RowDiff::OneSided)));
    }

    #[tokio::test]
    async fn test_both_failed_launches_is_an_error() {
        let err = run_comparison_with(
            "https://a.com/",
            "https://b.com/",
            MatchStrategy::Normalized,
            &Settings::default(),
            || async { Err::<MockRenderer, _>(anyhow::anyhow!("Chrome not found")) },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CompareError>(),
            Some(CompareError::NoResults { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_pages_on_either_site_is_an_error() {
        // Both browsers start, but neither start URL can be loaded
        let err = run_comparison_with(
            "https://down-a.com/",
            "https://down-b.com/",
            MatchStrategy::Normalized,
            &Settings::default(),
            || async { anyhow::Ok(MockRenderer::new()) },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CompareError>(),
            Some(CompareError::NoResults { .. })
        ));
    }

    #[tokio::test]
    async fn test_one_empty_site_still_compares() {
        let comparison = run_comparison_with(
            "https://a.com/",
            "https://down.com/",
            MatchStrategy::Normalized,
            &Settings::default(),
            || async { anyhow::Ok(fake_web()) },
        )
        .await
        .unwrap();

        assert_eq!(comparison.site1.len(), 2);
        assert!(comparison.site2.is_empty());
        assert!(comparison.rows.iter().all(|r| r.has_differences()));
    }

    #[tokio::test]
    async fn test_undecodable_pair_is_marked_failed() {
        let renderer = || async {
            anyhow::Ok(MockRenderer::new()
                .page("https://a.com/", &[])
                .page("https://b.com/", &[]))
        };
        let comparison = run_comparison_with(
            "https://a.com/",
            "https://b.com/",
            MatchStrategy::Exact,
            &Settings::default(),
            renderer,
        )
        .await
        .unwrap();

        assert_eq!(comparison.rows.len(), 1);
        assert!(matches!(comparison.rows[0].diff, RowDiff::Failed(_)));
        assert!(!comparison.rows[0].has_differences());
    }
}
