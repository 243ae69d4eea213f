// src/report.rs
// =============================================================================
// Turns a finished comparison into something people and programs can read.
//
// Three outputs:
// - a table in the terminal (one line per match row) plus a summary
// - JSON: both sites' page lists and the match rows with their diff boxes
// - an output directory with every captured image and report.json
//
// Page lists are sorted the same way as match rows: "/" first, then by path.
//
// Rust concepts:
// - serde: #[derive(Serialize)] turns structs into JSON
// - skip_serializing_if: leave a field out instead of writing null
// =============================================================================

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::compare::{Comparison, RowDiff};
use crate::crawl::{CrawlResult, PageRecord};
use crate::diff::DiffBox;
use crate::matcher::MatchStrategy;
use crate::normalize::compare_keys;

#[derive(Debug, Serialize)]
pub struct PageEntry {
    pub path: String,
    pub url: String,
    /// Base64 of the captured image, only with --embed-images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// File name under the output directory, only with --out-dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RowEntry {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boxes: Option<Vec<DiffBox>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub url1: String,
    pub url2: String,
    pub strategy: MatchStrategy,
    pub pages1: Vec<PageEntry>,
    pub pages2: Vec<PageEntry>,
    pub rows: Vec<RowEntry>,
}

// Counts shown under the table
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub pairs: usize,
    pub identical: usize,
    pub changed: usize,
    pub failed: usize,
    pub only_site1: usize,
    pub only_site2: usize,
}

impl Report {
    // Builds the report from a comparison
    //
    // Parameters:
    //   embed_images: put base64 images into the page lists
    pub fn new(comparison: &Comparison, embed_images: bool) -> Self {
        let rows = comparison
            .rows
            .iter()
            .map(|compared| {
                let (boxes, diff_error) = match &compared.diff {
                    RowDiff::OneSided => (None, None),
                    RowDiff::Boxes(boxes) => (Some(boxes.clone()), None),
                    RowDiff::Failed(e) => (None, Some(e.clone())),
                };
                RowEntry {
                    key: compared.row.key.clone(),
                    page1: compared.row.page1.as_ref().map(|p| p.key.clone()),
                    page2: compared.row.page2.as_ref().map(|p| p.key.clone()),
                    boxes,
                    diff_error,
                }
            })
            .collect();

        Self {
            url1: comparison.url1.clone(),
            url2: comparison.url2.clone(),
            strategy: comparison.strategy,
            pages1: page_entries(&comparison.site1, embed_images),
            pages2: page_entries(&comparison.site2, embed_images),
            rows,
        }
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for row in &self.rows {
            match (&row.page1, &row.page2) {
                (Some(_), Some(_)) => {
                    summary.pairs += 1;
                    match &row.boxes {
                        Some(boxes) if boxes.is_empty() => summary.identical += 1,
                        Some(_) => summary.changed += 1,
                        None => summary.failed += 1,
                    }
                }
                (Some(_), None) => summary.only_site1 += 1,
                _ => summary.only_site2 += 1,
            }
        }
        summary
    }

    // Writes images and report.json into `dir`
    //
    // Layout:
    //   dir/site1/001-root.jpg, dir/site1/002-about.jpg, ...
    //   dir/site2/...
    //   dir/report.json (page entries point at the image files)
    pub fn write_to_dir(&mut self, comparison: &Comparison, dir: &Path) -> Result<()> {
        for (name, site, entries) in [
            ("site1", &comparison.site1, &mut self.pages1),
            ("site2", &comparison.site2, &mut self.pages2),
        ] {
            let site_dir = dir.join(name);
            fs::create_dir_all(&site_dir)
                .with_context(|| format!("Failed to create {}", site_dir.display()))?;

            for (position, entry) in entries.iter_mut().enumerate() {
                let Some(page) = site.get(&entry.path) else {
                    continue;
                };
                let file_name = format!("{:03}-{}.jpg", position + 1, slug(&page.key));
                let path = site_dir.join(&file_name);
                fs::write(&path, &page.image[..])
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                entry.file = Some(format!("{}/{}", name, file_name));
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        let report_path = dir.join("report.json");
        fs::write(&report_path, json)
            .with_context(|| format!("Failed to write {}", report_path.display()))?;
        Ok(())
    }
}

fn page_entries(site: &CrawlResult, embed_images: bool) -> Vec<PageEntry> {
    let mut pages: Vec<&PageRecord> = site.pages().iter().collect();
    pages.sort_by(|a, b| compare_keys(&a.key, &b.key));

    pages
        .into_iter()
        .map(|page| PageEntry {
            path: page.key.clone(),
            url: page.url.clone(),
            image: embed_images.then(|| STANDARD.encode(&page.image[..])),
            file: None,
        })
        .collect()
}

// Makes a crawl key safe to use in a file name
//
// Examples:
//   "/"               -> "root"
//   "/docs/intro.html" -> "docs-intro-html"
//   "/search?q=a b"   -> "search-q-a-b"
fn slug(key: &str) -> String {
    let slug: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "root".to_string()
    } else {
        slug.chars().take(80).collect()
    }
}

// Prints the report either as a table or JSON
pub fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
    }
    Ok(())
}

// Prints match rows as a human-readable table in the terminal
fn print_table(report: &Report) {
    println!("{:<30} {:<30} {:<30} {:<15}", "KEY", "SITE 1", "SITE 2", "DIFF");
    println!("{}", "=".repeat(105));

    for row in &report.rows {
        println!(
            "{:<30} {:<30} {:<30} {:<15}",
            truncate(&row.key, 29),
            truncate(row.page1.as_deref().unwrap_or("(no page)"), 29),
            truncate(row.page2.as_deref().unwrap_or("(no page)"), 29),
            format_diff(row)
        );
    }

    println!();

    let summary = report.summary();
    println!("📊 Summary:");
    println!("   🔗 Pairs: {}", summary.pairs);
    println!("   ✅ Identical: {}", summary.identical);
    println!("   🎨 With differences: {}", summary.changed);
    if summary.failed > 0 {
        println!("   ⚠️  Not comparable: {}", summary.failed);
    }
    println!("   ◀️  Only on site 1: {}", summary.only_site1);
    println!("   ▶️  Only on site 2: {}", summary.only_site2);
}

fn format_diff(row: &RowEntry) -> String {
    match (&row.boxes, &row.diff_error) {
        (Some(boxes), _) if boxes.is_empty() => "✅ SAME".to_string(),
        (Some(boxes), _) => format!("🎨 {} REGION(S)", boxes.len()),
        (None, Some(_)) => "⚠️  ERROR".to_string(),
        (None, None) => "➖ ONE SIDE".to_string(),
    }
}

// Prints the boxes of a single image diff (the `diff` subcommand)
pub fn print_boxes(boxes: &[DiffBox], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(boxes)?);
        return Ok(());
    }

    if boxes.is_empty() {
        println!("✅ No visual differences");
        return Ok(());
    }

    println!("{:<10} {:<10} {:<10} {:<10}", "LEFT", "TOP", "WIDTH", "HEIGHT");
    println!("{}", "=".repeat(40));
    for b in boxes {
        println!(
            "{:<10.4} {:<10.4} {:<10.4} {:<10.4}",
            b.left, b.top, b.width, b.height
        );
    }
    println!();
    println!("🎨 {} region(s) differ", boxes.len());
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::ComparedRow;
    use crate::matcher::MatchRow;
    use std::sync::Arc;

    fn record(key: &str) -> PageRecord {
        PageRecord {
            key: key.to_string(),
            url: format!("https://a.com{}", key),
            image: Arc::from(vec![1u8, 2, 3]),
        }
    }

    fn comparison() -> Comparison {
        let mut site1 = CrawlResult::new();
        site1.insert(record("/zeta"));
        site1.insert(record("/"));
        let mut site2 = CrawlResult::new();
        site2.insert(record("/"));

        let boxes = vec![DiffBox {
            left: 0.1,
            top: 0.2,
            width: 0.3,
            height: 0.4,
        }];

        Comparison {
            url1: "https://a.com".to_string(),
            url2: "https://b.com".to_string(),
            strategy: MatchStrategy::Normalized,
            rows: vec![
                ComparedRow {
                    row: MatchRow {
                        key: "/".to_string(),
                        page1: site1.get("/").cloned(),
                        page2: site2.get("/").cloned(),
                    },
                    diff: RowDiff::Boxes(boxes),
                },
                ComparedRow {
                    row: MatchRow {
                        key: "zeta".to_string(),
                        page1: site1.get("/zeta").cloned(),
                        page2: None,
                    },
                    diff: RowDiff::OneSided,
                },
            ],
            site1,
            site2,
        }
    }

    #[test]
    fn test_pages_sorted_root_first() {
        let report = Report::new(&comparison(), false);
        let paths: Vec<_> = report.pages1.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/zeta"]);
        assert!(report.pages1[0].image.is_none());
    }

    #[test]
    fn test_embedded_images_are_base64() {
        let report = Report::new(&comparison(), true);
        assert_eq!(report.pages2[0].image.as_deref(), Some("AQID"));
    }

    #[test]
    fn test_summary_counts() {
        let report = Report::new(&comparison(), false);
        assert_eq!(
            report.summary(),
            Summary {
                pairs: 1,
                changed: 1,
                only_site1: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_json_leaves_out_absent_fields() {
        let report = Report::new(&comparison(), false);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["strategy"], "normalized");
        assert_eq!(value["rows"][0]["boxes"][0]["width"], 0.3);
        assert!(value["rows"][1].get("page2").is_none());
        assert!(value["rows"][1].get("boxes").is_none());
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("/"), "root");
        assert_eq!(slug("/docs/Intro.html"), "docs-intro-html");
        assert_eq!(slug("/search?q=a b"), "search-q-a-b");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-much-longer-key", 10), "a-much-...");
    }
}
