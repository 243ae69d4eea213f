// src/diff/mod.rs
// =============================================================================
// This module finds the regions that differ between two screenshots.
//
// Submodules:
// - canvas: common downscale, resampling and the per-pixel difference mask
// - regions: connected regions of the mask and their bounding boxes
//
// The result is a list of boxes in fractions of the canvas (0.0 - 1.0), so
// the same boxes can be drawn over both screenshots at any display size.
//
// Diffing different pairs shares nothing, so diff_pairs runs them in
// parallel on tokio's blocking pool.
//
// Rust concepts:
// - spawn_blocking: CPU-heavy work off the async worker threads
// - Arc<[u8]>: images shared with the diff task without copying
// - Streams: buffer_unordered to bound how many diffs run at once
// =============================================================================

mod canvas;
mod regions;

use futures::stream::{self, StreamExt};
use image::RgbaImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DiffConfig;
use canvas::{canvas_size, common_scale, difference_mask, place_on_canvas};
use regions::connected_regions;

// A changed region, relative to the comparison canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiffBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("could not decode image {side}: {source}")]
    Decode {
        side: u8,
        #[source]
        source: image::ImageError,
    },

    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("diff task failed: {0}")]
    Task(String),
}

// Computes the changed regions between two encoded images
//
// Parameters:
//   image1, image2: encoded raster images (PNG, JPEG, ...)
//   config: canvas size limit, pixel threshold and minimum box size
//
// Returns: normalized boxes in no particular order; identical images give
// an empty list
pub fn diff_images(image1: &[u8], image2: &[u8], config: &DiffConfig) -> Result<Vec<DiffBox>, DiffError> {
    let first = decode(image1, 1)?;
    let second = decode(image2, 2)?;
    Ok(diff_decoded(&first, &second, config))
}

// Reads two image files and diffs them
pub fn diff_files(path1: &Path, path2: &Path, config: &DiffConfig) -> Result<Vec<DiffBox>, DiffError> {
    let read = |path: &Path| {
        std::fs::read(path).map_err(|source| DiffError::Read {
            path: path.to_path_buf(),
            source,
        })
    };
    diff_images(&read(path1)?, &read(path2)?, config)
}

fn decode(bytes: &[u8], side: u8) -> Result<RgbaImage, DiffError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|source| DiffError::Decode { side, source })
}

// Same as diff_images, on already decoded pixels
pub fn diff_decoded(first: &RgbaImage, second: &RgbaImage, config: &DiffConfig) -> Vec<DiffBox> {
    let scale = common_scale(first.dimensions(), second.dimensions(), config.max_side);
    let (width, height) = canvas_size(first.dimensions(), second.dimensions(), scale);

    let canvas_a = place_on_canvas(first, scale, width, height);
    let canvas_b = place_on_canvas(second, scale, width, height);
    let mask = difference_mask(&canvas_a, &canvas_b, config.channel_threshold);

    let cw = width as f64;
    let ch = height as f64;

    connected_regions(&mask)
        .into_iter()
        .filter(|r| r.width() >= config.min_box_px && r.height() >= config.min_box_px)
        .map(|r| DiffBox {
            left: r.min_x as f64 / cw,
            top: r.min_y as f64 / ch,
            width: r.width() as f64 / cw,
            height: r.height() as f64 / ch,
        })
        .collect()
}

// Diffs many image pairs, at most `config.concurrency` at a time
//
// Parameters:
//   pairs: (id, image1, image2); the id is handed back with the result
//
// Returns: one (id, result) per pair, in input order
pub async fn diff_pairs<K>(
    pairs: Vec<(K, Arc<[u8]>, Arc<[u8]>)>,
    config: &DiffConfig,
) -> Vec<(K, Result<Vec<DiffBox>, DiffError>)>
where
    K: Send + 'static,
{
    let futures = pairs.into_iter().enumerate().map(|(position, (id, image1, image2))| {
        let config = config.clone();
        async move {
            let task = tokio::task::spawn_blocking(move || diff_images(&image1, &image2, &config));
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(DiffError::Task(e.to_string())),
            };
            (position, id, result)
        }
    });

    let mut results: Vec<_> = stream::iter(futures)
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(position, _, _)| *position);

    results
        .into_iter()
        .map(|(_, id, result)| {
            match &result {
                Ok(boxes) => debug!(boxes = boxes.len(), "pair diffed"),
                Err(e) => warn!(error = %e, "pair could not be diffed"),
            }
            (id, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn encode(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn with_square(mut image: RgbaImage, x: u32, y: u32, size: u32) -> RgbaImage {
        for dy in 0..size {
            for dx in 0..size {
                image.put_pixel(x + dx, y + dy, RED);
            }
        }
        image
    }

    fn blank(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, WHITE)
    }

    #[test]
    fn test_identical_images_have_no_boxes() {
        let bytes = encode(&with_square(blank(800, 600), 100, 100, 40));
        let boxes = diff_images(&bytes, &bytes, &DiffConfig::default()).unwrap();
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_single_square_gives_one_box() {
        let plain = encode(&blank(800, 600));
        let marked = encode(&with_square(blank(800, 600), 400, 300, 10));

        let boxes = diff_images(&plain, &marked, &DiffConfig::default()).unwrap();

        assert_eq!(boxes.len(), 1);
        let b = boxes[0];
        // 800x600 is scaled by 0.75 onto a 600x450 canvas
        assert!((b.width - 10.0 / 800.0).abs() < 3.0 / 600.0, "width {}", b.width);
        assert!((b.height - 10.0 / 600.0).abs() < 3.0 / 450.0, "height {}", b.height);
        assert!((b.left - 400.0 / 800.0).abs() < 3.0 / 600.0, "left {}", b.left);
        assert!((b.top - 300.0 / 600.0).abs() < 3.0 / 450.0, "top {}", b.top);
    }

    #[test]
    fn test_diff_is_symmetric() {
        let tall = encode(&with_square(blank(400, 900), 50, 50, 30));
        let short = encode(&blank(400, 500));
        let config = DiffConfig::default();

        let mut forward = diff_images(&tall, &short, &config).unwrap();
        let mut backward = diff_images(&short, &tall, &config).unwrap();

        let by_position = |a: &DiffBox, b: &DiffBox| {
            (a.top, a.left).partial_cmp(&(b.top, b.left)).unwrap()
        };
        forward.sort_by(by_position);
        backward.sort_by(by_position);

        assert_eq!(forward, backward);
        // The square and the part of the tall page the short one lacks
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn test_small_changes_are_ignored() {
        let plain = encode(&blank(200, 200));
        let marked = encode(&with_square(blank(200, 200), 20, 20, 4));

        let boxes = diff_images(&plain, &marked, &DiffConfig::default()).unwrap();
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_boxes_are_fractions_of_canvas() {
        let plain = encode(&blank(100, 50));
        let marked = encode(&with_square(blank(100, 50), 0, 0, 10));

        let boxes = diff_images(&plain, &marked, &DiffConfig::default()).unwrap();

        assert_eq!(
            boxes,
            vec![DiffBox {
                left: 0.0,
                top: 0.0,
                width: 0.1,
                height: 0.2
            }]
        );
    }

    #[test]
    fn test_undecodable_image_is_an_error() {
        let good = encode(&blank(10, 10));
        let err = diff_images(&good, b"not an image", &DiffConfig::default()).unwrap_err();
        assert!(matches!(err, DiffError::Decode { side: 2, .. }));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = diff_files(
            Path::new("/nonexistent/one.png"),
            Path::new("/nonexistent/two.png"),
            &DiffConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DiffError::Read { .. }));
    }

    #[tokio::test]
    async fn test_diff_pairs_keeps_input_order() {
        let plain: Arc<[u8]> = Arc::from(encode(&blank(100, 100)));
        let marked: Arc<[u8]> = Arc::from(encode(&with_square(blank(100, 100), 10, 10, 20)));
        let broken: Arc<[u8]> = Arc::from(b"junk".to_vec());

        let pairs = vec![
            ("same", plain.clone(), plain.clone()),
            ("changed", plain.clone(), marked.clone()),
            ("broken", plain.clone(), broken),
        ];
        let results = diff_pairs(pairs, &DiffConfig::default()).await;

        let ids: Vec<_> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["same", "changed", "broken"]);
        assert!(results[0].1.as_ref().unwrap().is_empty());
        assert_eq!(results[1].1.as_ref().unwrap().len(), 1);
        assert!(results[2].1.is_err());
    }
}
