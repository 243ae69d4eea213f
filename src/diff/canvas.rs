// src/diff/canvas.rs
// =============================================================================
// Puts two screenshots on a common canvas and marks the pixels that differ.
//
// Steps:
// 1. One uniform downscale factor for both images so the longer side of
//    either fits in max_side pixels (never upscale)
// 2. A canvas as large as the larger scaled image in each direction
// 3. Each image resampled to its scaled size and drawn at the top-left of
//    its own zeroed canvas; the uncovered remainder stays zero
// 4. Per pixel: |dR| + |dG| + |dB| > threshold marks it as different
//    (alpha is ignored)
// =============================================================================

use image::imageops::{self, FilterType};
use image::RgbaImage;

// Computes the shared scale factor: min(1, max_side / longest side of each)
pub fn common_scale(size1: (u32, u32), size2: (u32, u32), max_side: u32) -> f64 {
    let longest1 = size1.0.max(size1.1).max(1) as f64;
    let longest2 = size2.0.max(size2.1).max(1) as f64;
    let max_side = max_side as f64;

    1.0_f64.min(max_side / longest1).min(max_side / longest2)
}

// Scales a length, rounding to nearest and never going below one pixel
pub fn scaled(length: u32, scale: f64) -> u32 {
    ((length as f64 * scale).round() as u32).max(1)
}

// Computes the canvas size both images are compared on
pub fn canvas_size(size1: (u32, u32), size2: (u32, u32), scale: f64) -> (u32, u32) {
    (
        scaled(size1.0.max(size2.0), scale),
        scaled(size1.1.max(size2.1), scale),
    )
}

// Resamples an image by `scale` and draws it at the origin of a zeroed
// canvas of the given size
pub fn place_on_canvas(image: &RgbaImage, scale: f64, width: u32, height: u32) -> RgbaImage {
    let target_w = scaled(image.width(), scale).min(width);
    let target_h = scaled(image.height(), scale).min(height);

    let mut canvas = RgbaImage::new(width, height);
    if (target_w, target_h) == image.dimensions() {
        imageops::replace(&mut canvas, image, 0, 0);
    } else {
        let resized = imageops::resize(image, target_w, target_h, FilterType::Triangle);
        imageops::replace(&mut canvas, &resized, 0, 0);
    }
    canvas
}

// Which canvas pixels differ between two same-sized buffers
#[derive(Debug, Clone)]
pub struct DiffMask {
    pub width: u32,
    pub height: u32,
    bits: Vec<bool>,
}

impl DiffMask {
    // Builds a mask directly from rows of 0/1, mainly for tests
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        let bits = rows.iter().flat_map(|r| r.chars().map(|c| c == '1')).collect();
        Self { width, height, bits }
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }
}

// Compares two canvases pixel by pixel
//
// Both buffers must have the same dimensions (they come from place_on_canvas
// with the same canvas size).
pub fn difference_mask(a: &RgbaImage, b: &RgbaImage, threshold: u32) -> DiffMask {
    debug_assert_eq!(a.dimensions(), b.dimensions());

    let bits = a
        .pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| {
            let delta: u32 = (0..3)
                .map(|c| (pa.0[c] as i32 - pb.0[c] as i32).unsigned_abs())
                .sum();
            delta > threshold
        })
        .collect();

    DiffMask {
        width: a.width(),
        height: a.height(),
        bits,
    }
}
