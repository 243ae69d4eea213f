// src/diff/regions.rs
// =============================================================================
// Connected regions of changed pixels.
//
// 4-connected labelling (up/down/left/right, no diagonals) with an explicit
// stack. A full-page screenshot can produce a mask with hundreds of thousands
// of connected pixels, which recursion would not survive.
// =============================================================================

use super::canvas::DiffMask;

// Bounding rectangle of one region, inclusive, in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Region {
    fn at(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

// Finds the bounding rectangle of every connected region in the mask
//
// Regions are returned in scan order of their first (top-left-most) pixel.
pub fn connected_regions(mask: &DiffMask) -> Vec<Region> {
    let width = mask.width as usize;
    let height = mask.height as usize;
    let mut seen = vec![false; mask.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut regions = Vec::new();

    for start in 0..mask.len() {
        if seen[start] || !mask.is_set(start) {
            continue;
        }

        seen[start] = true;
        stack.push(start);
        let mut region = Region::at((start % width) as u32, (start / width) as u32);

        while let Some(index) = stack.pop() {
            let x = index % width;
            let y = index / width;
            region.include(x as u32, y as u32);

            let mut visit = |neighbor: usize| {
                if !seen[neighbor] && mask.is_set(neighbor) {
                    seen[neighbor] = true;
                    stack.push(neighbor);
                }
            };

            if x > 0 {
                visit(index - 1);
            }
            if x + 1 < width {
                visit(index + 1);
            }
            if y > 0 {
                visit(index - width);
            }
            if y + 1 < height {
                visit(index + width);
            }
        }

        regions.push(region);
    }

    regions
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Vec as a stack?
//    - push() and pop() both work at the end of the Vec
//    - That is last-in, first-out: exactly a stack
//    - The stack lives on the heap, so it can grow as large as needed
//
// 2. Why index = y * width + x?
//    - The mask is one flat Vec, row after row
//    - index % width gives x back, index / width gives y
//
// 3. What is the `visit` closure?
//    - A small function defined inline that borrows `seen` and `stack`
//    - It is dropped at the end of each loop iteration, which releases
//      the borrows before stack.pop() runs again
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mask_has_no_regions() {
        let mask = DiffMask::from_rows(&["000", "000"]);
        assert!(connected_regions(&mask).is_empty());
    }

    #[test]
    fn test_diagonal_pixels_are_separate_regions() {
        let mask = DiffMask::from_rows(&["100", "010", "001"]);
        assert_eq!(connected_regions(&mask).len(), 3);
    }

    #[test]
    fn test_bounding_box_of_irregular_shape() {
        let mask = DiffMask::from_rows(&[
            "00000", //
            "01100", //
            "00100", //
            "00111", //
            "00000", //
        ]);
        let regions = connected_regions(&mask);
        assert_eq!(
            regions,
            vec![Region {
                min_x: 1,
                min_y: 1,
                max_x: 4,
                max_y: 3
            }]
        );
        assert_eq!(regions[0].width(), 4);
        assert_eq!(regions[0].height(), 3);
    }

    #[test]
    fn test_large_region_does_not_overflow() {
        let row = "1".repeat(1000);
        let rows: Vec<&str> = (0..1000).map(|_| row.as_str()).collect();
        let mask = DiffMask::from_rows(&rows);

        let regions = connected_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].width(), 1000);
        assert_eq!(regions[0].height(), 1000);
    }
}
