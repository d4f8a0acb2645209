//! Seeded region growing with a fixed tolerance band.
//!
//! Pixels are compared against the seed's own value, never against the
//! neighbor they were reached from, so shallow gradients cannot creep the
//! region outward.

use std::collections::VecDeque;

use log::debug;
use ndarray::{Array2, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::buffer::{check_channels, neighbors, Connectivity, Mask, BACKGROUND, FOREGROUND};
use crate::error::{Result, SegmentationError};

/// Seed position in image coordinates: `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPoint {
    pub x: i64,
    pub y: i64,
}

impl SeedPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// `(row, col)` of the seed, or `None` when outside `width` x `height`.
    pub fn to_row_col(self, width: usize, height: usize) -> Option<(usize, usize)> {
        let col = usize::try_from(self.x).ok().filter(|&c| c < width)?;
        let row = usize::try_from(self.y).ok().filter(|&r| r < height)?;
        Some((row, col))
    }
}

/// Region growing result with metadata.
#[derive(Clone, Debug)]
pub struct RegionGrowResult {
    /// Region mask (255 = inside, 0 = outside)
    pub mask: Mask,
    /// Bounds of the region as (x, y, width, height)
    pub bounds: (usize, usize, usize, usize),
    /// Number of region pixels
    pub pixel_count: usize,
}

/// Grow the region of pixels within `tolerance` of the seed value.
///
/// # Arguments
/// * `image` - Image with 1 or 3 channels (height, width, channels)
/// * `seed` - Starting point as (x, y)
/// * `tolerance` - Maximum per-channel absolute difference from the seed value
/// * `connectivity` - Neighborhood used to connect in-band pixels
///
/// # Returns
/// Mask of the in-band component containing the seed.
pub fn grow_region(
    image: ArrayView3<u8>,
    seed: SeedPoint,
    tolerance: u32,
    connectivity: Connectivity,
) -> Result<Mask> {
    grow_region_detailed(image, seed, tolerance, connectivity).map(|result| result.mask)
}

/// Grow a region and report its bounds and size.
pub fn grow_region_detailed(
    image: ArrayView3<u8>,
    seed: SeedPoint,
    tolerance: u32,
    connectivity: Connectivity,
) -> Result<RegionGrowResult> {
    let channels = check_channels(&image)?;
    let (height, width, _) = image.dim();
    let (seed_row, seed_col) = seed
        .to_row_col(width, height)
        .ok_or(SegmentationError::SeedOutOfBounds {
            x: seed.x,
            y: seed.y,
            width,
            height,
        })?;

    let reference: Vec<u8> = (0..channels)
        .map(|c| image[[seed_row, seed_col, c]])
        .collect();
    let in_band = |row: usize, col: usize| {
        reference
            .iter()
            .enumerate()
            .all(|(c, &r)| u32::from(image[[row, col, c]].abs_diff(r)) <= tolerance)
    };

    let mut mask = Array2::from_elem((height, width), BACKGROUND);
    let mut queue = VecDeque::new();
    let mut pixel_count = 0;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (seed_col, seed_row, seed_col, seed_row);

    // The seed is always in band, so marking on enqueue keeps every queued
    // pixel a region member.
    mask[[seed_row, seed_col]] = FOREGROUND;
    queue.push_back((seed_row, seed_col));

    while let Some((row, col)) = queue.pop_front() {
        pixel_count += 1;
        min_x = min_x.min(col);
        min_y = min_y.min(row);
        max_x = max_x.max(col);
        max_y = max_y.max(row);

        for (nr, nc) in neighbors(row, col, height, width, connectivity) {
            if mask[[nr, nc]] == BACKGROUND && in_band(nr, nc) {
                mask[[nr, nc]] = FOREGROUND;
                queue.push_back((nr, nc));
            }
        }
    }

    debug!(
        "region grown from ({}, {}) with tolerance {tolerance}: {pixel_count} pixels",
        seed.x, seed.y
    );

    Ok(RegionGrowResult {
        mask,
        bounds: (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1),
        pixel_count,
    })
}
