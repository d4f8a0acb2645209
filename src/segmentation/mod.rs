//! Lesion segmentation: click-to-segment and mask/contour conversion.
//!
//! This module provides the interactive segmentation path:
//! - **Region growing**: seeded flood fill within a fixed tolerance band
//! - **Hole filling**: closes interior islands left by the band test
//! - **Contour tracing**: marching squares boundary of the final mask
//! - **Rasterization**: fills a stored contour back into a mask
//!
//! `segment` chains the first two steps; `mask_to_contour` turns its
//! output into the polygon the caller persists.

pub mod contour;
pub mod holes;
pub mod rasterize;
pub mod region_grow;

use ndarray::ArrayView3;

use crate::buffer::{Connectivity, Mask};
use crate::error::Result;

pub use contour::{mask_to_contour, trace_boundaries, Contour, Point};
pub use holes::fill_holes;
pub use rasterize::contour_to_mask;
pub use region_grow::{grow_region, grow_region_detailed, RegionGrowResult, SeedPoint};

/// Segment the region around `seed`: 8-connected region growing followed by
/// hole filling.
pub fn segment(image: ArrayView3<u8>, seed: SeedPoint, tolerance: u32) -> Result<Mask> {
    let grown = grow_region(image, seed, tolerance, Connectivity::Eight)?;
    Ok(fill_holes(grown.view()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    pub(crate) const FIXTURE_IMAGE: [[u8; 6]; 6] = [
        [128, 128, 0, 0, 0, 0],
        [128, 128, 128, 128, 0, 0],
        [0, 128, 0, 128, 128, 128],
        [0, 128, 128, 128, 0, 0],
        [0, 0, 128, 0, 0, 128],
        [0, 0, 0, 128, 0, 128],
    ];

    pub(crate) const FIXTURE_MASK_8: [[u8; 6]; 6] = [
        [255, 255, 0, 0, 0, 0],
        [255, 255, 255, 255, 0, 0],
        [0, 255, 0, 255, 255, 255],
        [0, 255, 255, 255, 0, 0],
        [0, 0, 255, 0, 0, 0],
        [0, 0, 0, 255, 0, 0],
    ];

    pub(crate) fn fixture_image() -> Array3<u8> {
        Array3::from_shape_vec((6, 6, 1), FIXTURE_IMAGE.concat()).unwrap()
    }

    #[test]
    fn test_segment_fills_enclosed_gap() {
        let image = fixture_image();
        let grown =
            grow_region(image.view(), SeedPoint::new(1, 1), 5, Connectivity::Eight).unwrap();
        let mask = segment(image.view(), SeedPoint::new(1, 1), 5).unwrap();

        let mut expected = Array2::from_shape_vec((6, 6), FIXTURE_MASK_8.concat()).unwrap();
        expected[[2, 2]] = 255;
        assert_eq!(mask, expected);

        let added = mask.iter().filter(|&&v| v == 255).count()
            - grown.iter().filter(|&&v| v == 255).count();
        assert_eq!(added, 1);
    }

    #[test]
    fn test_segment_then_trace_round_trips() {
        let image = fixture_image();
        let mask = segment(image.view(), SeedPoint::new(1, 1), 5).unwrap();
        let contour = mask_to_contour(mask.view());

        assert_eq!(contour.points.first(), contour.points.last());
        assert_eq!(contour_to_mask(mask.dim(), &contour).unwrap(), mask);
    }
}
