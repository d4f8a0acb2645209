//! Pixel buffer conventions and mask utilities.
//!
//! ## Buffer Layout
//!
//! | Buffer | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | Image | (H, W, 1) | u8 | Single intensity channel |
//! | Image | (H, W, 3) | u8 | Non-premultiplied color |
//! | Mask | (H, W) | u8 | 0 = background, 255 = foreground |
//! | Labels | (H, W) | u32 | Superpixel label per pixel |
//!
//! Arrays are indexed `[[row, col]]`. Public seed and contour coordinates use
//! `(x, y)` = `(col, row)`, so the order flips at the API edge.

use std::collections::VecDeque;

use log::warn;
use ndarray::{s, Array2, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentationError};

/// Mask value for selected pixels.
pub const FOREGROUND: u8 = 255;
/// Mask value for unselected pixels.
pub const BACKGROUND: u8 = 0;

/// Binary mask, one byte per pixel, values in {0, 255}.
pub type Mask = Array2<u8>;

/// Which neighbors of a pixel count as adjacent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// N, S, E and W neighbors.
    Four,
    /// All eight neighbors, diagonals included.
    #[default]
    Eight,
}

const FOUR_NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const EIGHT_NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Connectivity {
    /// Neighbor offsets as `(d_row, d_col)`.
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &FOUR_NEIGHBORS,
            Connectivity::Eight => &EIGHT_NEIGHBORS,
        }
    }
}

/// In-bounds neighbors of `(row, col)` for the given connectivity.
#[inline]
pub(crate) fn neighbors(
    row: usize,
    col: usize,
    height: usize,
    width: usize,
    connectivity: Connectivity,
) -> impl Iterator<Item = (usize, usize)> {
    connectivity.offsets().iter().filter_map(move |&(dr, dc)| {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < height && c < width).then_some((r, c))
    })
}

/// Reject images that are not 1- or 3-channel.
pub(crate) fn check_channels(image: &ArrayView3<u8>) -> Result<usize> {
    match image.dim().2 {
        c @ (1 | 3) => Ok(c),
        c => Err(SegmentationError::UnsupportedChannels(c)),
    }
}

/// Surround a mask with a one-pixel border of `fill`.
pub(crate) fn pad(mask: ArrayView2<u8>, fill: u8) -> Array2<u8> {
    let (height, width) = mask.dim();
    let mut padded = Array2::from_elem((height + 2, width + 2), fill);
    padded
        .slice_mut(s![1..height + 1, 1..width + 1])
        .assign(&mask);
    padded
}

/// Interpret a decoded single-channel image as a mask.
///
/// The values are not checked; run [`normalize_mask`] afterwards for
/// externally supplied data.
pub fn mask_from_image(image: ArrayView3<u8>) -> Result<Mask> {
    let channels = image.dim().2;
    if channels != 1 {
        return Err(SegmentationError::InvalidMaskFormat(format!(
            "expected a single channel, got {channels}"
        )));
    }
    Ok(image.index_axis(Axis(2), 0).to_owned())
}

/// Snap a mask to {0, 255}.
///
/// - already within {0, 255}: returned unchanged
/// - one other distinct value: cleared to background
/// - two distinct values: lower becomes 0, higher becomes 255
/// - more than two: rejected
pub fn normalize_mask(mask: ArrayView2<u8>) -> Result<Mask> {
    let mut seen = [false; 256];
    for &v in mask.iter() {
        seen[v as usize] = true;
    }
    let values: Vec<u8> = (0..=255u8).filter(|&v| seen[v as usize]).collect();

    match values.as_slice() {
        [] => Ok(mask.to_owned()),
        [BACKGROUND] | [FOREGROUND] => Ok(mask.to_owned()),
        [single] => {
            warn!("mask holds the single value {single}, clearing to background");
            Ok(Array2::from_elem(mask.dim(), BACKGROUND))
        }
        &[low, high] => {
            if low != BACKGROUND || high != FOREGROUND {
                warn!("snapping two-valued mask ({low}, {high}) to (0, 255)");
            }
            Ok(mask.mapv(|v| if v == high { FOREGROUND } else { BACKGROUND }))
        }
        _ => Err(SegmentationError::InvalidMaskFormat(format!(
            "mask has {} distinct values, expected at most 2",
            values.len()
        ))),
    }
}

/// Number of connected foreground components in a mask.
pub fn count_components(mask: ArrayView2<u8>, connectivity: Connectivity) -> usize {
    let (height, width) = mask.dim();
    let mut visited = Array2::from_elem((height, width), false);
    let mut queue = VecDeque::new();
    let mut count = 0;

    for ((row, col), &v) in mask.indexed_iter() {
        if v == BACKGROUND || visited[[row, col]] {
            continue;
        }
        count += 1;
        visited[[row, col]] = true;
        queue.push_back((row, col));
        while let Some((r, c)) = queue.pop_front() {
            for (nr, nc) in neighbors(r, c, height, width, connectivity) {
                if mask[[nr, nc]] != BACKGROUND && !visited[[nr, nc]] {
                    visited[[nr, nc]] = true;
                    queue.push_back((nr, nc));
                }
            }
        }
    }

    count
}

/// Require an externally supplied mask to hold exactly one foreground blob.
///
/// An empty mask passes; the contour tracer reports it as an empty contour.
pub fn ensure_single_component(mask: ArrayView2<u8>, connectivity: Connectivity) -> Result<()> {
    match count_components(mask, connectivity) {
        0 | 1 => Ok(()),
        count => Err(SegmentationError::MultipleDisconnectedComponents { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_normalize_single_value_clears() {
        let mask = Array2::from_elem((3, 3), 7u8);
        let out = normalize_mask(mask.view()).unwrap();
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_normalize_keeps_binary_single_value() {
        let full = Array2::from_elem((4, 5), 255u8);
        assert_eq!(normalize_mask(full.view()).unwrap(), full);

        let empty = Array2::<u8>::zeros((4, 5));
        assert_eq!(normalize_mask(empty.view()).unwrap(), empty);
    }

    #[test]
    fn test_normalize_two_values_snaps() {
        let mask = array![[0u8, 1], [1, 0]];
        let out = normalize_mask(mask.view()).unwrap();
        assert_eq!(out, array![[0u8, 255], [255, 0]]);

        let mask = array![[10u8, 200], [200, 10]];
        let out = normalize_mask(mask.view()).unwrap();
        assert_eq!(out, array![[0u8, 255], [255, 0]]);
    }

    #[test]
    fn test_normalize_rejects_three_values() {
        let mask = array![[0u8, 128, 255]];
        assert!(matches!(
            normalize_mask(mask.view()),
            Err(SegmentationError::InvalidMaskFormat(_))
        ));
    }

    #[test]
    fn test_mask_from_image_requires_one_channel() {
        let rgb = Array3::<u8>::zeros((2, 2, 3));
        assert!(mask_from_image(rgb.view()).is_err());

        let mut gray = Array3::<u8>::zeros((2, 3, 1));
        gray[[1, 2, 0]] = 255;
        let mask = mask_from_image(gray.view()).unwrap();
        assert_eq!(mask.dim(), (2, 3));
        assert_eq!(mask[[1, 2]], 255);
    }

    #[test]
    fn test_components_depend_on_connectivity() {
        let mask = array![[255u8, 0], [0, 255]];
        assert_eq!(count_components(mask.view(), Connectivity::Eight), 1);
        assert_eq!(count_components(mask.view(), Connectivity::Four), 2);
        assert!(ensure_single_component(mask.view(), Connectivity::Eight).is_ok());
        assert!(matches!(
            ensure_single_component(mask.view(), Connectivity::Four),
            Err(SegmentationError::MultipleDisconnectedComponents { count: 2 })
        ));
    }

    #[test]
    fn test_pad_adds_border() {
        let mask = array![[255u8]];
        let padded = pad(mask.view(), 0);
        assert_eq!(padded.dim(), (3, 3));
        assert_eq!(padded[[1, 1]], 255);
        assert_eq!(padded.sum(), 255);
    }
}
