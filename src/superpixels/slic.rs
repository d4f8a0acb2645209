//! SLIC superpixel over-segmentation.
//!
//! The steps are:
//! - seed cluster centers on a regular grid of step `S = sqrt(N / k)`
//! - N iterations of
//!     - assign every pixel to the closest center within `2S`
//!     - move every center to the mean of its members
//! - merge fragments below the minimum size into a neighbor (see
//!   [`connectivity`](super::connectivity))
//!
//! Distance is `d_lab² + (compactness / S)² · d_xy²`. The default
//! compactness is low, so color dominates and regions follow lesion borders
//! closely.

use std::ops::Range;

use log::debug;
use ndarray::{Array2, ArrayView2, ArrayView3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::cielab::lab_features;
use super::connectivity::enforce_connectivity;
use super::encoding::MAX_LABEL;
use crate::buffer::check_channels;
use crate::error::{Result, SegmentationError};

/// Label of pixels outside the partitioned region.
pub(crate) const UNLABELED: u32 = u32::MAX;

/// Superpixel parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicConfig {
    /// Approximate number of superpixels.
    pub num_segments: usize,
    /// Weight of spatial distance against color distance.
    pub compactness: f32,
    /// Assign/update rounds.
    pub max_iterations: usize,
    /// Minimum region size as a fraction of the mean region size `N / k`.
    pub min_size_factor: f32,
}

impl Default for SlicConfig {
    fn default() -> Self {
        Self {
            num_segments: 1000,
            compactness: 0.01,
            max_iterations: 10,
            min_size_factor: 0.5,
        }
    }
}

impl SlicConfig {
    fn validate(&self) -> Result<()> {
        if self.num_segments == 0 {
            return Err(SegmentationError::InvalidParameter(
                "num_segments must be positive".into(),
            ));
        }
        if !(self.compactness.is_finite() && self.compactness >= 0.0) {
            return Err(SegmentationError::InvalidParameter(format!(
                "compactness must be a non-negative number, got {}",
                self.compactness
            )));
        }
        if !(self.min_size_factor.is_finite() && self.min_size_factor >= 0.0) {
            return Err(SegmentationError::InvalidParameter(format!(
                "min_size_factor must be a non-negative number, got {}",
                self.min_size_factor
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct Center {
    row: f32,
    col: f32,
    lab: [f32; 3],
}

/// Partition an image into roughly `target_count` superpixels.
///
/// # Arguments
/// * `image` - Image with 1 or 3 channels (height, width, channels)
/// * `target_count` - Approximate number of superpixels
///
/// # Returns
/// One label per pixel, numbered densely from 0 in raster order.
pub fn partition(image: ArrayView3<u8>, target_count: usize) -> Result<Array2<u32>> {
    let config = SlicConfig {
        num_segments: target_count,
        ..SlicConfig::default()
    };
    partition_with_config(image, &config)
}

/// Partition an image with explicit parameters.
pub fn partition_with_config(image: ArrayView3<u8>, config: &SlicConfig) -> Result<Array2<u32>> {
    let (height, width, _) = image.dim();
    if height == 0 || width == 0 {
        return Err(SegmentationError::InvalidParameter("image is empty".into()));
    }
    let (labels, _) = partition_region(image, None, config)?;
    Ok(labels)
}

/// Partition the pixels where `region` is true (all pixels for `None`).
///
/// Pixels outside the region get [`UNLABELED`]. Returns the labels and the
/// number of distinct labels.
pub(crate) fn partition_region(
    image: ArrayView3<u8>,
    region: Option<ArrayView2<bool>>,
    config: &SlicConfig,
) -> Result<(Array2<u32>, u32)> {
    check_channels(&image)?;
    config.validate()?;
    let (height, width, _) = image.dim();
    if let Some(region) = &region {
        if region.dim() != (height, width) {
            return Err(SegmentationError::InvalidParameter(format!(
                "region shape {:?} does not match image shape {:?}",
                region.dim(),
                (height, width)
            )));
        }
    }

    let included: Vec<bool> = match &region {
        Some(region) => region.iter().copied().collect(),
        None => vec![true; height * width],
    };
    let area = included.iter().filter(|&&inside| inside).count();
    if area == 0 {
        return Ok((Array2::from_elem((height, width), UNLABELED), 0));
    }

    let features = lab_features(&image);
    let step = ((area as f32 / config.num_segments as f32).sqrt()).max(1.0);
    let mut centers = initial_centers(&features, &included, height, width, step);

    let spatial_weight = (config.compactness / step).powi(2);
    let radius = 2.0 * step;
    let mut labels = vec![UNLABELED; height * width];

    for _ in 0..config.max_iterations {
        assign(
            &features,
            &included,
            &centers,
            width,
            radius,
            spatial_weight,
            &mut labels,
        );
        update(&features, &labels, width, &mut centers);
    }
    assign(
        &features,
        &included,
        &centers,
        width,
        radius,
        spatial_weight,
        &mut labels,
    );

    let mut labels = Array2::from_shape_vec((height, width), labels)?;
    let mean_size = area as f32 / config.num_segments as f32;
    let min_size = ((config.min_size_factor * mean_size).round() as usize).clamp(1, area);
    let count = enforce_connectivity(&mut labels, min_size);

    if count > MAX_LABEL + 1 {
        return Err(SegmentationError::LabelOverflow(count - 1));
    }

    debug!(
        "slic: {} centers, step {step:.2}, {} iterations, {count} regions (min size {min_size})",
        centers.len(),
        config.max_iterations
    );

    Ok((labels, count))
}

/// Centers at the cells of a regular grid over the region's bounding box.
fn initial_centers(
    features: &[[f32; 3]],
    included: &[bool],
    height: usize,
    width: usize,
    step: f32,
) -> Vec<Center> {
    let (mut min_row, mut max_row, mut min_col, mut max_col) = (height, 0, width, 0);
    for (index, _) in included.iter().enumerate().filter(|(_, &inside)| inside) {
        let (row, col) = (index / width, index % width);
        min_row = min_row.min(row);
        max_row = max_row.max(row);
        min_col = min_col.min(col);
        max_col = max_col.max(col);
    }
    let box_height = (max_row - min_row + 1) as f32;
    let box_width = (max_col - min_col + 1) as f32;
    let ny = ((box_height / step).round() as usize).max(1);
    let nx = ((box_width / step).round() as usize).max(1);

    let mut centers = Vec::with_capacity(ny * nx);
    for i in 0..ny {
        for j in 0..nx {
            let row = min_row + ((i as f32 + 0.5) * box_height / ny as f32) as usize;
            let col = min_col + ((j as f32 + 0.5) * box_width / nx as f32) as usize;
            let index = row * width + col;
            if included[index] {
                centers.push(Center {
                    row: row as f32,
                    col: col as f32,
                    lab: features[index],
                });
            }
        }
    }

    if centers.is_empty() {
        // Thin or ragged region missed by every grid point
        if let Some(index) = included.iter().position(|&inside| inside) {
            centers.push(Center {
                row: (index / width) as f32,
                col: (index % width) as f32,
                lab: features[index],
            });
        }
    }

    centers
}

/// Rows and columns within `radius` of a center, clipped to the image.
fn search_window(
    center: &Center,
    radius: f32,
    height: usize,
    width: usize,
) -> (Range<usize>, Range<usize>) {
    let span = |middle: f32, len: usize| {
        let start = (middle - radius).ceil().max(0.0) as usize;
        let end = ((middle + radius).floor() + 1.0).max(0.0) as usize;
        start.min(len)..end.min(len)
    };
    (span(center.row, height), span(center.col, width))
}

/// Label every included pixel with its closest center. Rows run in parallel
/// and each center only visits its own window; ties go to the lower center
/// index.
fn assign(
    features: &[[f32; 3]],
    included: &[bool],
    centers: &[Center],
    width: usize,
    radius: f32,
    spatial_weight: f32,
    labels: &mut [u32],
) {
    let height = labels.len() / width;
    let windows: Vec<(Range<usize>, Range<usize>)> = centers
        .iter()
        .map(|center| search_window(center, radius, height, width))
        .collect();

    labels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out)| {
            let y = row as f32;
            let mut best_distance = vec![f32::INFINITY; width];
            out.fill(UNLABELED);

            for (k, (center, (rows, cols))) in centers.iter().zip(&windows).enumerate() {
                if !rows.contains(&row) {
                    continue;
                }
                let dy = y - center.row;
                for col in cols.clone() {
                    let index = row * width + col;
                    if !included[index] {
                        continue;
                    }
                    let lab = features[index];
                    let dl = lab[0] - center.lab[0];
                    let da = lab[1] - center.lab[1];
                    let db = lab[2] - center.lab[2];
                    let dx = col as f32 - center.col;
                    let distance =
                        dl * dl + da * da + db * db + spatial_weight * (dx * dx + dy * dy);
                    if distance < best_distance[col] {
                        best_distance[col] = distance;
                        out[col] = k as u32;
                    }
                }
            }

            for (col, label) in out.iter_mut().enumerate() {
                if included[row * width + col] && *label == UNLABELED {
                    *label = nearest_center(centers, y, col as f32);
                }
            }
        });
}

/// Spatially closest center, for pixels no search window reaches.
fn nearest_center(centers: &[Center], y: f32, x: f32) -> u32 {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (k, center) in centers.iter().enumerate() {
        let distance = (center.row - y).powi(2) + (center.col - x).powi(2);
        if distance < best_distance {
            best_distance = distance;
            best = k as u32;
        }
    }
    best
}

/// Move every center to the mean position and color of its members.
/// Centers without members stay where they are.
fn update(features: &[[f32; 3]], labels: &[u32], width: usize, centers: &mut [Center]) {
    let mut sums = vec![[0f64; 5]; centers.len()];
    let mut counts = vec![0u64; centers.len()];

    for (index, &label) in labels.iter().enumerate() {
        if label == UNLABELED {
            continue;
        }
        let k = label as usize;
        let lab = features[index];
        let acc = &mut sums[k];
        acc[0] += (index / width) as f64;
        acc[1] += (index % width) as f64;
        acc[2] += lab[0] as f64;
        acc[3] += lab[1] as f64;
        acc[4] += lab[2] as f64;
        counts[k] += 1;
    }

    for ((center, acc), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
        if count == 0 {
            continue;
        }
        let n = count as f64;
        center.row = (acc[0] / n) as f32;
        center.col = (acc[1] / n) as f32;
        center.lab = [
            (acc[2] / n) as f32,
            (acc[3] / n) as f32,
            (acc[4] / n) as f32,
        ];
    }
}
