//! Contour-biased superpixels: dense inside a lesion boundary, coarse outside.
//!
//! Both sides are partitioned independently and then folded into one label
//! space. The fold is a single raster-order pass over a local
//! `(side, local label) -> global label` map, which is returned to the caller.

use std::collections::HashMap;

use log::debug;
use ndarray::{Array2, ArrayView3};
use serde::{Deserialize, Serialize};

use super::slic::{partition_region, SlicConfig, UNLABELED};
use crate::buffer::FOREGROUND;
use crate::error::{Result, SegmentationError};
use crate::segmentation::{contour_to_mask, Contour};

/// Which side of the contour a label came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Inside,
    Outside,
}

/// One entry of the local-to-global label map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relabel {
    pub side: Side,
    pub local: u32,
    pub global: u32,
}

/// Parameters for [`partition_with_contour`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasedConfig {
    /// Superpixels requested inside the contour.
    pub inside_segments: usize,
    /// Superpixels requested outside the contour.
    pub outside_segments: usize,
    /// Shared clustering parameters; `num_segments` is ignored.
    pub slic: SlicConfig,
}

impl Default for BiasedConfig {
    fn default() -> Self {
        Self {
            inside_segments: 200,
            outside_segments: 50,
            slic: SlicConfig::default(),
        }
    }
}

/// Labels plus the map that produced them.
#[derive(Clone, Debug)]
pub struct BiasedPartition {
    pub labels: Array2<u32>,
    /// Entries in order of global label.
    pub relabel: Vec<Relabel>,
}

impl BiasedPartition {
    pub fn count(&self, side: Side) -> usize {
        self.relabel.iter().filter(|r| r.side == side).count()
    }
}

/// Partition inside and outside of `contour` with separate densities.
pub fn partition_with_contour(
    image: ArrayView3<u8>,
    contour: &Contour,
    config: &BiasedConfig,
) -> Result<BiasedPartition> {
    let (height, width, _) = image.dim();
    if height == 0 || width == 0 {
        return Err(SegmentationError::InvalidParameter("image is empty".into()));
    }

    let inside = contour_to_mask((height, width), contour)?.mapv(|v| v == FOREGROUND);
    let outside = inside.mapv(|v| !v);

    let side_config = |num_segments| SlicConfig {
        num_segments,
        ..config.slic.clone()
    };
    let (inside_labels, _) =
        partition_region(image, Some(inside.view()), &side_config(config.inside_segments))?;
    let (outside_labels, _) =
        partition_region(image, Some(outside.view()), &side_config(config.outside_segments))?;

    let partition = relabel(&inside, &inside_labels, &outside_labels);
    debug!(
        "biased partition: {} inside, {} outside regions",
        partition.count(Side::Inside),
        partition.count(Side::Outside)
    );
    Ok(partition)
}

/// Merge two disjoint local label maps into one global label space.
fn relabel(
    inside: &Array2<bool>,
    inside_labels: &Array2<u32>,
    outside_labels: &Array2<u32>,
) -> BiasedPartition {
    let mut map: HashMap<(Side, u32), u32> = HashMap::new();
    let mut entries = Vec::new();
    let mut labels = Array2::from_elem(inside.dim(), UNLABELED);

    for ((index, &is_inside), label) in inside.indexed_iter().zip(labels.iter_mut()) {
        let (side, local) = if is_inside {
            (Side::Inside, inside_labels[index])
        } else {
            (Side::Outside, outside_labels[index])
        };
        let next = entries.len() as u32;
        let global = *map.entry((side, local)).or_insert_with(|| {
            entries.push(Relabel {
                side,
                local,
                global: next,
            });
            next
        });
        *label = global;
    }

    BiasedPartition {
        labels,
        relabel: entries,
    }
}
