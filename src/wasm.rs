//! WebAssembly exports for the LesionStag segmentation path.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Images travel
//! as flat row-major byte arrays, contours as flat `[x0, y0, x1, y1, ...]`
//! float arrays. Errors surface as thrown strings.

use ndarray::{Array2, Array3};
use wasm_bindgen::prelude::*;

use crate::buffer::{ensure_single_component, normalize_mask, Connectivity};
use crate::error::SegmentationError;
use crate::segmentation::{self, Contour, Point, SeedPoint};
use crate::superpixels::{self, encoding};

impl From<SegmentationError> for JsValue {
    fn from(err: SegmentationError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn image_from(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
) -> Result<Array3<u8>, JsValue> {
    Ok(Array3::from_shape_vec((height, width, channels), data.to_vec())
        .map_err(SegmentationError::from)?)
}

fn mask_from(data: &[u8], width: usize, height: usize) -> Result<Array2<u8>, JsValue> {
    let mask = Array2::from_shape_vec((height, width), data.to_vec())
        .map_err(SegmentationError::from)?;
    Ok(normalize_mask(mask.view())?)
}

// ============================================================================
// Segmentation
// ============================================================================

/// Grow a region from `(x, y)` and fill its holes.
///
/// # Arguments
/// * `data` - Flat array of pixel bytes (length = width * height * channels)
/// * `channels` - 1 (grayscale) or 3 (RGB)
///
/// # Returns
/// Flat mask of 0/255 bytes (length = width * height)
#[wasm_bindgen]
pub fn segment_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    x: i64,
    y: i64,
    tolerance: u32,
) -> Result<Vec<u8>, JsValue> {
    let image = image_from(data, width, height, channels)?;
    let mask = segmentation::segment(image.view(), SeedPoint::new(x, y), tolerance)?;
    Ok(mask.into_raw_vec_and_offset().0)
}

/// Flood fill without hole filling. `connectivity` is 4 or 8.
#[wasm_bindgen]
pub fn grow_region_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    x: i64,
    y: i64,
    tolerance: u32,
    connectivity: u8,
) -> Result<Vec<u8>, JsValue> {
    let connectivity = match connectivity {
        4 => Connectivity::Four,
        8 => Connectivity::Eight,
        other => {
            return Err(JsValue::from_str(&format!(
                "connectivity must be 4 or 8, got {other}"
            )))
        }
    };
    let image = image_from(data, width, height, channels)?;
    let seed = SeedPoint::new(x, y);
    let mask = segmentation::grow_region(image.view(), seed, tolerance, connectivity)?;
    Ok(mask.into_raw_vec_and_offset().0)
}

/// Outer boundary of a single-component mask as `[x0, y0, x1, y1, ...]`.
#[wasm_bindgen]
pub fn mask_to_contour_wasm(
    mask: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<f64>, JsValue> {
    let mask = mask_from(mask, width, height)?;
    ensure_single_component(mask.view(), Connectivity::Eight)?;
    let contour = segmentation::mask_to_contour(mask.view());
    Ok(contour.points.iter().flat_map(|p| [p.x, p.y]).collect())
}

/// Even-odd fill of a flat `[x0, y0, x1, y1, ...]` polygon.
#[wasm_bindgen]
pub fn contour_to_mask_wasm(
    points: &[f64],
    width: usize,
    height: usize,
) -> Result<Vec<u8>, JsValue> {
    if points.len() % 2 != 0 {
        return Err(SegmentationError::InvalidGeometry(
            "coordinate array has odd length".into(),
        )
        .into());
    }
    let contour = Contour {
        points: points
            .chunks_exact(2)
            .map(|xy| Point::new(xy[0], xy[1]))
            .collect(),
    };
    let mask = segmentation::contour_to_mask((height, width), &contour)?;
    Ok(mask.into_raw_vec_and_offset().0)
}

// ============================================================================
// Superpixels
// ============================================================================

/// SLIC superpixels, returned in the 3-channel storage encoding.
#[wasm_bindgen]
pub fn superpixels_encoded_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    num_segments: usize,
) -> Result<Vec<u8>, JsValue> {
    let image = image_from(data, width, height, channels)?;
    let labels = superpixels::partition(image.view(), num_segments)?;
    let encoded = encoding::encode_labels(labels.view())?;
    Ok(encoded.into_raw_vec_and_offset().0)
}

/// Decode a flat 3-channel label image into one label per pixel.
#[wasm_bindgen]
pub fn decode_superpixels_wasm(
    data: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<u32>, JsValue> {
    let image = image_from(data, width, height, 3)?;
    let labels = encoding::decode_labels(image.view())?;
    Ok(labels.into_raw_vec_and_offset().0)
}
