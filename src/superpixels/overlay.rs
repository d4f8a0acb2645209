//! Per-superpixel annotation values rendered back onto pixels.

use ndarray::{Array2, ArrayView2};

use crate::buffer::{Mask, BACKGROUND, FOREGROUND};
use crate::error::{Result, SegmentationError};

fn scatter<T, F>(labels: ArrayView2<u32>, values: &[f32], map: F) -> Result<Array2<T>>
where
    F: Fn(f32) -> T,
{
    let pixels = labels
        .iter()
        .map(|&label| {
            values
                .get(label as usize)
                .map(|&v| map(v))
                .ok_or(SegmentationError::LabelOutOfRange {
                    label,
                    len: values.len(),
                })
        })
        .collect::<Result<Vec<T>>>()?;
    Ok(Array2::from_shape_vec(labels.dim(), pixels)?)
}

/// Grayscale overlay: each pixel gets `round(clamp(value, 0, 1) * 255)` of
/// its label.
pub fn overlay_intensity(labels: ArrayView2<u32>, values: &[f32]) -> Result<Array2<u8>> {
    scatter(labels, values, |v| {
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        (v * 255.0).round() as u8
    })
}

/// Binary overlay of the superpixels whose value reaches `threshold`.
pub fn overlay_mask(labels: ArrayView2<u32>, values: &[f32], threshold: f32) -> Result<Mask> {
    scatter(labels, values, |v| {
        if v >= threshold {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mask_selects_labels_at_threshold() {
        let labels = array![[0u32, 0, 1], [2, 2, 1]];
        let values = [0.0, 0.5, 1.0];
        let mask = overlay_mask(labels.view(), &values, 0.5).unwrap();
        assert_eq!(mask, array![[0u8, 0, 255], [255, 255, 255]]);
    }

    #[test]
    fn test_intensity_scales_and_clamps() {
        let labels = array![[0u32, 1, 2, 3]];
        let values = [0.0, 0.5, 2.0, -1.0];
        let out = overlay_intensity(labels.view(), &values).unwrap();
        assert_eq!(out, array![[0u8, 128, 255, 0]]);
    }

    #[test]
    fn test_missing_value_is_an_error() {
        let labels = array![[0u32, 3]];
        let err = overlay_mask(labels.view(), &[1.0, 1.0], 0.5).unwrap_err();
        assert!(matches!(err, SegmentationError::LabelOutOfRange { label: 3, len: 2 }));
    }
}
