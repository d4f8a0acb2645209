//! PNG persistence of masks and superpixel labelings.
//!
//! Masks are stored as 8-bit grayscale, labelings as 8-bit RGB through
//! [`encode_labels`]. Both are lossless, so a decoded labeling is identical
//! to the encoded one.

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use ndarray::{Array2, Array3, ArrayView2};

use crate::buffer::{normalize_mask, Mask};
use crate::error::{Result, SegmentationError};
use crate::superpixels::encoding::{decode_labels, encode_labels};

fn dimensions(height: usize, width: usize) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(SegmentationError::InvalidParameter(format!(
            "{width}x{height} is too large for PNG"
        ))),
    }
}

fn write_png(
    pixels: &[u8],
    height: usize,
    width: usize,
    color: ExtendedColorType,
) -> Result<Vec<u8>> {
    let (w, h) = dimensions(height, width)?;
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(pixels, w, h, color)?;
    Ok(bytes)
}

/// Encode a mask as a grayscale PNG.
pub fn encode_mask_png(mask: ArrayView2<u8>) -> Result<Vec<u8>> {
    let (height, width) = mask.dim();
    let pixels: Vec<u8> = mask.iter().copied().collect();
    write_png(&pixels, height, width, ExtendedColorType::L8)
}

/// Decode a grayscale PNG mask, snapping it to {0, 255}.
pub fn decode_mask_png(bytes: &[u8]) -> Result<Mask> {
    match image::load_from_memory_with_format(bytes, ImageFormat::Png)? {
        DynamicImage::ImageLuma8(buffer) => {
            let (width, height) = buffer.dimensions();
            let mask =
                Array2::from_shape_vec((height as usize, width as usize), buffer.into_raw())?;
            normalize_mask(mask.view())
        }
        other => Err(SegmentationError::InvalidMaskFormat(format!(
            "expected 8-bit grayscale PNG, got {:?}",
            other.color()
        ))),
    }
}

/// Encode a labeling as an RGB PNG.
pub fn encode_labels_png(labels: ArrayView2<u32>) -> Result<Vec<u8>> {
    let (height, width) = labels.dim();
    let encoded = encode_labels(labels)?;
    let pixels: Vec<u8> = encoded.iter().copied().collect();
    write_png(&pixels, height, width, ExtendedColorType::Rgb8)
}

/// Decode an RGB PNG labeling.
pub fn decode_labels_png(bytes: &[u8]) -> Result<Array2<u32>> {
    match image::load_from_memory_with_format(bytes, ImageFormat::Png)? {
        DynamicImage::ImageRgb8(buffer) => {
            let (width, height) = buffer.dimensions();
            let encoded =
                Array3::from_shape_vec((height as usize, width as usize, 3), buffer.into_raw())?;
            decode_labels(encoded.view())
        }
        other => Err(SegmentationError::UnsupportedChannels(
            other.color().channel_count() as usize,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mask_png_round_trip() {
        let mask = array![[0u8, 255, 255], [255, 0, 0]];
        let bytes = encode_mask_png(mask.view()).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_mask_png(&bytes).unwrap(), mask);
    }

    #[test]
    fn test_mask_png_is_normalized() {
        let mask = array![[0u8, 1], [1, 1]];
        let bytes = encode_mask_png(mask.view()).unwrap();
        assert_eq!(decode_mask_png(&bytes).unwrap(), array![[0u8, 255], [255, 255]]);
    }

    #[test]
    fn test_full_foreground_mask_survives() {
        let mask = Array2::from_elem((4, 5), 255u8);
        let bytes = encode_mask_png(mask.view()).unwrap();
        assert_eq!(decode_mask_png(&bytes).unwrap(), mask);
    }

    #[test]
    fn test_labels_png_round_trip() {
        let labels = array![[0u32, 1, 70_000], [16_777_215, 256, 3]];
        let bytes = encode_labels_png(labels.view()).unwrap();
        assert_eq!(decode_labels_png(&bytes).unwrap(), labels);
    }

    #[test]
    fn test_wrong_color_types() {
        let mask = array![[0u8, 255]];
        let gray = encode_mask_png(mask.view()).unwrap();
        assert!(matches!(
            decode_labels_png(&gray),
            Err(SegmentationError::UnsupportedChannels(1))
        ));

        let labels = array![[0u32, 5]];
        let rgb = encode_labels_png(labels.view()).unwrap();
        assert!(matches!(
            decode_mask_png(&rgb),
            Err(SegmentationError::InvalidMaskFormat(_))
        ));
    }

    #[test]
    fn test_garbage_is_an_image_error() {
        assert!(matches!(
            decode_mask_png(b"not a png"),
            Err(SegmentationError::Image(_))
        ));
    }
}
