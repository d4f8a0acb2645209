//! Lossless storage of superpixel labels in a 3-channel 8-bit image.
//!
//! Each label is split little-endian across the channels:
//! `[label & 0xFF, (label >> 8) & 0xFF, (label >> 16) & 0xFF]`.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Zip};

use crate::error::{Result, SegmentationError};

/// Largest label that fits in three bytes.
pub const MAX_LABEL: u32 = (1 << 24) - 1;

/// Split a label into three bytes, least significant first.
#[inline]
pub fn encode_label(label: u32) -> Result<[u8; 3]> {
    if label > MAX_LABEL {
        return Err(SegmentationError::LabelOverflow(label));
    }
    let [b0, b1, b2, _] = label.to_le_bytes();
    Ok([b0, b1, b2])
}

/// Inverse of [`encode_label`].
#[inline]
pub fn decode_label(bytes: [u8; 3]) -> u32 {
    u32::from(bytes[0]) | (u32::from(bytes[1]) << 8) | (u32::from(bytes[2]) << 16)
}

/// Encode a label map as an (H, W, 3) image.
pub fn encode_labels(labels: ArrayView2<u32>) -> Result<Array3<u8>> {
    let (height, width) = labels.dim();
    let mut encoded = Array3::<u8>::zeros((height, width, 3));
    for ((row, col), &label) in labels.indexed_iter() {
        let bytes = encode_label(label)?;
        for (c, byte) in bytes.into_iter().enumerate() {
            encoded[[row, col, c]] = byte;
        }
    }
    Ok(encoded)
}

/// Decode an (H, W, 3) image back into labels.
pub fn decode_labels(image: ArrayView3<u8>) -> Result<Array2<u32>> {
    let (height, width, channels) = image.dim();
    if channels != 3 {
        return Err(SegmentationError::UnsupportedChannels(channels));
    }
    let mut labels = Array2::<u32>::zeros((height, width));
    Zip::from(&mut labels)
        .and(image.lanes(ndarray::Axis(2)))
        .for_each(|label, pixel| *label = decode_label([pixel[0], pixel[1], pixel[2]]));
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_byte_order() {
        assert_eq!(encode_label(0x0A0B0C).unwrap(), [0x0C, 0x0B, 0x0A]);
        assert_eq!(decode_label([0x0C, 0x0B, 0x0A]), 0x0A0B0C);
    }

    #[test]
    fn test_full_range_bijection() {
        // Boundaries of every byte plus a coprime stride through the range
        let edges = [0u32, 1, 0xFF, 0x100, 0xFFFF, 0x10000, MAX_LABEL - 1, MAX_LABEL];
        let stride = (0..=MAX_LABEL).step_by(4093);
        for label in edges.into_iter().chain(stride) {
            assert_eq!(decode_label(encode_label(label).unwrap()), label);
        }
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(matches!(
            encode_label(MAX_LABEL + 1),
            Err(SegmentationError::LabelOverflow(0x0100_0000))
        ));
        let labels = array![[0u32, 1 << 24]];
        assert!(encode_labels(labels.view()).is_err());
    }

    #[test]
    fn test_label_map_layout() {
        let labels = array![[0u32, 256], [65_536 + 2, MAX_LABEL]];
        let encoded = encode_labels(labels.view()).unwrap();
        assert_eq!(encoded.dim(), (2, 2, 3));
        assert_eq!(encoded.slice(ndarray::s![0, 1, ..]).to_vec(), vec![0, 1, 0]);
        assert_eq!(encoded.slice(ndarray::s![1, 0, ..]).to_vec(), vec![2, 0, 1]);
        assert_eq!(decode_labels(encoded.view()).unwrap(), labels);
    }

    #[test]
    fn test_decode_requires_three_channels() {
        let image = Array3::<u8>::zeros((2, 2, 1));
        assert!(matches!(
            decode_labels(image.view()),
            Err(SegmentationError::UnsupportedChannels(1))
        ));
    }
}
