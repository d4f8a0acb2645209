//! sRGB to CIELAB conversion for clustering features.

use ndarray::ArrayView3;

/// sRGB (0-255) to CIELAB under D65.
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> [f32; 3] {
    let r = srgb_to_linear(r);
    let g = srgb_to_linear(g);
    let b = srgb_to_linear(b);

    // RGB to XYZ (D65), normalized by the white point
    let x = (r * 0.4124564 + g * 0.3575761 + b * 0.1804375) / 0.95047;
    let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
    let z = (r * 0.0193339 + g * 0.1191920 + b * 0.9503041) / 1.08883;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Single intensity mapped onto the L axis, a = b = 0.
#[inline]
pub fn gray_to_lab(v: u8) -> [f32; 3] {
    [v as f32 / 255.0 * 100.0, 0.0, 0.0]
}

#[inline]
fn srgb_to_linear(v: u8) -> f32 {
    let v = v as f32 / 255.0;
    if v > 0.04045 {
        ((v + 0.055) / 1.055).powf(2.4)
    } else {
        v / 12.92
    }
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// Per-pixel Lab features in raster order. `channels` must be 1 or 3.
pub(crate) fn lab_features(image: &ArrayView3<u8>) -> Vec<[f32; 3]> {
    let (height, width, channels) = image.dim();
    let mut features = Vec::with_capacity(height * width);
    for row in 0..height {
        for col in 0..width {
            features.push(if channels == 1 {
                gray_to_lab(image[[row, col, 0]])
            } else {
                rgb_to_lab(image[[row, col, 0]], image[[row, col, 1]], image[[row, col, 2]])
            });
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_and_black() {
        let white = rgb_to_lab(255, 255, 255);
        assert!((white[0] - 100.0).abs() < 0.1);
        assert!(white[1].abs() < 0.1 && white[2].abs() < 0.1);

        let black = rgb_to_lab(0, 0, 0);
        assert!(black[0].abs() < 0.1);
    }

    #[test]
    fn test_red_is_positive_a() {
        let red = rgb_to_lab(255, 0, 0);
        assert!((red[0] - 53.2).abs() < 0.5);
        assert!(red[1] > 70.0);
    }

    #[test]
    fn test_gray_scale() {
        assert_eq!(gray_to_lab(0), [0.0, 0.0, 0.0]);
        assert_eq!(gray_to_lab(255), [100.0, 0.0, 0.0]);
    }
}
