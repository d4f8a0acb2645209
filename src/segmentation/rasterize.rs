//! Polygon scanline fill, the inverse of contour tracing.

use ndarray::Array2;
use rayon::prelude::*;

use super::contour::Contour;
use crate::buffer::{Mask, BACKGROUND, FOREGROUND};
use crate::error::Result;

/// Rasterize a closed contour into a mask of the given `(height, width)`.
///
/// Pixel `(row, col)` is foreground when its center `(x = col, y = row)` lies
/// inside the polygon under the even-odd rule. Rows are scanned in parallel.
///
/// For a mask holding one hole-free component this undoes
/// [`mask_to_contour`](super::contour::mask_to_contour). Other masks are
/// reproduced approximately: holes and extra components are not part of the
/// traced contour.
pub fn contour_to_mask(shape: (usize, usize), contour: &Contour) -> Result<Mask> {
    let (height, width) = shape;
    let points = &contour.points;
    let mut flat = vec![BACKGROUND; height * width];

    if points.len() >= 3 && width > 0 {
        flat.par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out)| {
                let y = row as f64;
                let mut crossings: Vec<f64> = points
                    .iter()
                    .zip(points.iter().cycle().skip(1))
                    .filter(|(a, b)| (a.y > y) != (b.y > y))
                    .map(|(a, b)| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
                    .collect();
                crossings.sort_by(f64::total_cmp);

                for span in crossings.chunks_exact(2) {
                    let start = span[0].ceil().max(0.0);
                    let end = span[1].min(width as f64);
                    if start >= end {
                        continue;
                    }
                    // Half-open span [x0, x1)
                    let first = start as usize;
                    let last = (end.ceil() as usize).min(width);
                    for col in first..last {
                        out[col] = FOREGROUND;
                    }
                }
            });
    }

    Ok(Array2::from_shape_vec((height, width), flat)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::contour::{mask_to_contour, Point};
    use ndarray::array;

    fn round_trip(mask: &Mask) -> Mask {
        let contour = mask_to_contour(mask.view());
        contour_to_mask(mask.dim(), &contour).unwrap()
    }

    #[test]
    fn test_round_trip_rectangle() {
        let mut mask = Array2::<u8>::zeros((10, 12));
        for row in 2..7 {
            for col in 3..10 {
                mask[[row, col]] = 255;
            }
        }
        assert_eq!(round_trip(&mask), mask);
    }

    #[test]
    fn test_round_trip_l_shape_touching_edges() {
        let mask = array![
            [255u8, 0, 0, 0],
            [255, 0, 0, 0],
            [255, 0, 0, 0],
            [255, 255, 255, 255],
        ];
        assert_eq!(round_trip(&mask), mask);
    }

    #[test]
    fn test_round_trip_single_pixel() {
        let mut mask = Array2::<u8>::zeros((3, 3));
        mask[[1, 1]] = 255;
        assert_eq!(round_trip(&mask), mask);
    }

    #[test]
    fn test_round_trip_diagonal_bridge() {
        let mask = array![
            [255u8, 255, 0, 0],
            [255, 255, 0, 0],
            [0, 0, 255, 255],
            [0, 0, 255, 255],
        ];
        assert_eq!(round_trip(&mask), mask);
    }

    #[test]
    fn test_round_trip_blob() {
        let mask = Array2::from_shape_fn((24, 30), |(r, c)| {
            let dy = (r as f64 - 11.0) / 9.0;
            let dx = (c as f64 - 14.0) / 12.0;
            if dx * dx + dy * dy <= 1.0 || (r == 11 && c < 5) { 255u8 } else { 0 }
        });
        assert_eq!(round_trip(&mask), mask);
    }

    #[test]
    fn test_holes_are_dropped() {
        let mask = array![
            [255u8, 255, 255],
            [255, 0, 255],
            [255, 255, 255],
        ];
        let filled = round_trip(&mask);
        assert!(filled.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_square_polygon_uses_pixel_centers() {
        // Square from (0.5, 0.5) to (2.5, 2.5) covers centers 1 and 2 on both axes
        let contour = Contour::closed(vec![
            Point::new(0.5, 0.5),
            Point::new(2.5, 0.5),
            Point::new(2.5, 2.5),
            Point::new(0.5, 2.5),
        ]);
        let mask = contour_to_mask((4, 4), &contour).unwrap();
        assert_eq!(
            mask,
            array![
                [0u8, 0, 0, 0],
                [0, 255, 255, 0],
                [0, 255, 255, 0],
                [0, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn test_x_maps_to_columns() {
        // Thin horizontal strip: wide in x, one row in y
        let contour = Contour::closed(vec![
            Point::new(-0.5, 0.5),
            Point::new(3.5, 0.5),
            Point::new(3.5, 1.5),
            Point::new(-0.5, 1.5),
        ]);
        let mask = contour_to_mask((3, 4), &contour).unwrap();
        assert_eq!(mask.row(1).to_vec(), vec![255, 255, 255, 255]);
        assert!(mask.row(0).iter().chain(mask.row(2).iter()).all(|&v| v == 0));
    }

    #[test]
    fn test_empty_contour_gives_empty_mask() {
        let mask = contour_to_mask((5, 7), &Contour::default()).unwrap();
        assert_eq!(mask.dim(), (5, 7));
        assert!(mask.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_same_mask_for_any_thread_count() {
        // Star-shaped polygon with crossings on many rows
        let points: Vec<Point> = (0..=40)
            .map(|i| {
                let angle = i as f64 / 40.0 * std::f64::consts::TAU;
                let radius = if i % 2 == 0 { 30.0 } else { 12.5 };
                Point::new(40.0 + radius * angle.cos(), 35.0 + radius * angle.sin())
            })
            .collect();
        let contour = Contour::closed(points);
        let run = |threads| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| contour_to_mask((70, 80), &contour).unwrap())
        };
        let single = run(1);
        assert!(single.iter().any(|&v| v == 255));
        assert_eq!(single, run(4));
    }
}
