//! Boundary tracing of binary masks with marching squares.
//!
//! The mask is padded with one background pixel and sampled at pixel
//! centers. Every boundary crossing lies halfway between an inside and an
//! outside center, so all vertices sit on a half-pixel lattice. Crossings are
//! keyed on doubled integer coordinates, which makes linking exact.

use std::collections::HashMap;

use log::debug;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::buffer::{pad, BACKGROUND};
use crate::error::{Result, SegmentationError};

/// A contour vertex: `x` along columns, `y` along rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Closed polygon: the first point is repeated at the end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    /// Close `points` by repeating the first vertex if needed.
    pub fn closed(mut points: Vec<Point>) -> Self {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if first != last {
                points.push(first);
            }
        }
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of distinct vertices (the closing duplicate is not counted).
    pub fn vertex_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Shoelace area; negative for outer boundaries produced by
    /// [`mask_to_contour`].
    pub fn signed_area(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
            .sum::<f64>()
            / 2.0
    }

    /// GeoJSON Polygon geometry with this contour as its only ring.
    pub fn to_geojson(&self) -> Value {
        let ring: Vec<[f64; 2]> = self.points.iter().map(|p| [p.x, p.y]).collect();
        json!({
            "type": "Polygon",
            "coordinates": [ring],
        })
    }

    /// Parse a GeoJSON Polygon; only the outer ring is kept.
    pub fn from_geojson(text: &str) -> Result<Self> {
        let geometry: Polygon = serde_json::from_str(text)?;
        if geometry.kind != "Polygon" {
            return Err(SegmentationError::InvalidGeometry(format!(
                "expected a Polygon, got {}",
                geometry.kind
            )));
        }
        let ring = geometry
            .coordinates
            .into_iter()
            .next()
            .ok_or_else(|| SegmentationError::InvalidGeometry("polygon has no rings".into()))?;
        if ring.is_empty() {
            return Ok(Self::default());
        }
        if ring.first() != ring.last() || ring.len() < 4 {
            return Err(SegmentationError::InvalidGeometry(
                "ring must be closed and hold at least three vertices".into(),
            ));
        }
        Ok(Self {
            points: ring.into_iter().map(|[x, y]| Point::new(x, y)).collect(),
        })
    }
}

#[derive(Deserialize)]
struct Polygon {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<Vec<[f64; 2]>>,
}

/// Crossing position in doubled padded-grid coordinates `(2 * row, 2 * col)`.
type Key = (usize, usize);

/// Directed boundary segments of one cell, foreground kept on the same side.
///
/// Corners are indexed tl=1, tr=2, br=4, bl=8. Saddles (5, 10) join the two
/// inside corners, matching 8-connected foreground.
fn cell_segments(case: u8, row: usize, col: usize) -> [Option<(Key, Key)>; 2] {
    let top = (2 * row, 2 * col + 1);
    let right = (2 * row + 1, 2 * col + 2);
    let bottom = (2 * row + 2, 2 * col + 1);
    let left = (2 * row + 1, 2 * col);

    match case {
        1 => [Some((left, top)), None],
        2 => [Some((top, right)), None],
        3 => [Some((left, right)), None],
        4 => [Some((right, bottom)), None],
        5 => [Some((right, top)), Some((left, bottom))],
        6 => [Some((top, bottom)), None],
        7 => [Some((left, bottom)), None],
        8 => [Some((bottom, left)), None],
        9 => [Some((bottom, top)), None],
        10 => [Some((top, left)), Some((bottom, right))],
        11 => [Some((bottom, right)), None],
        12 => [Some((right, left)), None],
        13 => [Some((right, top)), None],
        14 => [Some((top, left)), None],
        _ => [None, None],
    }
}

/// Trace every closed boundary loop of the mask foreground.
///
/// Loops are returned in discovery order (raster order of the padded grid),
/// in unpadded `(x, y)` coordinates, each explicitly closed. Outer
/// boundaries have negative signed area, hole boundaries positive.
pub fn trace_boundaries(mask: ArrayView2<u8>) -> Vec<Contour> {
    let padded = pad(mask, BACKGROUND);
    let (height, width) = padded.dim();
    let inside = |r: usize, c: usize| padded[[r, c]] != BACKGROUND;

    let mut segments: Vec<(Key, Key)> = Vec::new();
    for row in 0..height.saturating_sub(1) {
        for col in 0..width.saturating_sub(1) {
            let case = (inside(row, col) as u8)
                | ((inside(row, col + 1) as u8) << 1)
                | ((inside(row + 1, col + 1) as u8) << 2)
                | ((inside(row + 1, col) as u8) << 3);
            segments.extend(cell_segments(case, row, col).into_iter().flatten());
        }
    }

    // Every crossing has exactly one outgoing segment.
    let next: HashMap<Key, (usize, Key)> = segments
        .iter()
        .enumerate()
        .map(|(i, &(start, end))| (start, (i, end)))
        .collect();

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    for (first, &(start, _)) in segments.iter().enumerate() {
        if used[first] {
            continue;
        }
        let mut points = Vec::new();
        let mut current = start;
        while let Some(&(index, end)) = next.get(&current) {
            if used[index] {
                break;
            }
            used[index] = true;
            points.push(to_point(current));
            current = end;
        }
        contours.push(Contour::closed(points));
    }

    contours
}

/// Padded doubled coordinates to unpadded `(x, y)`.
#[inline]
fn to_point((row2, col2): Key) -> Point {
    Point::new(col2 as f64 / 2.0 - 1.0, row2 as f64 / 2.0 - 1.0)
}

/// Extract the outer boundary of the mask foreground.
///
/// When the mask holds several components, the outer boundary with the most
/// vertices is chosen; ties go to the first boundary found in raster order.
/// Downstream consumers rely on this choice being stable.
///
/// An all-background mask gives an empty contour.
pub fn mask_to_contour(mask: ArrayView2<u8>) -> Contour {
    let boundaries = trace_boundaries(mask);
    let outer_count = boundaries.iter().filter(|c| c.signed_area() < 0.0).count();

    let chosen = boundaries
        .into_iter()
        .filter(|c| c.signed_area() < 0.0)
        .fold(None::<Contour>, |best, candidate| match best {
            Some(b) if b.vertex_count() >= candidate.vertex_count() => Some(b),
            _ => Some(candidate),
        })
        .unwrap_or_default();

    debug!(
        "traced {outer_count} outer boundaries, kept one with {} vertices",
        chosen.vertex_count()
    );

    chosen
}
