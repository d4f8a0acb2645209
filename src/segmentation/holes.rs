//! Hole filling by flooding the exterior from a padded border.

use std::collections::VecDeque;

use log::debug;
use ndarray::{s, Array2, ArrayView2};

use crate::buffer::{neighbors, pad, Connectivity, Mask, BACKGROUND, FOREGROUND};

/// Fill every background pixel that is not reachable from the image border.
///
/// The mask is padded with background so the exterior is one connected
/// region, then flooded from the padded corner over pixels equal to the
/// background marker. The exterior flood is 4-connected, the dual of the
/// 8-connected foreground: background that only touches the outside through
/// a diagonal gap counts as a hole.
///
/// The input foreground is always a subset of the output foreground.
pub fn fill_holes(mask: ArrayView2<u8>) -> Mask {
    let (height, width) = mask.dim();
    let padded = pad(mask, BACKGROUND);
    let (padded_height, padded_width) = padded.dim();

    let mut exterior = Array2::from_elem((padded_height, padded_width), false);
    let mut queue = VecDeque::new();
    exterior[[0, 0]] = true;
    queue.push_back((0, 0));

    while let Some((row, col)) = queue.pop_front() {
        for (nr, nc) in neighbors(row, col, padded_height, padded_width, Connectivity::Four) {
            if !exterior[[nr, nc]] && padded[[nr, nc]] == BACKGROUND {
                exterior[[nr, nc]] = true;
                queue.push_back((nr, nc));
            }
        }
    }

    let filled = exterior
        .slice(s![1..height + 1, 1..width + 1])
        .mapv(|outside| if outside { BACKGROUND } else { FOREGROUND });

    debug!(
        "filled {} hole pixels",
        filled.iter().zip(mask.iter()).filter(|(&f, &m)| f != m).count()
    );

    filled
}
