//! Connected-component cleanup of a raw cluster assignment.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};

use ndarray::Array2;

use super::slic::UNLABELED;
use crate::buffer::{neighbors, Connectivity};

/// Split labels into 4-connected regions and merge every region smaller than
/// `min_size` into its largest neighbor, smallest regions first.
///
/// Labels are rewritten densely from 0 in raster order of first appearance;
/// [`UNLABELED`] pixels are left alone. Returns the number of labels.
///
/// A region with no labeled neighbor (the only region of an isolated island)
/// is kept whatever its size.
pub(crate) fn enforce_connectivity(labels: &mut Array2<u32>, min_size: usize) -> u32 {
    let (height, width) = labels.dim();
    let (components, mut sizes) = label_components(labels);
    let count = sizes.len();

    let mut adjacent: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); count];
    for row in 0..height {
        for col in 0..width {
            let a = components[[row, col]];
            if a == UNLABELED {
                continue;
            }
            for (r, c) in [(row, col + 1), (row + 1, col)] {
                if r < height && c < width {
                    let b = components[[r, c]];
                    if b != UNLABELED && b != a {
                        adjacent[a as usize].insert(b);
                        adjacent[b as usize].insert(a);
                    }
                }
            }
        }
    }

    let mut parent: Vec<u32> = (0..count as u32).collect();
    let mut queue: BinaryHeap<Reverse<(usize, u32)>> = sizes
        .iter()
        .enumerate()
        .filter(|(_, &size)| size < min_size)
        .map(|(id, &size)| Reverse((size, id as u32)))
        .collect();

    while let Some(Reverse((size, id))) = queue.pop() {
        if parent[id as usize] != id || sizes[id as usize] != size {
            continue;
        }
        let target = adjacent[id as usize]
            .iter()
            .map(|&n| find(&mut parent, n))
            .filter(|&n| n != id)
            .max_by_key(|&n| (sizes[n as usize], Reverse(n)));
        let Some(target) = target else {
            continue;
        };

        parent[id as usize] = target;
        sizes[target as usize] += size;
        let absorbed = std::mem::take(&mut adjacent[id as usize]);
        adjacent[target as usize].extend(absorbed);
        if sizes[target as usize] < min_size {
            queue.push(Reverse((sizes[target as usize], target)));
        }
    }

    // Dense renumbering in raster order
    let mut dense = vec![UNLABELED; count];
    let mut next = 0u32;
    for ((row, col), label) in labels.indexed_iter_mut() {
        let component = components[[row, col]];
        if component == UNLABELED {
            continue;
        }
        let root = find(&mut parent, component) as usize;
        if dense[root] == UNLABELED {
            dense[root] = next;
            next += 1;
        }
        *label = dense[root];
    }

    next
}

fn find(parent: &mut [u32], mut node: u32) -> u32 {
    while parent[node as usize] != node {
        let grandparent = parent[parent[node as usize] as usize];
        parent[node as usize] = grandparent;
        node = grandparent;
    }
    node
}

/// 4-connected components of equal labels, numbered in raster order.
fn label_components(labels: &Array2<u32>) -> (Array2<u32>, Vec<usize>) {
    let (height, width) = labels.dim();
    let mut components = Array2::from_elem((height, width), UNLABELED);
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();

    for row in 0..height {
        for col in 0..width {
            let label = labels[[row, col]];
            if label == UNLABELED || components[[row, col]] != UNLABELED {
                continue;
            }
            let id = sizes.len() as u32;
            let mut size = 0;
            components[[row, col]] = id;
            queue.push_back((row, col));
            while let Some((r, c)) = queue.pop_front() {
                size += 1;
                for (nr, nc) in neighbors(r, c, height, width, Connectivity::Four) {
                    if components[[nr, nc]] == UNLABELED && labels[[nr, nc]] == label {
                        components[[nr, nc]] = id;
                        queue.push_back((nr, nc));
                    }
                }
            }
            sizes.push(size);
        }
    }

    (components, sizes)
}
