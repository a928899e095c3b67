//! Force-pair topologies
//!
//! A pairwise force law only acts across the pairs it is handed. Gravity
//! uses every unique pair; springs use a sparse topology such as a strand,
//! a ring or a rectangular mesh.
//!
//! Mesh bodies are numbered row by row, `w` bodies per row, with an optional
//! remainder of bodies appended after the last full row:
//!
//! ```text
//! 6 7
//! 4 5
//! 2 3
//! 0 1
//! ```

use crate::simulation::states::ForcePair;

/// Every unique pair over `n` bodies in canonical order: increasing `i`,
/// then increasing `j`. For `n = 4`:
/// (0,1) (0,2) (0,3) (1,2) (1,3) (2,3)
pub fn force_pairs(n: usize) -> Vec<ForcePair> {
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push(ForcePair::new(i, j));
        }
    }
    pairs
}

/// Every unique pair over an arbitrary index list, enumerated by list
/// position. `[0, 3, 2]` yields (0,3) (0,2) (3,2).
pub fn force_pairs_of(indices: &[usize]) -> Vec<ForcePair> {
    force_pairs(indices.len())
        .into_iter()
        .map(|p| ForcePair::new(indices[p.i], indices[p.j]))
        .collect()
}

/// Open chain 0-1-2-...-(n-1)
pub fn single_strand(n: usize) -> Vec<ForcePair> {
    (1..n).map(|j| ForcePair::new(j - 1, j)).collect()
}

/// Closed chain, the last body linked back to the first
pub fn ring_strand(n: usize) -> Vec<ForcePair> {
    let mut pairs = single_strand(n);
    if n > 2 {
        pairs.push(ForcePair::new(n - 1, 0));
    }
    pairs
}

/// Ring over the first `n - 1` bodies, with the last body linked to all of them
pub fn ring_with_center(n: usize) -> Vec<ForcePair> {
    if n < 2 {
        return Vec::new();
    }
    let center = n - 1;
    let mut pairs = ring_strand(center);
    pairs.extend((0..center).map(|i| ForcePair::new(center, i)));
    pairs
}

pub fn above(index: usize, w: usize) -> Option<usize> {
    index.checked_sub(w)
}

pub fn below(index: usize, w: usize, length: usize) -> Option<usize> {
    Some(index + w).filter(|&k| k < length)
}

pub fn right(index: usize, w: usize, length: usize) -> Option<usize> {
    Some(index + 1).filter(|&k| k % w != 0 && k < length)
}

pub fn left(index: usize, w: usize) -> Option<usize> {
    index.checked_sub(1).filter(|&k| k % w != w - 1)
}

fn two_below(index: usize, w: usize, length: usize) -> Option<usize> {
    Some(index + 2 * w).filter(|&k| k < length)
}

// must stay on the same row
fn two_right(index: usize, w: usize, length: usize) -> Option<usize> {
    Some(index + 2).filter(|&k| index % w + 2 < w && k < length)
}

/// Nearest-neighbour springs on a `w` x `h` grid plus `r` trailing bodies.
/// Only the `below` and `right` links are emitted so no pair appears twice.
pub fn rectangular_mesh(w: usize, h: usize, r: usize) -> Vec<ForcePair> {
    if w == 0 {
        return Vec::new();
    }
    let length = w * h + r;
    let mut pairs = Vec::new();
    for i in 0..length {
        for j in [below(i, w, length), right(i, w, length)].into_iter().flatten() {
            pairs.push(ForcePair::new(i, j));
        }
    }
    pairs
}

/// Like [`rectangular_mesh`], with extra links to the bodies two steps down
/// and two steps right
pub fn rectangular_mesh_next_nearest(w: usize, h: usize, r: usize) -> Vec<ForcePair> {
    if w == 0 {
        return Vec::new();
    }
    let length = w * h + r;
    let mut pairs = Vec::new();
    for i in 0..length {
        let neighbours = [
            below(i, w, length),
            right(i, w, length),
            two_below(i, w, length),
            two_right(i, w, length),
        ];
        for j in neighbours.into_iter().flatten() {
            pairs.push(ForcePair::new(i, j));
        }
    }
    pairs
}
