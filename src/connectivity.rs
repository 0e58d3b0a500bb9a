//! Boundary detection over a voxel neighbourhood.

use crate::classifier::{Segment, Window};
use crate::enums::Adjacency;
use crate::volume::VolumeGrid;

/// All 26 non-zero offsets in `{-1, 0, 1}³`, z-major.
const NEIGHBOUR_OFFSETS: [(i32, i32, i32); 26] = {
    let mut offsets = [(0, 0, 0); 26];
    let mut i = 0;
    let mut n = 0;
    while n < 27 {
        let dx = (n % 3) as i32 - 1;
        let dy = ((n / 3) % 3) as i32 - 1;
        let dz = (n / 9) as i32 - 1;
        if dx != 0 || dy != 0 || dz != 0 {
            offsets[i] = (dx, dy, dz);
            i += 1;
        }
        n += 1;
    }
    offsets
};

/// Offsets retained by `adjacency`.
pub fn offsets(adjacency: Adjacency) -> impl Iterator<Item = (i32, i32, i32)> {
    NEIGHBOUR_OFFSETS
        .into_iter()
        .filter(move |(dx, dy, dz)| adjacency.includes(*dx, *dy, *dz))
}

#[inline]
fn shifted(coord: usize, delta: i32, len: usize) -> Option<usize> {
    let moved = coord.checked_add_signed(delta as isize)?;
    (moved < len).then_some(moved)
}

/// True when some in-bounds neighbour classifies differently from `segment`.
///
/// Neighbours outside the grid are skipped, so a voxel on the outer face of
/// the volume is not a boundary by virtue of its missing neighbours.
pub fn is_boundary(
    grid: &VolumeGrid,
    adjacency: Adjacency,
    (col, row, layer): (usize, usize, usize),
    segment: Segment,
    window: &Window,
    color_mode: bool,
) -> bool {
    let (width, height, depth) = grid.dimensions();

    offsets(adjacency).any(|(dx, dy, dz)| {
        let (Some(x), Some(y), Some(z)) = (
            shifted(col, dx, width),
            shifted(row, dy, height),
            shifted(layer, dz, depth),
        ) else {
            return false;
        };
        let neighbour = window.classify(f64::from(grid.value_at(x, y, z)), color_mode);
        neighbour != segment
    })
}
