//! Transition engine for classic Game of Life (B3/S23) on a bounded grid.
//!
//! Neighbors outside the grid do not exist (no wraparound). Every cell of the
//! next grid is computed from the previous grid only.

use crate::core::grid::Grid;

/// Relative positions of the up-to-8 neighbors of a cell.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Compute the next generation. Dimensions are preserved.
pub fn step(grid: &Grid) -> Grid {
    let mut next = Grid::dead(grid.rows(), grid.cols());
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let alive = next_cell(grid.get(row, col), live_neighbors(grid, row, col));
            if alive {
                next.set(row, col, true);
            }
        }
    }
    next
}

/// Count live cells among the in-bounds neighbors of `(row, col)`.
pub fn live_neighbors(grid: &Grid, row: usize, col: usize) -> u8 {
    NEIGHBOR_OFFSETS
        .iter()
        .filter_map(|&(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            (r < grid.rows() && c < grid.cols()).then_some((r, c))
        })
        .filter(|&(r, c)| grid.get(r, c))
        .count() as u8
}

/// The B3/S23 rule for a single cell.
pub fn next_cell(alive: bool, live_neighbors: u8) -> bool {
    matches!((alive, live_neighbors), (true, 2) | (true, 3) | (false, 3))
}
