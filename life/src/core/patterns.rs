//! Named seed patterns, placed on the smallest board that contains them
//! plus a one-cell dead margin where the pattern needs room to evolve.

use crate::core::grid::Grid;

pub struct Pattern {
    pub name: &'static str,
    pub rows: usize,
    pub cols: usize,
    /// Live cells as `(row, col)`.
    pub cells: &'static [(usize, usize)],
}

impl Pattern {
    pub fn to_grid(&self) -> Grid {
        let mut grid = Grid::dead(self.rows, self.cols);
        for &(row, col) in self.cells {
            grid.set(row, col, true);
        }
        grid
    }
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "block",
        rows: 4,
        cols: 4,
        cells: &[(1, 1), (1, 2), (2, 1), (2, 2)],
    },
    Pattern {
        name: "blinker",
        rows: 3,
        cols: 3,
        cells: &[(1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "toad",
        rows: 4,
        cols: 4,
        cells: &[(1, 1), (1, 2), (1, 3), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "beacon",
        rows: 4,
        cols: 4,
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "glider",
        rows: 6,
        cols: 6,
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "plus",
        rows: 3,
        cols: 3,
        cells: &[(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)],
    },
];

pub fn find(name: &str) -> Option<&'static Pattern> {
    PATTERNS
        .iter()
        .find(|pattern| pattern.name.eq_ignore_ascii_case(name))
}
