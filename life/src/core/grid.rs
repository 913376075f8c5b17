//! Grid codec: the textual board format and its in-memory form.
//!
//! The text form is newline-separated rows of equal length, one character per
//! cell: `'1'` alive, `'0'` dead. It is both the wire format and the persisted
//! state, so `decode(&encode(g)) == g` must hold for every grid.

use std::fmt;
use std::str::FromStr;

use crate::error::FormatError;

pub const ALIVE: char = '1';
pub const DEAD: char = '0';
pub const ROW_DELIMITER: char = '\n';

/// Fixed-size 2D grid of cell states, stored row-major.
///
/// A grid with zero rows or zero columns is always the canonical 0x0 grid, so
/// every in-memory grid has exactly one text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// All-dead grid of the given dimensions.
    pub fn dead(rows: usize, cols: usize) -> Self {
        Self::from_cells(rows, cols, vec![false; rows * cols])
    }

    fn from_cells(rows: usize, cols: usize, cells: Vec<bool>) -> Self {
        if rows == 0 || cols == 0 {
            return Self::default();
        }
        debug_assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell state at `(row, col)`. Out-of-bounds positions read as dead.
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    /// Set a cell. Panics if `(row, col)` is outside the grid.
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) outside {}x{} grid",
            self.rows,
            self.cols
        );
        self.cells[row * self.cols + col] = alive;
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[bool]> {
        // `chunks` rejects a zero size; the empty grid has no cells anyway.
        self.cells.chunks(self.cols.max(1))
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|alive| **alive).count()
    }
}

/// Parse grid text. Accepts a single trailing row delimiter.
pub fn decode(text: &str) -> Result<Grid, FormatError> {
    let body = text.strip_suffix(ROW_DELIMITER).unwrap_or(text);
    if body.is_empty() {
        return Ok(Grid::default());
    }

    let mut cells = Vec::with_capacity(body.len());
    let mut width: Option<usize> = None;
    let mut rows = 0;
    for (row, line) in body.split(ROW_DELIMITER).enumerate() {
        let mut found = 0;
        for (col, symbol) in line.chars().enumerate() {
            let alive = match symbol {
                ALIVE => true,
                DEAD => false,
                other => {
                    return Err(FormatError::InvalidSymbol {
                        row,
                        col,
                        symbol: other,
                    });
                }
            };
            cells.push(alive);
            found += 1;
        }
        match width {
            None => width = Some(found),
            Some(expected) if expected != found => {
                return Err(FormatError::RaggedRow {
                    row,
                    expected,
                    found,
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    Ok(Grid::from_cells(rows, width.unwrap_or(0), cells))
}

/// Render grid text. Never fails and never emits a trailing delimiter.
pub fn encode(grid: &Grid) -> String {
    let mut out = String::with_capacity(grid.rows * (grid.cols + 1));
    for (index, row) in grid.iter_rows().enumerate() {
        if index > 0 {
            out.push(ROW_DELIMITER);
        }
        out.extend(row.iter().map(|alive| if *alive { ALIVE } else { DEAD }));
    }
    out
}

impl FromStr for Grid {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}
