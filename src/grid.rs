// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The beat grid: one row per instrument, one column per step.
//!
//! Grids are immutable values. Every mutation returns a new grid and leaves
//! the original alone, so a snapshot handed to a renderer or captured by a
//! tick never changes underneath it.

use std::sync::Arc;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside of the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// An instrument-by-step matrix of active cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Row-major cell storage, shared between snapshots until one is changed.
    cells: Arc<Vec<bool>>,
}

impl Grid {
    /// Creates a grid with every cell off.
    pub fn new(rows: usize, cols: usize) -> Grid {
        Grid {
            rows,
            cols,
            cells: Arc::new(vec![false; rows * cols]),
        }
    }

    /// The number of rows (instruments).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The number of columns (steps).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Reads a single cell.
    pub fn read(&self, row: usize, col: usize) -> Result<bool, GridError> {
        Ok(self.cells[self.index(row, col)?])
    }

    /// Returns a new grid with the given cell flipped.
    pub fn toggle(&self, row: usize, col: usize) -> Result<Grid, GridError> {
        let index = self.index(row, col)?;
        let mut cells = self.cells.as_ref().clone();
        cells[index] = !cells[index];
        Ok(Grid {
            rows: self.rows,
            cols: self.cols,
            cells: Arc::new(cells),
        })
    }

    /// Returns a grid of the same shape with every cell off.
    pub fn cleared(&self) -> Grid {
        Grid::new(self.rows, self.cols)
    }

    /// Returns the rows that are active at the given step, in row order.
    pub fn active_rows(&self, col: usize) -> Result<Vec<usize>, GridError> {
        if col >= self.cols {
            return Err(self.out_of_bounds(0, col));
        }
        Ok((0..self.rows)
            .filter(|row| self.cells[row * self.cols + col])
            .collect())
    }

    /// Returns the number of active cells in the whole grid.
    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_bounds(row, col));
        }
        Ok(row * self.cols + col)
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> GridError {
        GridError::OutOfBounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// Tracks a drag-paint gesture across the grid.
///
/// The first cell touched decides the paint value (the opposite of its current
/// state). Cells entered afterwards are only toggled if they don't already hold
/// the paint value, and re-entering the last touched cell does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stroke {
    paint: bool,
    last: (usize, usize),
}

impl Stroke {
    /// Starts a stroke on the given cell. The starting cell always needs toggling.
    pub fn begin(grid: &Grid, row: usize, col: usize) -> Result<Stroke, GridError> {
        let current = grid.read(row, col)?;
        Ok(Stroke {
            paint: !current,
            last: (row, col),
        })
    }

    /// The value this stroke paints.
    pub fn paint(&self) -> bool {
        self.paint
    }

    /// Moves the stroke onto a cell. Returns true if that cell should be toggled.
    pub fn enter(&mut self, grid: &Grid, row: usize, col: usize) -> Result<bool, GridError> {
        let current = grid.read(row, col)?;
        if self.last == (row, col) {
            return Ok(false);
        }
        self.last = (row, col);
        Ok(current != self.paint)
    }
}
