//! Dirichlet values on the edge of the global grid.
//!
//! With `increment = 100 / (D + 1)` the left column ramps from 0 at the top
//! to 100 at the bottom, the bottom row ramps from 100 on the left back to 0
//! on the right, and the top row and right column are held at 0. Values are
//! evaluated from the *global* row index, so every worker derives identical
//! numbers for the rows it shares with a neighbour.

/// Linear boundary ramp for a grid of interior dimension `D`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryRamp {
    dimension: usize,
    increment: f64,
}

impl BoundaryRamp {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            increment: 100.0 / (dimension + 1) as f64,
        }
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Left-column value at global row `g`.
    pub fn left(&self, g: usize) -> f64 {
        g as f64 * self.increment
    }

    /// Bottom-row value at column `col`.
    pub fn bottom(&self, col: usize) -> f64 {
        (self.dimension + 1).saturating_sub(col) as f64 * self.increment
    }

    /// Top row and right column.
    pub fn top(&self, _col: usize) -> f64 {
        0.0
    }

    pub fn right(&self, _g: usize) -> f64 {
        0.0
    }

    /// Fixed value of the boundary cell `(g, col)`, or `None` for interior cells.
    pub fn value(&self, g: usize, col: usize) -> Option<f64> {
        let edge = self.dimension + 1;
        if col == 0 {
            Some(self.left(g))
        } else if col == edge {
            Some(self.right(g))
        } else if g == 0 {
            Some(self.top(col))
        } else if g == edge {
            Some(self.bottom(col))
        } else {
            None
        }
    }
}
