//! Local slab storage: a row-major `(L + 2) × (D + 2)` grid, double buffered.
//!
//! Row 0 and row `L + 1` are ghost rows mirroring the neighbouring slabs (or
//! holding the true boundary for the first/last worker). Columns 0 and
//! `D + 1` are boundary columns that the stencil never writes.

use std::ops::Range;

use crate::data::boundary::BoundaryRamp;
use crate::debug_invariants::DebugInvariants;
use crate::decomposition::Slab;
use crate::jacobi_error::JacobiError;

/// Initial guess for every non-boundary cell.
pub const INITIAL_GUESS: f64 = 0.5;

/// Flat row-major grid addressed by `(row, col)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Subgrid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Subgrid {
    /// A `rows × cols` grid filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) outside {}x{} subgrid",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    /// Value at `(row, col)`.
    ///
    /// # Panics
    /// If the cell lies outside the grid.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[self.index(row, col)]
    }

    #[inline]
    pub fn at_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        let i = self.index(row, col);
        &mut self.data[i]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[self.index(row, 0)..][..self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = self.index(row, 0);
        let cols = self.cols;
        &mut self.data[start..start + cols]
    }

    /// Contiguous cells of the rows in `rows`.
    pub fn row_block(&self, rows: Range<usize>) -> &[f64] {
        assert!(rows.end <= self.rows, "row block {rows:?} outside subgrid");
        &self.data[rows.start * self.cols..rows.end * self.cols]
    }

    pub fn row_block_mut(&mut self, rows: Range<usize>) -> &mut [f64] {
        assert!(rows.end <= self.rows, "row block {rows:?} outside subgrid");
        &mut self.data[rows.start * self.cols..rows.end * self.cols]
    }

    /// Row `dst` mutably alongside row `src` for reading; the rows must differ.
    pub fn row_pair_mut(&mut self, dst: usize, src: usize) -> (&mut [f64], &[f64]) {
        assert_ne!(dst, src, "row_pair_mut needs two distinct rows");
        let cols = self.cols;
        let _ = self.index(dst.max(src), 0); // bounds check
        if dst < src {
            let (lo, hi) = self.data.split_at_mut(src * cols);
            (&mut lo[dst * cols..(dst + 1) * cols], &hi[..cols])
        } else {
            let (lo, hi) = self.data.split_at_mut(dst * cols);
            (&mut hi[..cols], &lo[src * cols..(src + 1) * cols])
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Owned `{current, next}` pair. `swap` exchanges roles without copying.
#[derive(Clone, Debug, PartialEq)]
pub struct DoubleBuffer {
    pub current: Subgrid,
    pub next: Subgrid,
}

impl DoubleBuffer {
    pub fn new(grid: Subgrid) -> Self {
        Self {
            next: grid.clone(),
            current: grid,
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

/// A worker's slab: its partition plus the double-buffered field.
#[derive(Clone, Debug)]
pub struct LocalSubgrid {
    slab: Slab,
    ramp: BoundaryRamp,
    buffers: DoubleBuffer,
}

impl LocalSubgrid {
    /// Allocate and initialise both buffers for `slab`.
    ///
    /// Non-boundary cells start at [`INITIAL_GUESS`]. Column 0 takes the
    /// left ramp at each row's global position (ghost rows included), column
    /// `D + 1` is 0, the first worker's top ghost row is the zero top
    /// boundary and the last worker's bottom ghost row is the bottom ramp.
    pub fn new(slab: Slab) -> Self {
        let ramp = BoundaryRamp::new(slab.dimension);
        let width = slab.width();
        let mut grid = Subgrid::zeros(slab.rows + 2, width);

        for i in 0..grid.rows() {
            let g = slab.global_row(i);
            let row = grid.row_mut(i);
            row[1..width - 1].fill(INITIAL_GUESS);
            row[0] = ramp.left(g);
            row[width - 1] = ramp.right(g);
        }
        if slab.is_first() {
            for (j, cell) in grid.row_mut(0).iter_mut().enumerate() {
                *cell = ramp.value(0, j).unwrap_or_else(|| ramp.top(j));
            }
        }
        if slab.is_last() {
            let last = slab.rows + 1;
            let g = slab.global_row(last);
            for (j, cell) in grid.row_mut(last).iter_mut().enumerate() {
                *cell = ramp.value(g, j).unwrap_or_else(|| ramp.bottom(j));
            }
        }

        let local = Self {
            slab,
            ramp,
            buffers: DoubleBuffer::new(grid),
        };
        local.debug_assert_invariants();
        local
    }

    pub fn slab(&self) -> &Slab {
        &self.slab
    }

    pub fn current(&self) -> &Subgrid {
        &self.buffers.current
    }

    pub fn current_mut(&mut self) -> &mut Subgrid {
        &mut self.buffers.current
    }

    pub fn next(&self) -> &Subgrid {
        &self.buffers.next
    }

    pub fn buffers_mut(&mut self) -> &mut DoubleBuffer {
        &mut self.buffers
    }

    pub fn swap(&mut self) {
        self.buffers.swap();
    }

    /// Value of the verification cell `(row, col)`, both in `0 ..= D`,
    /// which addresses global cell `(row + 1, col + 1)`.
    ///
    /// Returns `None` when another worker owns that row. The last worker also
    /// owns global row `D + 1`, the bottom boundary.
    pub fn peek(&self, row: usize, col: usize) -> Option<f64> {
        let g = row + 1;
        let owned = self.slab.owns_row(g) || (self.slab.is_last() && g == self.slab.dimension + 1);
        if !owned {
            return None;
        }
        let local = self.slab.local_row(g)?;
        self.buffers.current.get(local, col + 1)
    }
}

impl DebugInvariants for LocalSubgrid {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "LocalSubgrid");
    }

    fn validate_invariants(&self) -> Result<(), JacobiError> {
        let (rows, cols) = (self.slab.rows + 2, self.slab.width());
        let edge = cols - 1;
        for (name, grid) in [("current", &self.buffers.current), ("next", &self.buffers.next)] {
            if grid.rows() != rows || grid.cols() != cols {
                return Err(JacobiError::Invariant(format!(
                    "{name} buffer is {}x{}, expected {rows}x{cols}",
                    grid.rows(),
                    grid.cols()
                )));
            }
            for i in 0..rows {
                let g = self.slab.global_row(i);
                if grid.at(i, 0) != self.ramp.left(g) || grid.at(i, edge) != self.ramp.right(g) {
                    return Err(JacobiError::Invariant(format!(
                        "{name} buffer boundary column changed at global row {g}"
                    )));
                }
            }
        }
        Ok(())
    }
}
