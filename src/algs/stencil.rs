//! Five-point Jacobi update.
//!
//! For every interior cell of the requested rows,
//! `next[i][j] = 0.25 * (cur[i-1][j] + cur[i][j+1] + cur[i+1][j] + cur[i][j-1])`.
//! Reads only `current`, writes only `next`, so the traversal order inside a
//! pass cannot change the result. Columns 0 and `D + 1` are never written.

use itertools::izip;
use std::ops::Range;

use crate::data::subgrid::Subgrid;

#[inline]
fn relax_row(up: &[f64], mid: &[f64], down: &[f64], out: &mut [f64]) {
    let d = out.len() - 2;
    for (o, u, w, s) in izip!(&mut out[1..=d], &up[1..=d], mid.windows(3), &down[1..=d]) {
        *o = 0.25 * (u + w[2] + s + w[0]);
    }
}

/// Apply the stencil to rows `rows` (local indices, end exclusive) of
/// `current`, writing into `next`.
///
/// An empty range is a no-op.
///
/// # Panics
/// If the grids differ in shape, or `rows` touches row 0 or the last row,
/// which have no neighbour above/below.
pub fn evolve(current: &Subgrid, next: &mut Subgrid, rows: Range<usize>) {
    if rows.is_empty() {
        return;
    }
    assert_eq!(
        (current.rows(), current.cols()),
        (next.rows(), next.cols()),
        "stencil buffers differ in shape"
    );
    assert!(
        rows.start >= 1 && rows.end < current.rows(),
        "rows {rows:?} need a neighbour row on both sides"
    );
    let cols = current.cols();

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        next.row_block_mut(rows.clone())
            .par_chunks_mut(cols)
            .zip(rows.into_par_iter())
            .for_each(|(out, i)| {
                relax_row(current.row(i - 1), current.row(i), current.row(i + 1), out)
            });
    }

    #[cfg(not(feature = "rayon"))]
    for (out, i) in next.row_block_mut(rows.clone()).chunks_mut(cols).zip(rows) {
        relax_row(current.row(i - 1), current.row(i), current.row(i + 1), out);
    }
}
