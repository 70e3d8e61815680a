//! Row-wise slab decomposition of the global grid.
//!
//! Worker `r` of `P` owns `D / P` interior rows, plus one extra row when
//! `r < D % P`. Slabs are contiguous and ordered by rank, so every worker can
//! recompute its own and its neighbours' row ranges from `(D, P, rank)`
//! without talking to anyone.

use crate::jacobi_error::JacobiError;
use serde::{Deserialize, Serialize};

/// One worker's share of the global grid.
///
/// Local row `i` of the worker's buffers (ghost rows included) sits at global
/// row `offset + i`; its interior rows are global rows
/// `offset + 1 ..= offset + rows`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slab {
    pub rank: usize,
    pub workers: usize,
    /// Interior dimension `D` of the global grid.
    pub dimension: usize,
    /// Number of interior rows `L` owned by this worker.
    pub rows: usize,
    /// Global row offset: interior rows owned by all lower ranks.
    pub offset: usize,
}

/// Optional previous/next neighbour of a slab. `None` means the slab touches
/// the domain boundary on that side and the transfer is skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbors {
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

fn check(dimension: usize, workers: usize) -> Result<(), JacobiError> {
    if dimension == 0 {
        return Err(JacobiError::InvalidDimension);
    }
    if workers == 0 {
        return Err(JacobiError::InvalidWorkerCount);
    }
    if dimension < workers {
        return Err(JacobiError::TooManyWorkers { dimension, workers });
    }
    Ok(())
}

/// Rows owned by `rank`: `D/P`, plus one for the first `D mod P` ranks.
pub fn local_rows(dimension: usize, workers: usize, rank: usize) -> usize {
    dimension / workers + usize::from(rank < dimension % workers)
}

/// Interior rows owned by all ranks below `rank`.
pub fn row_offset(dimension: usize, workers: usize, rank: usize) -> usize {
    rank * (dimension / workers) + rank.min(dimension % workers)
}

impl Slab {
    /// Compute the slab of `rank`.
    ///
    /// # Errors
    /// `InvalidDimension`/`InvalidWorkerCount` for zero inputs,
    /// `TooManyWorkers` when `dimension < workers`,
    /// `RankOutOfRange` when `rank >= workers`.
    pub fn new(dimension: usize, workers: usize, rank: usize) -> Result<Self, JacobiError> {
        check(dimension, workers)?;
        if rank >= workers {
            return Err(JacobiError::RankOutOfRange { rank, workers });
        }
        Ok(Self {
            rank,
            workers,
            dimension,
            rows: local_rows(dimension, workers, rank),
            offset: row_offset(dimension, workers, rank),
        })
    }

    /// Width of every row, boundary columns included.
    pub fn width(&self) -> usize {
        self.dimension + 2
    }

    pub fn is_first(&self) -> bool {
        self.rank == 0
    }

    pub fn is_last(&self) -> bool {
        self.rank + 1 == self.workers
    }

    pub fn neighbors(&self) -> Neighbors {
        Neighbors {
            prev: (!self.is_first()).then(|| self.rank - 1),
            next: (!self.is_last()).then(|| self.rank + 1),
        }
    }

    /// Global row of local row `local` (0 and `rows + 1` are the ghost rows).
    pub fn global_row(&self, local: usize) -> usize {
        self.offset + local
    }

    /// Whether global row `g` is one of this slab's interior rows.
    pub fn owns_row(&self, g: usize) -> bool {
        g > self.offset && g <= self.offset + self.rows
    }

    /// Local row holding global row `g`, if it lies inside this slab's
    /// buffers (interior or ghost rows).
    pub fn local_row(&self, g: usize) -> Option<usize> {
        g.checked_sub(self.offset).filter(|&i| i <= self.rows + 1)
    }
}

/// All slabs of a run, in rank order.
pub fn decompose(dimension: usize, workers: usize) -> Result<Vec<Slab>, JacobiError> {
    (0..workers)
        .map(|rank| Slab::new(dimension, workers, rank))
        .collect()
}

/// Rank whose interior contains global row `g` (`1 ..= dimension`).
///
/// The boundary rows 0 and `dimension + 1` are attributed to the first and
/// last rank respectively.
pub fn owner_of_row(dimension: usize, workers: usize, g: usize) -> Result<usize, JacobiError> {
    check(dimension, workers)?;
    if g == 0 {
        return Ok(0);
    }
    if g > dimension {
        return Ok(workers - 1);
    }
    let base = dimension / workers;
    let res = dimension % workers;
    let idx = g - 1;
    // the first `res` ranks own `base + 1` rows each
    let wide = res * (base + 1);
    Ok(if idx < wide {
        idx / (base + 1)
    } else {
        res + (idx - wide) / base
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_low_ranks() {
        let slabs = decompose(10, 4).unwrap();
        let rows: Vec<_> = slabs.iter().map(|s| s.rows).collect();
        let offsets: Vec<_> = slabs.iter().map(|s| s.offset).collect();
        assert_eq!(rows, vec![3, 3, 2, 2]);
        assert_eq!(offsets, vec![0, 3, 6, 8]);
    }

    #[test]
    fn two_workers_on_four_rows() {
        let s0 = Slab::new(4, 2, 0).unwrap();
        let s1 = Slab::new(4, 2, 1).unwrap();
        assert_eq!((s0.offset + 1, s0.offset + s0.rows), (1, 2));
        assert_eq!((s1.offset + 1, s1.offset + s1.rows), (3, 4));
    }

    #[test]
    fn edge_slabs_have_one_neighbor() {
        let slabs = decompose(9, 3).unwrap();
        assert_eq!(slabs[0].neighbors(), Neighbors { prev: None, next: Some(1) });
        assert_eq!(slabs[1].neighbors(), Neighbors { prev: Some(0), next: Some(2) });
        assert_eq!(slabs[2].neighbors(), Neighbors { prev: Some(1), next: None });

        let single = Slab::new(5, 1, 0).unwrap();
        assert_eq!(single.neighbors(), Neighbors { prev: None, next: None });
    }

    #[test]
    fn owner_agrees_with_slabs() {
        for (d, p) in [(10, 4), (7, 7), (13, 5), (5, 1)] {
            let slabs = decompose(d, p).unwrap();
            for g in 1..=d {
                let owner = owner_of_row(d, p, g).unwrap();
                assert!(slabs[owner].owns_row(g), "D={d} P={p} g={g} owner={owner}");
            }
            assert_eq!(owner_of_row(d, p, d + 1).unwrap(), p - 1);
        }
    }

    #[test]
    fn local_row_covers_ghosts() {
        let s = Slab::new(10, 4, 1).unwrap(); // offset 3, rows 3
        assert_eq!(s.local_row(3), Some(0));
        assert_eq!(s.local_row(7), Some(4));
        assert_eq!(s.local_row(8), None);
        assert_eq!(s.local_row(2), None);
    }

    #[test]
    fn invalid_inputs_error() {
        assert!(matches!(Slab::new(0, 1, 0), Err(JacobiError::InvalidDimension)));
        assert!(matches!(Slab::new(4, 0, 0), Err(JacobiError::InvalidWorkerCount)));
        assert!(matches!(
            Slab::new(3, 4, 0),
            Err(JacobiError::TooManyWorkers { dimension: 3, workers: 4 })
        ));
        assert!(matches!(
            Slab::new(8, 2, 2),
            Err(JacobiError::RankOutOfRange { rank: 2, workers: 2 })
        ));
    }
}
