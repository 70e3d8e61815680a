//! JacobiError: Unified error type for halo-jacobi public APIs
//!
//! Every fallible operation in the crate (partitioning, configuration checks,
//! halo transfers, result collection) reports through this one enum so that a
//! worker can propagate failures with `?` up to its entry point.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for halo-jacobi operations.
#[derive(Debug, Error)]
pub enum JacobiError {
    /// The interior grid dimension must be at least one row/column.
    #[error("grid dimension must be > 0")]
    InvalidDimension,
    /// A run needs at least one worker.
    #[error("worker count must be > 0")]
    InvalidWorkerCount,
    /// Slab decomposition would leave some worker without an interior row.
    #[error("cannot split {dimension} rows across {workers} workers (need dimension >= workers)")]
    TooManyWorkers { dimension: usize, workers: usize },
    /// A rank outside `0..workers` was asked for its slab.
    #[error("rank {rank} out of range for {workers} workers")]
    RankOutOfRange { rank: usize, workers: usize },
    /// The requested verification cell lies outside the grid.
    #[error("cannot peek matrix[{row},{col}]: indices must be <= {dimension}")]
    PeekOutOfRange {
        row: usize,
        col: usize,
        dimension: usize,
    },
    /// A transfer with `neighbor` failed or delivered a malformed payload.
    #[error("communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Writing the solution dump failed.
    #[error("I/O error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An in-process worker thread panicked before producing its report.
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
    /// A data-structure invariant check failed.
    #[error("invariant violated: {0}")]
    Invariant(String),
    /// The MPI runtime could not be brought up.
    #[error("MPI initialization failed")]
    MpiInit,
}

impl JacobiError {
    pub(crate) fn comm(neighbor: usize, msg: impl Into<String>) -> Self {
        JacobiError::CommError {
            neighbor,
            source: msg.into().into(),
        }
    }
}
