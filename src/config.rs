//! Run configuration shared by every worker.
//!
//! Each worker holds (or parses) its own copy and validates it with
//! [`RunConfig::validate`]. The checks are pure functions of the
//! configuration, so all workers reach the same verdict and either all run
//! or all stop before allocating or communicating.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::algs::halo::ExchangeMode;
use crate::jacobi_error::JacobiError;

pub const DEFAULT_OUTPUT: &str = "solution.dat";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Interior grid dimension `D`.
    pub dimension: usize,
    pub iterations: usize,
    /// Verification cell, both indices in `0 ..= D`.
    pub peek_row: usize,
    pub peek_col: usize,
    pub mode: ExchangeMode,
    pub workers: usize,
    pub output: PathBuf,
}

impl RunConfig {
    pub fn new(dimension: usize, iterations: usize, peek_row: usize, peek_col: usize) -> Self {
        Self {
            dimension,
            iterations,
            peek_row,
            peek_col,
            mode: ExchangeMode::default(),
            workers: 1,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }

    pub fn with_mode(mut self, mode: ExchangeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// # Errors
    /// `InvalidDimension` for `D == 0`, `PeekOutOfRange` when either peek
    /// index exceeds `D`, `InvalidWorkerCount`/`TooManyWorkers` when the
    /// worker count cannot give every worker at least one row.
    pub fn validate(&self) -> Result<(), JacobiError> {
        if self.dimension == 0 {
            return Err(JacobiError::InvalidDimension);
        }
        if self.peek_row > self.dimension || self.peek_col > self.dimension {
            return Err(JacobiError::PeekOutOfRange {
                row: self.peek_row,
                col: self.peek_col,
                dimension: self.dimension,
            });
        }
        if self.workers == 0 {
            return Err(JacobiError::InvalidWorkerCount);
        }
        if self.dimension < self.workers {
            return Err(JacobiError::TooManyWorkers {
                dimension: self.dimension,
                workers: self.workers,
            });
        }
        Ok(())
    }
}
