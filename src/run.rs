//! Worker entry points.
//!
//! [`run_worker`] is the SPMD body every worker executes: partition,
//! initialise, iterate, peek, gather. [`run_threaded`] runs a whole world of
//! workers on threads of the current process.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::algs::communicator::{Communicator, ThreadComm};
use crate::algs::driver::{IterationDriver, Timings};
use crate::config::RunConfig;
use crate::data::subgrid::LocalSubgrid;
use crate::decomposition::Slab;
use crate::io::collect_solution;
use crate::jacobi_error::JacobiError;

/// The verification cell, as reported by the worker that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeekedCell {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl fmt::Display for PeekedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matrix[{},{}] = {:.6}", self.row, self.col, self.value)
    }
}

/// What one worker reports at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub rank: usize,
    pub timings: Timings,
    /// Present only on the worker owning the verification cell.
    pub peek: Option<PeekedCell>,
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.rank;
        let t = &self.timings;
        writeln!(f, "total elapsed time on processor {r} = {:.6} seconds", t.total.as_secs_f64())?;
        writeln!(
            f,
            "communication elapsed time on processor {r} = {:.6} seconds",
            t.communication.as_secs_f64()
        )?;
        write!(
            f,
            "computation elapsed time on processor {r} = {:.6} seconds",
            t.computation.as_secs_f64()
        )?;
        if let Some(cell) = &self.peek {
            write!(f, "\n{cell}")?;
        }
        Ok(())
    }
}

/// Execute one worker of a run.
///
/// The world size of `comm` decides the decomposition; `config.workers` is
/// ignored here. The configuration is validated first, identically on every
/// worker, so an invalid run stops everywhere before any allocation.
pub fn run_worker<C: Communicator>(
    config: &RunConfig,
    comm: &C,
) -> Result<WorkerReport, JacobiError> {
    let config = RunConfig {
        workers: comm.size(),
        ..config.clone()
    };
    config.validate()?;

    let rank = comm.rank();
    let slab = Slab::new(config.dimension, config.workers, rank)?;
    log::info!(
        "[rank {rank}] rows {}..={} of {} ({:?})",
        slab.offset + 1,
        slab.offset + slab.rows,
        config.dimension,
        config.mode
    );

    let mut local = LocalSubgrid::new(slab);
    let timings = IterationDriver::new(comm, config.mode).run(&mut local, config.iterations)?;

    let peek = local
        .peek(config.peek_row, config.peek_col)
        .map(|value| PeekedCell {
            row: config.peek_row,
            col: config.peek_col,
            value,
        });

    let collected = collect_solution(&local, comm, &config.output);
    comm.barrier();
    collected?;

    log::info!("[rank {rank}] done in {:?}", timings.total);
    Ok(WorkerReport {
        rank,
        timings,
        peek,
    })
}

/// Aborts the thread world when the worker holding it unwinds.
struct AbortOnPanic<'a>(&'a ThreadComm);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abort();
        }
    }
}

/// Run `body` once per rank of a fresh `workers`-rank thread world.
///
/// A worker that fails or panics aborts the world, which releases its
/// neighbours; the error of the worker that failed first is returned.
fn run_on_threads<F>(workers: usize, body: F) -> Result<Vec<WorkerReport>, JacobiError>
where
    F: Fn(&ThreadComm) -> Result<WorkerReport, JacobiError> + Sync,
{
    let world = ThreadComm::world(workers);
    let observer = world.first().cloned();
    let body = &body;

    let mut results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| {
                s.spawn(move || {
                    let _guard = AbortOnPanic(&comm);
                    let res = body(&comm);
                    if let Err(e) = &res {
                        log::error!("[rank {}] {e}", comm.rank());
                        comm.abort();
                    }
                    res
                })
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| h.join().unwrap_or(Err(JacobiError::WorkerPanicked(rank))))
            .collect()
    });

    if let Some(rank) = observer.and_then(|c| c.aborted_by()) {
        if let Err(e) = results.swap_remove(rank) {
            return Err(e);
        }
    }
    results.into_iter().collect()
}

/// Run `config.workers` workers on scoped threads, one [`ThreadComm`] each.
/// Reports come back in rank order.
pub fn run_threaded(config: &RunConfig) -> Result<Vec<WorkerReport>, JacobiError> {
    config.validate()?;
    run_on_threads(config.workers, |comm| run_worker(config, comm))
}
