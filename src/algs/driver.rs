//! Iteration driver: exchange → interior → (wait) → borders → swap.
//!
//! Interior rows `[2, L)` depend only on rows this worker owns, so they are
//! computed while a non-blocking exchange is still in flight. Rows 1 and `L`
//! read the ghost rows and are computed after the exchange has completed.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::algs::communicator::{Communicator, HaloTags};
use crate::algs::halo::{ExchangeMode, exchange_blocking, start_exchange};
use crate::algs::stencil::evolve;
use crate::data::subgrid::{DoubleBuffer, LocalSubgrid};
use crate::debug_invariants::DebugInvariants;
use crate::jacobi_error::JacobiError;

/// Wall-clock time accumulated by one worker over a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Time spent issuing and completing halo exchanges.
    pub communication: Duration,
    /// Time spent in the stencil update.
    pub computation: Duration,
    /// Wall time of the whole iteration loop.
    pub total: Duration,
}

/// Runs a fixed number of Jacobi iterations on one worker's slab.
#[derive(Debug)]
pub struct IterationDriver<'a, C: Communicator> {
    comm: &'a C,
    mode: ExchangeMode,
    tags: HaloTags,
}

impl<'a, C: Communicator> IterationDriver<'a, C> {
    pub fn new(comm: &'a C, mode: ExchangeMode) -> Self {
        Self {
            comm,
            mode,
            tags: HaloTags::default(),
        }
    }

    pub fn with_tags(mut self, tags: HaloTags) -> Self {
        self.tags = tags;
        self
    }

    /// Run `iterations` full sweeps. Zero iterations leaves the field as
    /// initialised.
    pub fn run(&self, local: &mut LocalSubgrid, iterations: usize) -> Result<Timings, JacobiError> {
        let rank = self.comm.rank();
        if local.slab().rows < 3 {
            log::warn!(
                "[rank {rank}] slab has {} rows: no interior rows to overlap with the exchange",
                local.slab().rows
            );
        }

        let mut timings = Timings::default();
        let start = Instant::now();
        for it in 0..iterations {
            self.step(local, &mut timings)?;
            log::debug!(
                "[rank {rank}] iteration {it}: comm {:?} comp {:?}",
                timings.communication,
                timings.computation
            );
        }
        timings.total = start.elapsed();
        local.debug_assert_invariants();
        Ok(timings)
    }

    /// One sweep.
    pub fn step(&self, local: &mut LocalSubgrid, timings: &mut Timings) -> Result<(), JacobiError> {
        let rows = local.slab().rows;

        // EXCHANGE
        let t = Instant::now();
        let pending = match self.mode {
            ExchangeMode::Blocking => {
                exchange_blocking(self.comm, local, self.tags)?;
                None
            }
            ExchangeMode::NonBlocking => Some(start_exchange(self.comm, local, self.tags)),
        };
        timings.communication += t.elapsed();

        // COMPUTE_INTERIOR
        let t = Instant::now();
        relax(local.buffers_mut(), 2..rows);
        timings.computation += t.elapsed();

        // WAIT
        if let Some(pending) = pending {
            let t = Instant::now();
            pending.wait(local)?;
            timings.communication += t.elapsed();
        }

        // COMPUTE_BORDERS
        let t = Instant::now();
        let buffers = local.buffers_mut();
        relax(buffers, rows..rows + 1);
        if rows > 1 {
            relax(buffers, 1..2);
        }
        timings.computation += t.elapsed();

        // SWAP
        local.swap();
        Ok(())
    }
}

fn relax(buffers: &mut DoubleBuffer, rows: std::ops::Range<usize>) {
    let DoubleBuffer { current, next } = buffers;
    evolve(current, next, rows);
}
