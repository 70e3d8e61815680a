//! Ghost-row exchange between neighbouring slabs.
//!
//! Each iteration moves one row in each direction across every slab
//! boundary: a worker's first interior row goes up to its previous
//! neighbour's bottom ghost row (tag `up`), its last interior row goes down
//! to its next neighbour's top ghost row (tag `down`). Sides without a
//! neighbour are skipped; their ghost rows keep the true boundary values
//! written at initialisation.

use crate::algs::communicator::{Communicator, HaloTags, Wait};
use crate::algs::wire::{cast_slice, cast_slice_mut, copy_cells_into};
use crate::data::subgrid::LocalSubgrid;
use crate::jacobi_error::JacobiError;

/// Communication discipline for the halo exchange.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ExchangeMode {
    /// Paired send/receive calls that complete before computation starts.
    Blocking,
    /// Four in-flight transfers overlapped with the interior update.
    #[default]
    NonBlocking,
}

/// Exchange both ghost rows with paired blocking transfers.
///
/// Returns once both ghost rows of the current buffer hold the neighbours'
/// rows and the outgoing rows have been handed off.
pub fn exchange_blocking<C: Communicator>(
    comm: &C,
    local: &mut LocalSubgrid,
    tags: HaloTags,
) -> Result<(), JacobiError> {
    let nbrs = local.slab().neighbors();
    let last = local.slab().rows;
    let grid = local.current_mut();

    // first interior row up, bottom ghost from below
    let (ghost, edge) = grid.row_pair_mut(last + 1, 1);
    comm.sendrecv(nbrs.prev, cast_slice(edge), nbrs.next, cast_slice_mut(ghost), tags.up)?;

    // last interior row down, top ghost from above
    let (ghost, edge) = grid.row_pair_mut(0, last);
    comm.sendrecv(nbrs.next, cast_slice(edge), nbrs.prev, cast_slice_mut(ghost), tags.down)?;
    Ok(())
}

/// Transfers issued by [`start_exchange`] that have not completed yet.
///
/// Ghost rows of the current buffer must not be read until [`wait`] returns.
///
/// [`wait`]: PendingHalo::wait
#[must_use = "pending halo transfers must be waited on"]
pub struct PendingHalo<C: Communicator> {
    sends: Vec<C::SendHandle>,
    from_prev: Option<(usize, C::RecvHandle)>,
    from_next: Option<(usize, C::RecvHandle)>,
}

/// Issue the four halo transfers without waiting for any of them.
pub fn start_exchange<C: Communicator>(
    comm: &C,
    local: &mut LocalSubgrid,
    tags: HaloTags,
) -> PendingHalo<C> {
    let nbrs = local.slab().neighbors();
    let last = local.slab().rows;
    let grid = local.current_mut();

    let mut sends = Vec::with_capacity(2);
    if let Some(prev) = nbrs.prev {
        sends.push(comm.isend(prev, tags.up.as_u16(), cast_slice(grid.row(1))));
    }
    if let Some(next) = nbrs.next {
        sends.push(comm.isend(next, tags.down.as_u16(), cast_slice(grid.row(last))));
    }
    let from_prev = nbrs
        .prev
        .map(|prev| (prev, comm.irecv(prev, tags.down.as_u16(), cast_slice_mut(grid.row_mut(0)))));
    let from_next = nbrs.next.map(|next| {
        (next, comm.irecv(next, tags.up.as_u16(), cast_slice_mut(grid.row_mut(last + 1))))
    });
    log::trace!(
        "[rank {}] halo issued: prev={:?} next={:?}",
        comm.rank(),
        nbrs.prev,
        nbrs.next
    );

    PendingHalo {
        sends,
        from_prev,
        from_next,
    }
}

impl<C: Communicator> PendingHalo<C> {
    /// Block until all transfers complete and store the received rows in the
    /// ghost rows of `local`'s current buffer.
    ///
    /// Every handle is drained before returning, even when a receive fails;
    /// the first failure is reported.
    pub fn wait(self, local: &mut LocalSubgrid) -> Result<(), JacobiError> {
        let last = local.slab().rows + 1;
        let grid = local.current_mut();

        let mut first_err = None;
        for (row, pending) in [(0, self.from_prev), (last, self.from_next)] {
            let Some((nbr, handle)) = pending else {
                continue;
            };
            let res = match handle.wait() {
                Some(data) => {
                    copy_cells_into(grid.row_mut(row), &data).map_err(|e| JacobiError::comm(nbr, e))
                }
                None => Err(JacobiError::comm(nbr, format!("no halo row from rank {nbr}"))),
            };
            if let Err(e) = res {
                first_err.get_or_insert(e);
            }
        }
        for send in self.sends {
            let _ = send.wait();
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
