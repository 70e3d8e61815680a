//! Plot-friendly text dump of the full field.
//!
//! One line per grid cell, `x\ty\tvalue` with six decimals, where
//! `x = h * col` and `y = -h * global_row`. Rows appear in increasing global
//! order and every row carries all `D + 2` columns, boundaries included.
//!
//! Worker 0 is the coordinator: it writes its own rows (starting with the
//! top boundary row), then receives each other worker's interior block as a
//! single message, in rank order. The last worker's block also carries the
//! bottom boundary row.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::algs::communicator::{Communicator, GATHER_TAG, Wait};
use crate::algs::wire::{cast_slice, cell_bytes, copy_cells_into};
use crate::data::subgrid::LocalSubgrid;
use crate::decomposition::Slab;
use crate::jacobi_error::JacobiError;

/// Cell spacing `h` used for the plot coordinates.
pub const CELL_SPACING: f64 = 0.1;

/// Local rows a worker contributes to the dump.
pub fn contributed_rows(slab: &Slab) -> Range<usize> {
    let start = if slab.is_first() { 0 } else { 1 };
    let end = if slab.is_last() { slab.rows + 2 } else { slab.rows + 1 };
    start..end
}

/// Write a block of full-width rows whose first row is global row `first_row`.
pub fn write_rows<W: Write>(
    out: &mut W,
    cells: &[f64],
    width: usize,
    first_row: usize,
) -> std::io::Result<()> {
    for (k, row) in cells.chunks(width).enumerate() {
        let y = -CELL_SPACING * (first_row + k) as f64;
        for (j, v) in row.iter().enumerate() {
            writeln!(out, "{:.6}\t{:.6}\t{:.6}", CELL_SPACING * j as f64, y, v)?;
        }
    }
    Ok(())
}

/// Ship this worker's contribution to the coordinator as one message.
pub fn send_to_coordinator<C: Communicator>(
    local: &LocalSubgrid,
    comm: &C,
) -> Result<(), JacobiError> {
    let rows = contributed_rows(local.slab());
    let block = local.current().row_block(rows);
    log::debug!("[rank {}] sending {} cells to coordinator", comm.rank(), block.len());
    let _ = comm.isend(0, GATHER_TAG.as_u16(), cast_slice(block)).wait();
    Ok(())
}

/// A peer's contribution: its first global row and its cells.
struct Block {
    first_row: usize,
    cells: Vec<f64>,
}

/// Coordinator side: receive the block of every other worker, in rank order.
///
/// Every block is received even when an earlier one is missing or
/// malformed, so no sender is left waiting; the first failure is returned.
fn receive_blocks<C: Communicator>(slab: &Slab, comm: &C) -> Result<Vec<Block>, JacobiError> {
    let width = slab.width();
    let mut blocks = Vec::with_capacity(slab.workers - 1);
    let mut first_err = None;

    for rank in 1..slab.workers {
        let peer = Slab::new(slab.dimension, slab.workers, rank)?;
        let rows = contributed_rows(&peer);
        let mut cells = vec![0.0; rows.len() * width];
        let mut posted = vec![0u8; cell_bytes(cells.len())];
        let res = comm
            .irecv(rank, GATHER_TAG.as_u16(), &mut posted)
            .wait()
            .ok_or_else(|| JacobiError::comm(rank, "no slab received"))
            .and_then(|data| {
                copy_cells_into(&mut cells, &data).map_err(|e| JacobiError::comm(rank, e))
            });
        match res {
            Ok(()) => {
                log::debug!("[rank 0] received {} rows from rank {rank}", rows.len());
                blocks.push(Block {
                    first_row: peer.global_row(rows.start),
                    cells,
                });
            }
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(blocks),
    }
}

/// Write the coordinator's own rows followed by the received blocks.
fn write_field<W: Write>(
    local: &LocalSubgrid,
    blocks: &[Block],
    out: &mut W,
) -> std::io::Result<usize> {
    let slab = local.slab();
    let width = slab.width();
    let own = contributed_rows(slab);
    let cells = local.current().row_block(own.clone());
    write_rows(out, cells, width, own.start)?;
    let mut lines = cells.len();
    for block in blocks {
        write_rows(out, &block.cells, width, block.first_row)?;
        lines += block.cells.len();
    }
    out.flush()?;
    Ok(lines)
}

/// Coordinator side: gather every worker's rows and write them to `out` in
/// global row order. Returns the number of lines written.
pub fn gather_to_writer<C: Communicator, W: Write>(
    local: &LocalSubgrid,
    comm: &C,
    out: &mut W,
) -> Result<usize, JacobiError> {
    let blocks = receive_blocks(local.slab(), comm)?;
    write_field(local, &blocks, out).map_err(|source| JacobiError::Io {
        path: PathBuf::new(),
        source,
    })
}

/// Gather the field on worker 0 and write it to `path`; other workers only
/// send. This is the run's only durable output.
///
/// The coordinator receives every block before it opens `path`, so a
/// failure to create or write the file never leaves a sender blocked.
pub fn collect_solution<C: Communicator>(
    local: &LocalSubgrid,
    comm: &C,
    path: &Path,
) -> Result<(), JacobiError> {
    if comm.rank() != 0 {
        return send_to_coordinator(local, comm);
    }
    let blocks = receive_blocks(local.slab(), comm)?;
    let with_path = |source| JacobiError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(with_path)?;
    let lines = write_field(local, &blocks, &mut BufWriter::new(file)).map_err(with_path)?;
    log::info!("wrote {lines} cells to {}", path.display());
    Ok(())
}
