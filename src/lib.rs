//! # halo-jacobi
//!
//! halo-jacobi relaxes the 2D Laplace equation to steady state with the
//! Jacobi five-point stencil, distributed over a fixed set of workers that
//! each own a contiguous horizontal slab of the grid.
//!
//! ## Pipeline
//! - [`decomposition`]: deterministic row-wise slabs from `(D, P, rank)`
//! - [`data`]: double-buffered local slab with ghost rows, Dirichlet ramp
//! - [`algs::halo`]: ghost-row exchange, blocking or non-blocking with overlap
//! - [`algs::stencil`]: Jacobi update over a row range, old buffer in, new out
//! - [`algs::driver`]: per-iteration exchange/compute/wait/compute/swap loop
//! - [`io`]: gather on worker 0 and text dump for plotting
//!
//! Communication goes through the [`Communicator`](algs::communicator::Communicator)
//! trait with serial, threaded and (feature `mpi-support`) MPI backends.
//!
//! ## Determinism
//!
//! Boundary values are evaluated from global row indices and every cell is
//! updated with the same expression regardless of how rows are split, so the
//! blocking and non-blocking disciplines, and any worker count, produce
//! bitwise identical fields.
//!
//! ## Usage
//! ```rust
//! # fn main() -> Result<(), halo_jacobi::jacobi_error::JacobiError> {
//! use halo_jacobi::prelude::*;
//!
//! let out = std::env::temp_dir().join("halo_jacobi_doc.dat");
//! let config = RunConfig::new(8, 10, 3, 3).with_workers(2).with_output(&out);
//! let reports = run_threaded(&config)?;
//! assert_eq!(reports.len(), 2);
//! assert_eq!(reports.iter().filter(|r| r.peek.is_some()).count(), 1);
//! # let _ = std::fs::remove_file(out);
//! # Ok(())
//! # }
//! ```

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod decomposition;
pub mod io;
pub mod jacobi_error;
pub mod run;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{
        CommTag, Communicator, HaloTags, NoComm, ThreadComm, Wait,
    };
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::driver::{IterationDriver, Timings};
    pub use crate::algs::halo::ExchangeMode;
    pub use crate::config::RunConfig;
    pub use crate::data::subgrid::{LocalSubgrid, Subgrid};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::decomposition::{Neighbors, Slab, decompose};
    pub use crate::jacobi_error::JacobiError;
    pub use crate::run::{WorkerReport, run_threaded, run_worker};
}
