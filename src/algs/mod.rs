//! Re-export public algorithms.

pub mod communicator;
pub mod driver;
pub mod halo;
pub mod stencil;
pub mod wire;

pub use driver::{IterationDriver, Timings};
pub use halo::{ExchangeMode, exchange_blocking, start_exchange};
pub use stencil::evolve;
