//! Grid storage and boundary rules.

pub mod boundary;
pub mod subgrid;

pub use boundary::BoundaryRamp;
pub use subgrid::{DoubleBuffer, LocalSubgrid, Subgrid};
