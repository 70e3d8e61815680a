//! Result output: gathering slabs on the coordinator and dumping the field.

pub mod gnuplot;

pub use gnuplot::{CELL_SPACING, collect_solution, gather_to_writer, send_to_coordinator};
