#![allow(dead_code)]
use halo_jacobi::{
    algs::communicator::{HaloTags, ThreadComm},
    algs::driver::IterationDriver,
    algs::halo::ExchangeMode,
    data::subgrid::LocalSubgrid,
    decomposition::{Slab, decompose},
};

/// Run `iterations` sweeps on `workers` threads and hand back every slab.
pub fn run_slabs(
    dimension: usize,
    workers: usize,
    iterations: usize,
    mode: ExchangeMode,
) -> Vec<LocalSubgrid> {
    run_slabs_tagged(dimension, workers, iterations, mode, HaloTags::default())
}

/// As [`run_slabs`], with explicit halo tags.
pub fn run_slabs_tagged(
    dimension: usize,
    workers: usize,
    iterations: usize,
    mode: ExchangeMode,
    tags: HaloTags,
) -> Vec<LocalSubgrid> {
    let slabs = decompose(dimension, workers).unwrap();
    let world = ThreadComm::world(workers);
    std::thread::scope(|s| {
        let handles: Vec<_> = world
            .into_iter()
            .zip(slabs)
            .map(|(comm, slab)| {
                s.spawn(move || {
                    let mut local = LocalSubgrid::new(slab);
                    IterationDriver::new(&comm, mode)
                        .with_tags(tags)
                        .run(&mut local, iterations)
                        .unwrap();
                    local
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Stitch slabs back into the `(D + 2) × (D + 2)` global field, row-major.
pub fn assemble(locals: &[LocalSubgrid]) -> Vec<f64> {
    let mut field = Vec::new();
    for local in locals {
        let slab = local.slab();
        let start = if slab.is_first() { 0 } else { 1 };
        let end = if slab.is_last() { slab.rows + 2 } else { slab.rows + 1 };
        field.extend_from_slice(local.current().row_block(start..end));
    }
    field
}

/// Initial global field, from a single-worker slab.
pub fn initial_field(dimension: usize) -> Vec<f64> {
    let local = LocalSubgrid::new(Slab::new(dimension, 1, 0).unwrap());
    local.current().as_slice().to_vec()
}

/// Parse a solution dump into `(x, y, value)` triples.
pub fn parse_dump(text: &str) -> Vec<(f64, f64, f64)> {
    text.lines()
        .map(|line| {
            let f: Vec<f64> = line
                .split_whitespace()
                .map(|t| t.parse().unwrap())
                .collect();
            assert_eq!(f.len(), 3, "bad line {line:?}");
            (f[0], f[1], f[2])
        })
        .collect()
}
