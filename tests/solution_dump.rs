mod util;
use util::*;

use serial_test::serial;
use std::path::PathBuf;

use halo_jacobi::algs::halo::ExchangeMode;
use halo_jacobi::config::RunConfig;
use halo_jacobi::io::CELL_SPACING;
use halo_jacobi::jacobi_error::JacobiError;
use halo_jacobi::run::run_threaded;

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("halo_jacobi_{}_{name}", std::process::id()))
}

#[test]
#[serial]
fn zero_iterations_dump_the_initial_field() {
    let out = scratch("zero_iter.dat");
    let config = RunConfig::new(10, 0, 2, 2).with_workers(3).with_output(&out);
    run_threaded(&config).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let cells = parse_dump(&text);
    let init = initial_field(10);
    assert_eq!(cells.len(), 12 * 12);
    for (k, &(x, y, v)) in cells.iter().enumerate() {
        let (i, j) = (k / 12, k % 12);
        assert!((x - CELL_SPACING * j as f64).abs() < 1e-9, "x of line {k}");
        assert!((y + CELL_SPACING * i as f64).abs() < 1e-9, "y of line {k}");
        assert!((v - init[k]).abs() < 1e-6, "value of line {k}");
    }
    std::fs::remove_file(out).unwrap();
}

#[test]
#[serial]
fn dump_matches_in_memory_field() {
    let out = scratch("field.dat");
    let config = RunConfig::new(7, 15, 0, 0)
        .with_workers(2)
        .with_mode(ExchangeMode::Blocking)
        .with_output(&out);
    run_threaded(&config).unwrap();

    let field = assemble(&run_slabs(7, 2, 15, ExchangeMode::Blocking));
    let cells = parse_dump(&std::fs::read_to_string(&out).unwrap());
    assert_eq!(cells.len(), field.len());
    for (k, (&(_, _, v), want)) in cells.iter().zip(&field).enumerate() {
        assert!((v - want).abs() < 1e-6, "line {k}: {v} vs {want}");
    }
    std::fs::remove_file(out).unwrap();
}

#[test]
#[serial]
fn exactly_one_worker_reports_the_peek() {
    let out = scratch("peek.dat");
    let config = RunConfig::new(9, 20, 6, 4).with_workers(4).with_output(&out);
    let reports = run_threaded(&config).unwrap();
    assert_eq!(
        reports.iter().map(|r| r.rank).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );

    let peeked: Vec<_> = reports.iter().filter_map(|r| r.peek).collect();
    assert_eq!(peeked.len(), 1);
    let field = assemble(&run_slabs(9, 4, 20, ExchangeMode::NonBlocking));
    assert_eq!(peeked[0].value, field[7 * 11 + 5]);
    assert!(reports[2].peek.is_some()); // rows 6..=7 of a 3/2/2/2 split
    assert!(peeked[0].to_string().starts_with("matrix[6,4] = "));
    std::fs::remove_file(out).unwrap();
}

#[test]
#[serial]
fn peek_out_of_range_stops_every_worker() {
    let out = scratch("never.dat");
    let config = RunConfig::new(5, 3, 6, 0).with_workers(2).with_output(&out);
    let res = run_threaded(&config);
    assert!(matches!(res, Err(JacobiError::PeekOutOfRange { row: 6, .. })));
    assert!(!out.exists());
}

#[test]
#[serial]
fn unwritable_output_is_an_io_error() {
    let out = scratch("missing_dir").join("solution.dat");
    let config = RunConfig::new(4, 1, 0, 0).with_workers(2).with_output(&out);
    match run_threaded(&config) {
        Err(JacobiError::Io { path, .. }) => assert_eq!(path, out),
        other => panic!("expected Io error, got {other:?}"),
    }
}
