//! halo-jacobi command-line interface.
//!
//! ```sh
//! halo-jacobi 100 500 10 10 --workers 4 --mode blocking
//! mpirun -n 4 halo-jacobi 100 500 10 10 --mpi   # feature mpi-support
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use halo_jacobi::algs::halo::ExchangeMode;
use halo_jacobi::config::{DEFAULT_OUTPUT, RunConfig};
use halo_jacobi::run::{WorkerReport, run_threaded};

#[derive(Parser, Debug)]
#[command(name = "halo-jacobi")]
#[command(about = "Distributed Jacobi solver for the 2D Laplace equation")]
#[command(version)]
struct Args {
    /// Interior grid dimension.
    dimension: usize,

    /// Number of Jacobi iterations.
    iterations: usize,

    /// Row of the cell printed for verification.
    row: usize,

    /// Column of the cell printed for verification.
    col: usize,

    /// Worker threads, default min(2, dimension) (ignored with --mpi).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Halo exchange discipline.
    #[arg(short, long, value_enum, default_value_t = ExchangeMode::NonBlocking)]
    mode: ExchangeMode,

    /// Solution dump written by worker 0.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Run as one rank of an MPI job.
    #[cfg(feature = "mpi-support")]
    #[arg(long)]
    mpi: bool,
}

/// Threads used when `--workers` is not given.
const DEFAULT_WORKERS: usize = 2;

fn config_from(args: &Args) -> RunConfig {
    let workers = args
        .workers
        .unwrap_or_else(|| DEFAULT_WORKERS.min(args.dimension).max(1));
    RunConfig::new(args.dimension, args.iterations, args.row, args.col)
        .with_mode(args.mode)
        .with_workers(workers)
        .with_output(&args.output)
}

fn banner(config: &RunConfig) {
    println!("matrix size = {}", config.dimension);
    println!("number of iterations = {}", config.iterations);
    println!("element for checking = Mat[{},{}]", config.peek_row, config.peek_col);
}

fn print_report(report: &WorkerReport) {
    println!("\n{report}\n");
}

#[cfg(feature = "mpi-support")]
fn run_mpi(config: &RunConfig) -> anyhow::Result<()> {
    use halo_jacobi::algs::communicator::{Communicator, MpiComm};
    use halo_jacobi::run::run_worker;

    let comm = MpiComm::new()?;
    if comm.rank() == 0 {
        banner(config);
    }
    let report = run_worker(config, &comm).context("MPI worker failed")?;
    print_report(&report);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = config_from(&args);

    #[cfg(feature = "mpi-support")]
    if args.mpi {
        return run_mpi(&config);
    }

    banner(&config);
    let reports = run_threaded(&config).context("run aborted")?;
    for report in &reports {
        print_report(report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> RunConfig {
        let args = Args::try_parse_from(std::iter::once("halo-jacobi").chain(argv.iter().copied()))
            .unwrap();
        config_from(&args)
    }

    #[test]
    fn default_workers_fit_a_one_row_grid() {
        let config = parse(&["1", "10", "0", "0"]);
        assert_eq!(config.workers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_workers_and_mode() {
        let config = parse(&["100", "5", "3", "4"]);
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.mode, ExchangeMode::NonBlocking);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn explicit_options_are_kept() {
        let config = parse(&["8", "2", "1", "1", "-w", "4", "-m", "blocking", "-o", "x.dat"]);
        assert_eq!(config.workers, 4);
        assert_eq!(config.mode, ExchangeMode::Blocking);
        assert_eq!(config.output, PathBuf::from("x.dat"));
    }

    #[test]
    fn missing_positional_is_rejected() {
        assert!(Args::try_parse_from(["halo-jacobi", "8", "2", "1"]).is_err());
    }
}
