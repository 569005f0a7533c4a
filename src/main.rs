//! Parallel matrix multiplication (Fox algorithm)
//!
//! Run with
//!
//! cargo run --release -- --size 512 --workers 16 --init random --seed 1
use clap::Parser;
use foxmm::utils::{max_relative_error, print_matrix, serial_multiply};
use foxmm::{FoxConfig, FoxError, InitKind, Initialize};
use ndarray::Array2;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "foxmm", version, about = "Parallel matrix multiplication (Fox algorithm)")]
struct Args {
    /// Size n of the n x n matrices
    #[arg(short, long, default_value_t = 16)]
    size: usize,

    /// Number of workers, must be a perfect square
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Input data
    #[arg(long, value_enum, default_value_t = InitKind::Dummy)]
    init: InitKind,

    /// Seed for random input data
    #[arg(long)]
    seed: Option<u64>,

    /// Relative tolerance against the sequential product
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,

    /// Print matrices up to this size
    #[arg(long, default_value_t = 10)]
    display_threshold: usize,

    /// Fail a blocking receive after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run as one process of an mpi job, the worker count is the job size
    #[cfg(feature = "mpi")]
    #[arg(long)]
    mpi: bool,
}

impl Args {
    fn config(&self) -> FoxConfig {
        FoxConfig {
            workers: self.workers,
            size: self.size,
            init: self.init,
            seed: self.seed,
            display_threshold: self.display_threshold,
            tolerance: self.tolerance,
            comm_timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}

fn setup_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(&args.log_level);

    #[cfg(feature = "mpi")]
    let outcome = if args.mpi {
        run_mpi(args.config())
    } else {
        run_local(&args.config())
    };
    #[cfg(not(feature = "mpi"))]
    let outcome = run_local(&args.config());

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Generate both inputs on the coordinator
fn inputs(config: &FoxConfig) -> (Array2<f64>, Array2<f64>) {
    let (init_a, init_b) = config.initializer().pair();
    let a = init_a.generate(config.size);
    let b = init_b.generate(config.size);
    if config.display() {
        println!("Matrix A:");
        print_matrix(&a);
        println!("Matrix B:");
        print_matrix(&b);
    }
    (a, b)
}

/// Print and check the product, true if it matches the sequential one
fn report(
    config: &FoxConfig,
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    elapsed: Duration,
) -> bool {
    if config.display() {
        println!("Result matrix:");
        print_matrix(c);
    }
    println!("Execution time: {:.6} seconds", elapsed.as_secs_f64());
    let err = max_relative_error(c, &serial_multiply(a, b));
    if err <= config.tolerance {
        println!("The results of serial and parallel algorithms are identical.");
        true
    } else {
        println!(
            "The results of serial and parallel algorithms are NOT identical (max relative error {:e}).",
            err
        );
        false
    }
}

fn run_local(config: &FoxConfig) -> Result<bool, FoxError> {
    let grid = config.validate()?;
    info!(
        workers = config.workers,
        size = config.size,
        init = %config.init,
        "parallel matrix multiplication (Fox algorithm)"
    );
    let (a, b) = inputs(config);

    let start = Instant::now();
    let c = foxmm::multiply_with(&grid, &a, &b, config.size, config.comm_timeout)?;
    let elapsed = start.elapsed();

    foxmm::shutdown(grid);
    Ok(report(config, &a, &b, &c, elapsed))
}

/// Hand `result` back after reporting an error through `abort`.
///
/// Under mpi, `abort` tears down the whole job: a rank that leaves the
/// schedule early would otherwise leave its partners blocked forever.
#[cfg_attr(not(feature = "mpi"), allow(dead_code))]
fn abort_on_error<T, F>(result: Result<T, FoxError>, abort: F) -> Result<T, FoxError>
where
    F: FnOnce(&FoxError),
{
    if let Err(e) = &result {
        abort(e);
    }
    result
}

#[cfg(feature = "mpi")]
fn run_mpi(config: FoxConfig) -> Result<bool, FoxError> {
    use foxmm::ProcessGrid;
    use rsmpi_grid::mpi::traits::Communicator;
    use rsmpi_grid::Grid2d;

    let universe = rsmpi_grid::mpi::initialize()
        .ok_or_else(|| FoxError::Communication("mpi already initialized".into()))?;
    let world = universe.world();
    // identical on every rank, no partner is left waiting
    let grid = ProcessGrid::new(world.size() as usize)?;
    let decomp = Grid2d::new(&universe, grid.side()).ok_or_else(|| {
        FoxError::Communication("could not split the world into grid rows and columns".into())
    })?;

    let rank = world.rank();
    abort_on_error(run_on_grid(config, grid, decomp), |e| {
        error!(rank, error = %e, "aborting mpi job");
        world.abort(1)
    })
}

#[cfg(feature = "mpi")]
fn run_on_grid(
    mut config: FoxConfig,
    grid: foxmm::ProcessGrid,
    decomp: rsmpi_grid::Grid2d,
) -> Result<bool, FoxError> {
    use foxmm::GridComms;
    use rsmpi_grid::functions::broadcast_scalar;

    config.workers = grid.workers();

    // every process uses the coordinator's matrix size
    let mut size = config.size as u64;
    broadcast_scalar(&decomp.world, &mut size);
    config.size = size as usize;
    config.validate()?;

    let comms = GridComms::from_mpi(grid, decomp)?;
    let (a, b) = if comms.is_coordinator() {
        let (a, b) = inputs(&config);
        (Some(a), Some(b))
    } else {
        (None, None)
    };

    let start = Instant::now();
    let c = foxmm::fox_multiply(&comms, a.as_ref(), b.as_ref(), config.size)?;
    let elapsed = start.elapsed();

    match (a, b, c) {
        (Some(a), Some(b), Some(c)) => Ok(report(&config, &a, &b, &c, elapsed)),
        _ => Ok(true),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_abort_on_error() {
        let aborted = Cell::new(0);
        let ok = abort_on_error(Ok::<_, FoxError>(3), |_| aborted.set(aborted.get() + 1));
        assert_eq!(ok.unwrap(), 3);
        assert_eq!(aborted.get(), 0);

        let failed = abort_on_error(Err::<(), _>(FoxError::Allocation { elements: 8 }), |e| {
            assert!(matches!(e, FoxError::Allocation { elements: 8 }));
            aborted.set(aborted.get() + 1);
        });
        assert!(failed.is_err());
        assert_eq!(aborted.get(), 1);
    }
}
