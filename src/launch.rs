//! # Host runtime
//!
//! Runs the grid inside the current process: one thread per worker,
//! connected by a [`LocalFabric`]. All workers execute
//! [`fox_multiply`]; the call returns once every one of them is done.
use crate::comm::LocalFabric;
use crate::error::{FoxError, Result};
use crate::fox::fox_multiply;
use crate::grid::ProcessGrid;
use ndarray::Array2;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Build the process grid for `workers` workers.
///
/// # Errors
/// [`FoxError::Configuration`] if `workers` is not a perfect square.
pub fn initialize_grid(workers: usize) -> Result<ProcessGrid> {
    let grid = ProcessGrid::new(workers)?;
    info!(workers, side = grid.side(), "process grid ready");
    Ok(grid)
}

/// Multiply `a * b` on `grid`. See [`multiply_with`].
pub fn multiply(
    grid: &ProcessGrid,
    a: &Array2<f64>,
    b: &Array2<f64>,
    n: usize,
) -> Result<Array2<f64>> {
    multiply_with(grid, a, b, n, None)
}

/// Multiply `a * b` on `grid`, bounding every blocking receive by
/// `timeout` if given.
///
/// The configuration is checked before any worker starts. The product is
/// returned only if every worker succeeds. When several workers fail,
/// the most fundamental error is reported: configuration before
/// allocation before communication, lower ranks first.
///
/// # Errors
/// [`FoxError`] of the failing worker, or
/// [`FoxError::Communication`] if a worker panicked.
pub fn multiply_with(
    grid: &ProcessGrid,
    a: &Array2<f64>,
    b: &Array2<f64>,
    n: usize,
    timeout: Option<Duration>,
) -> Result<Array2<f64>> {
    grid.block_size(n)?;
    for (name, m) in [("A", a), ("B", b)] {
        if m.dim() != (n, n) {
            return Err(FoxError::config(format!(
                "matrix {} must be {}x{}, got {:?}",
                name,
                n,
                n,
                m.dim()
            )));
        }
    }

    let comms = LocalFabric::build(grid, timeout)?;
    debug!(workers = comms.len(), n, "starting workers");

    let results: Vec<Result<Option<Array2<f64>>>> = thread::scope(|s| {
        let handles = comms
            .into_iter()
            .map(|c| {
                let (a_in, b_in) = if c.is_coordinator() {
                    (Some(a), Some(b))
                } else {
                    (None, None)
                };
                thread::Builder::new()
                    .name(format!("fox-worker-{}", c.rank()))
                    .spawn_scoped(s, move || {
                        let result = fox_multiply(&c, a_in, b_in, n);
                        if let Err(e) = &result {
                            warn!(rank = c.rank(), error = %e, "worker failed");
                        }
                        result
                    })
            })
            .collect::<std::io::Result<Vec<_>>>();
        match handles {
            Ok(handles) => handles
                .into_iter()
                .enumerate()
                .map(|(rank, h)| {
                    h.join().unwrap_or_else(|_| {
                        Err(FoxError::comm(format!("worker {} panicked", rank)))
                    })
                })
                .collect(),
            Err(e) => vec![Err(FoxError::comm(format!("could not start worker: {}", e)))],
        }
    });

    collect_product(results)
}

/// Release the grid. Communicators of the in-process backend live only
/// for the duration of one [`multiply`], so nothing else is left.
pub fn shutdown(grid: ProcessGrid) {
    debug!(workers = grid.workers(), "process grid released");
}

fn severity(e: &FoxError) -> u8 {
    match e {
        FoxError::Configuration(_) => 0,
        FoxError::Allocation { .. } => 1,
        FoxError::Communication(_) => 2,
    }
}

/// Product of the coordinator, or the most fundamental error of any worker
fn collect_product(results: Vec<Result<Option<Array2<f64>>>>) -> Result<Array2<f64>> {
    let mut product = None;
    let mut error: Option<FoxError> = None;
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(Some(c)) if rank == 0 => product = Some(c),
            Ok(_) => {}
            Err(e) => {
                if error.as_ref().map_or(true, |prev| severity(&e) < severity(prev)) {
                    error = Some(e);
                }
            }
        }
    }
    if let Some(e) = error {
        return Err(e);
    }
    product.ok_or_else(|| FoxError::comm("coordinator returned no product"))
}
