//! # Fox algorithm
//!
//! Every worker owns four blocks of side `n / q`:
//! - resident A: its own block of A, never moves
//! - pivot A: receives the A-block broadcast along the row
//! - B: replaced by the block of the row below after every round
//! - C: accumulator, the worker's block of the result
//!
//! Round `t` (for `t = 0..q`):
//! 1. the worker at `(r, (r + t) mod q)` broadcasts its A-block along row `r`
//! 2. every worker accumulates `C += pivot_A * B`
//! 3. B-blocks shift one row up along each column
//!
//! After `q` rounds worker `(i, j)` has summed `A(i, k) * B(k, j)` over
//! all `k` and holds block `(i, j)` of the product.
use crate::comm::{GridComms, GroupComm};
use crate::decomp::{gather_checkerboard, scatter_checkerboard};
use crate::error::Result;
use crate::utils::try_zeros;
use ndarray::Array2;
use tracing::{debug, debug_span, trace};

pub mod exchange;
pub mod kernel;

pub use exchange::{broadcast_pivot, ring_shift_b};
pub use kernel::block_multiply_acc;

/// Block buffers of one worker
pub struct FoxBlocks {
    /// Own block of A
    pub resident_a: Array2<f64>,
    /// Block of A broadcast in the current round
    pub pivot_a: Array2<f64>,
    /// Current block of B
    pub b: Array2<f64>,
    /// Accumulated block of C
    pub c: Array2<f64>,
}

impl FoxBlocks {
    /// Set up buffers from the distributed blocks. Pivot and accumulator
    /// start out zero.
    ///
    /// # Errors
    /// [`crate::FoxError::Allocation`] if a buffer cannot be reserved.
    pub fn new(resident_a: Array2<f64>, b: Array2<f64>) -> Result<Self> {
        let bs = resident_a.nrows();
        Ok(Self {
            resident_a,
            pivot_a: try_zeros(bs, bs)?,
            b,
            c: try_zeros(bs, bs)?,
        })
    }

    /// Side length of the blocks
    pub fn block_size(&self) -> usize {
        self.c.nrows()
    }
}

/// Runs the `q` rounds of the Fox schedule on one worker.
pub struct FoxScheduler<'a, C> {
    comms: &'a GridComms<C>,
    blocks: FoxBlocks,
    rounds: usize,
}

impl<'a, C: GroupComm> FoxScheduler<'a, C> {
    pub fn new(comms: &'a GridComms<C>, blocks: FoxBlocks) -> Self {
        Self {
            comms,
            blocks,
            rounds: 0,
        }
    }

    /// Run all rounds. The number of rounds is the grid side length,
    /// whatever the matrix size.
    ///
    /// # Errors
    /// [`crate::FoxError::Communication`] if a broadcast or shift fails.
    pub fn run(&mut self) -> Result<()> {
        let q = self.comms.side();
        for iteration in self.rounds..q {
            broadcast_pivot(
                self.comms,
                iteration,
                &self.blocks.resident_a,
                &mut self.blocks.pivot_a,
            )?;
            block_multiply_acc(&self.blocks.pivot_a, &self.blocks.b, &mut self.blocks.c);
            // the last shift would only feed a round that never happens
            if iteration + 1 < q {
                ring_shift_b(self.comms, &mut self.blocks.b)?;
            }
            self.rounds += 1;
            trace!(iteration, "round complete");
        }
        Ok(())
    }

    /// Number of rounds completed so far
    pub fn rounds_completed(&self) -> usize {
        self.rounds
    }

    /// Hand out the accumulator block
    pub fn into_result(self) -> Array2<f64> {
        self.blocks.c
    }
}

/// Multiply two `n x n` matrices on the grid.
///
/// Every worker of the grid calls this with the same `n`; only the
/// coordinator passes the global matrices. The coordinator gets the
/// product, all other workers get `None`. Block buffers live inside
/// this call and are released on every exit path.
///
/// # Errors
/// - [`crate::FoxError::Configuration`] if `n` does not fit the grid or
///   the coordinator's inputs are not `n x n`
/// - [`crate::FoxError::Allocation`] if a block buffer cannot be reserved
/// - [`crate::FoxError::Communication`] if any exchange fails
pub fn fox_multiply<C: GroupComm>(
    comms: &GridComms<C>,
    a: Option<&Array2<f64>>,
    b: Option<&Array2<f64>>,
    n: usize,
) -> Result<Option<Array2<f64>>> {
    let coord = comms.coord();
    let span = debug_span!("worker", rank = comms.rank(), row = coord.row, col = coord.col);
    let _enter = span.enter();

    comms.grid().block_size(n)?;
    let a_block = scatter_checkerboard(comms, a, n)?;
    let b_block = scatter_checkerboard(comms, b, n)?;
    debug!("blocks distributed");

    let mut scheduler = FoxScheduler::new(comms, FoxBlocks::new(a_block, b_block)?);
    scheduler.run()?;
    debug!(rounds = scheduler.rounds_completed(), "schedule finished");

    gather_checkerboard(comms, &scheduler.into_result(), n)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::comm::LocalFabric;
    use crate::decomp::block_view;
    use crate::grid::{Coord, ProcessGrid};
    use crate::utils::approx_eq;
    use std::thread;

    /// Run `f` on every worker of a `q x q` grid, one thread each
    fn on_grid<F, R>(q: usize, f: F) -> Vec<R>
    where
        F: Fn(&GridComms<crate::comm::LocalComm>) -> R + Sync,
        R: Send,
    {
        let grid = ProcessGrid::new(q * q).unwrap();
        let comms = LocalFabric::build(&grid, None).unwrap();
        thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|c| {
                    let f = &f;
                    s.spawn(move || f(&c))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn test_broadcast_pivot() {
        let q = 3;
        for iteration in 0..q {
            let out = on_grid(q, |c| {
                let mut resident = Array2::<f64>::zeros((2, 2));
                resident.fill(c.rank() as f64);
                let mut pivot = Array2::<f64>::zeros((2, 2));
                broadcast_pivot(c, iteration, &resident, &mut pivot).unwrap();
                (c.coord(), pivot[[0, 0]])
            });
            for (coord, value) in out {
                let pivot_rank = coord.row * q + (coord.row + iteration) % q;
                assert_eq!(value, pivot_rank as f64);
            }
        }
    }

    #[test]
    fn test_ring_shift_cycles_column() {
        let q = 4;
        let out = on_grid(q, |c| {
            let mut b = Array2::<f64>::from_elem((1, 1), c.coord().row as f64);
            let mut seen = vec![b[[0, 0]] as usize];
            for _ in 1..q {
                ring_shift_b(c, &mut b).unwrap();
                seen.push(b[[0, 0]] as usize);
            }
            ring_shift_b(c, &mut b).unwrap();
            (c.coord(), seen, b[[0, 0]] as usize)
        });
        for (coord, seen, last) in out {
            let expected: Vec<usize> = (0..q).map(|t| (coord.row + t) % q).collect();
            assert_eq!(seen, expected);
            // back at the start after q shifts
            assert_eq!(last, coord.row);
        }
    }

    #[test]
    fn test_round_count_is_grid_side() {
        for (q, n) in [(1, 3), (2, 2), (2, 8), (3, 3), (3, 12)] {
            let out = on_grid(q, |c| {
                let bs = n / q;
                let blocks = FoxBlocks::new(
                    Array2::ones((bs, bs)),
                    Array2::ones((bs, bs)),
                )
                .unwrap();
                let mut scheduler = FoxScheduler::new(c, blocks);
                scheduler.run().unwrap();
                scheduler.rounds_completed()
            });
            assert!(out.iter().all(|r| *r == q));
        }
    }

    #[test]
    fn test_fox_blocks_match_serial() {
        let (q, n) = (2, 4);
        let a = Array2::from_shape_fn((n, n), |(i, j)| (i + 2 * j) as f64);
        let b = Array2::from_shape_fn((n, n), |(i, j)| (3 * i) as f64 - j as f64);
        let expected = a.dot(&b);
        let out = on_grid(q, |c| {
            let (a_in, b_in) = if c.is_coordinator() {
                (Some(&a), Some(&b))
            } else {
                (None, None)
            };
            fox_multiply(c, a_in, b_in, n).unwrap()
        });
        let result = out[0].as_ref().unwrap();
        approx_eq(result, &expected);
        approx_eq(
            &block_view(result, Coord::new(1, 0), 2).to_owned(),
            &block_view(&expected, Coord::new(1, 0), 2).to_owned(),
        );
        assert!(out[1..].iter().all(Option::is_none));
    }
}
