//! # Group scoped message passing
//!
//! Every suspension point of the algorithm is one of the four calls of
//! [`GroupComm`]. A call blocks until this worker's part of the exchange
//! is complete; all members of a group must issue the same sequence of
//! collective calls.
//!
//! Backends:
//! - [`LocalComm`]: workers are threads of one process, connected by
//!   channels
//! - `MpiComm` (feature `mpi`): workers are MPI processes
use crate::error::{FoxError, Result};
use crate::grid::{Coord, ProcessGrid};
use crate::types::Element;

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi;

pub use local::{LocalComm, LocalFabric};
#[cfg(feature = "mpi")]
pub use self::mpi::MpiComm;

/// Communicator restricted to one group of workers (world, a grid row
/// or a grid column). Ranks are group ranks in `0..size()`.
pub trait GroupComm {
    /// Rank of this worker inside the group
    fn rank(&self) -> usize;

    /// Number of workers in the group
    fn size(&self) -> usize;

    /// Copy `buf` of member `root` into `buf` of every other member.
    fn broadcast<T: Element>(&self, root: usize, buf: &mut [T]) -> Result<()>;

    /// Member `root` splits `send` into `size()` equal chunks of length
    /// `chunk`; member `i` returns chunk `i`. `send` is only read on root.
    fn scatter<T: Element>(&self, root: usize, send: Option<&[T]>, chunk: usize)
        -> Result<Vec<T>>;

    /// Concatenate `send` of all members in rank order on `root`.
    /// Returns `None` on every other member.
    fn gather<T: Element>(&self, root: usize, send: &[T]) -> Result<Option<Vec<T>>>;

    /// Send `buf` to `dest` and replace it with the buffer received
    /// from `source` in the same call.
    fn exchange<T: Element>(&self, dest: usize, source: usize, buf: &mut [T]) -> Result<()>;
}

/// Everything a worker needs to take part in the grid: its place and
/// the three communicators scoped to world, row and column.
pub struct GridComms<C> {
    grid: ProcessGrid,
    rank: usize,
    coord: Coord,
    world: C,
    row: C,
    col: C,
}

impl<C: GroupComm> GridComms<C> {
    /// Bundle communicators of one worker.
    ///
    /// # Errors
    /// [`FoxError::Configuration`] if the communicators do not describe
    /// this worker's place in `grid`.
    pub fn new(grid: ProcessGrid, world: C, row: C, col: C) -> Result<Self> {
        let q = grid.side();
        if world.size() != grid.workers() {
            return Err(FoxError::config(format!(
                "world has {} workers, grid needs {}",
                world.size(),
                grid.workers()
            )));
        }
        if row.size() != q || col.size() != q {
            return Err(FoxError::config(format!(
                "row and column groups must have {} members, got {} and {}",
                q,
                row.size(),
                col.size()
            )));
        }
        let rank = world.rank();
        let coord = grid.coord_of(rank);
        if row.rank() != coord.col || col.rank() != coord.row {
            return Err(FoxError::config(format!(
                "group ranks ({}, {}) do not match coordinate {}",
                col.rank(),
                row.rank(),
                coord
            )));
        }
        Ok(Self {
            grid,
            rank,
            coord,
            world,
            row,
            col,
        })
    }

    /// Grid topology
    pub fn grid(&self) -> &ProcessGrid {
        &self.grid
    }

    /// Rank in world
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Grid coordinate of this worker
    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// Grid side length
    pub fn side(&self) -> usize {
        self.grid.side()
    }

    /// The coordinator holds the global matrices
    pub fn is_coordinator(&self) -> bool {
        self.rank == 0
    }

    /// Communicator of all workers
    pub fn world(&self) -> &C {
        &self.world
    }

    /// Communicator of this worker's grid row, ranked by column
    pub fn row(&self) -> &C {
        &self.row
    }

    /// Communicator of this worker's grid column, ranked by row
    pub fn col(&self) -> &C {
        &self.col
    }
}
