//! Square process grid with row and column communicators
use mpi::environment::Universe;
use mpi::topology::{Color, Communicator, SimpleCommunicator};

/// Periodic `q x q` arrangement of all processes in the world
/// communicator.
///
/// Ranks are mapped to coordinates in row-major order, i.e.
/// `rank = row * q + col`. Inside the row communicator a process
/// has rank `col`, inside the column communicator rank `row`.
pub struct Grid2d {
    /// World communicator
    pub world: SimpleCommunicator,
    /// Processes sharing this process' row
    pub row: SimpleCommunicator,
    /// Processes sharing this process' column
    pub col: SimpleCommunicator,
    /// Rank in world
    pub nrank: usize,
    /// Number of processes in world
    pub nprocs: usize,
    /// Grid side length
    pub q: usize,
    /// (row, col) of this process
    pub coords: [usize; 2],
}

impl Grid2d {
    /// Build a grid of side `q` from all processes of the universe.
    ///
    /// Returns `None` unless the universe holds exactly `q * q` processes.
    pub fn new(universe: &Universe, q: usize) -> Option<Self> {
        let world = universe.world();
        let nrank = world.rank() as usize;
        let nprocs = world.size() as usize;
        if q == 0 || q.checked_mul(q)? != nprocs {
            return None;
        }
        let coords = [nrank / q, nrank % q];

        let row = world.split_by_color_with_key(
            Color::with_value(coords[0] as i32),
            coords[1] as i32,
        )?;
        let col = world.split_by_color_with_key(
            Color::with_value(coords[1] as i32),
            coords[0] as i32,
        )?;

        Some(Self {
            world,
            row,
            col,
            nrank,
            nprocs,
            q,
            coords,
        })
    }

    /// True on rank 0 of the world communicator
    pub fn is_root(&self) -> bool {
        self.nrank == 0
    }
}
