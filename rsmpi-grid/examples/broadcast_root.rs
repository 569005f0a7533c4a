//! Run with
//!
//! cargo mpirun --np 4 --example broadcast_root
use rsmpi_grid::functions::broadcast_scalar;
use rsmpi_grid::mpi::initialize;
use rsmpi_grid::mpi::traits::Communicator;
use rsmpi_grid::Grid2d;

fn main() {
    let universe = initialize().unwrap();
    let grid = Grid2d::new(&universe, 2).expect("run with 4 processes");

    // world
    let mut x = if grid.is_root() { 1000.4 } else { 0. };
    broadcast_scalar(&grid.world, &mut x);
    assert_eq!(x, 1000.4);

    // every row broadcasts from its first column
    let mut row_id = if grid.coords[1] == 0 {
        grid.coords[0] as u64
    } else {
        u64::MAX
    };
    broadcast_scalar(&grid.row, &mut row_id);
    assert_eq!(row_id, grid.coords[0] as u64);
    assert_eq!(grid.row.size() as usize, grid.q);
}
