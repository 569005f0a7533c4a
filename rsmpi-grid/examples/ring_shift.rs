//! Run with
//!
//! cargo mpirun --np 4 --example ring_shift
use rsmpi_grid::functions::shift_replace;
use rsmpi_grid::mpi::initialize;
use rsmpi_grid::Grid2d;

fn main() {
    let universe = initialize().unwrap();
    let grid = Grid2d::new(&universe, 2).expect("run with 4 processes");
    let q = grid.q;
    let [row, col] = grid.coords;

    // Shift up along the column: send to row - 1, receive from row + 1
    let mut data = vec![(row * q + col) as f64; 3];
    shift_replace(&grid.col, &mut data, (row + q - 1) % q, (row + 1) % q);

    let expected = (((row + 1) % q) * q + col) as f64;
    assert!(data.iter().all(|v| *v == expected));
}
