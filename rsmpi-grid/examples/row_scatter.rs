//! Run with
//!
//! cargo mpirun --np 4 --example row_scatter
use ndarray::Array2;
use rsmpi_grid::mpi::initialize;
use rsmpi_grid::mpi::traits::{Communicator, Root};
use rsmpi_grid::Grid2d;

fn main() {
    let universe = initialize().unwrap();
    let grid = Grid2d::new(&universe, 2).expect("run with 4 processes");
    let q = grid.q;
    let [row, col] = grid.coords;

    // First column of each row holds one value per column
    let global: Array2<f64> = Array2::from_shape_fn((q, q), |(i, j)| (i * q + j) as f64);
    let root = grid.row.process_at_rank(0);
    let mut rcv = 0.;
    if col == 0 {
        let send = global.row(row).to_vec();
        root.scatter_into_root(&send[..], &mut rcv);
    } else {
        root.scatter_into(&mut rcv);
    }
    assert_eq!(rcv, global[[row, col]]);
    assert_eq!(grid.col.rank() as usize, row);
}
