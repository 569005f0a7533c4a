//! # rsmpi-grid
//! Two-dimensional process grids on top of rsmpi.
//!
//! The world communicator is arranged as a periodic `q x q` grid
//! and split into one communicator per grid row and one per grid
//! column.
//!
//! Run the examples with
//!
//! cargo mpirun --np 4 --example ring_shift
pub mod functions;
pub mod grid;
pub use grid::Grid2d;
pub use mpi;
