//! # foxmm: dense matrix multiplication on a process grid
//!
//! Implements Fox's algorithm: `q * q` workers are arranged on a
//! periodic `q x q` grid, both matrices are cut into a checkerboard of
//! `q x q` blocks, and in each of `q` rounds a skewed A-block is
//! broadcast along every grid row while the B-blocks shift one row up
//! along every grid column.
//!
//! Workers only talk through [`comm::GroupComm`], scoped to the whole
//! grid, a grid row or a grid column. Two backends are provided:
//! threads connected by channels (default) and mpi processes
//! (feature `mpi`).
//!
//! # Example
//! ```
//! use foxmm::{initialize_grid, multiply, shutdown};
//! use ndarray::Array2;
//!
//! let n = 4;
//! let grid = initialize_grid(4).unwrap();
//! let a = Array2::<f64>::ones((n, n));
//! let b = Array2::<f64>::ones((n, n));
//! let c = multiply(&grid, &a, &b, n).unwrap();
//! assert!(c.iter().all(|v| *v == 4.));
//! shutdown(grid);
//! ```
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
pub mod comm;
pub mod config;
pub mod decomp;
pub mod error;
pub mod fox;
pub mod grid;
pub mod init;
pub mod launch;
pub mod types;
pub mod utils;

pub use comm::{GridComms, GroupComm};
pub use config::{FoxConfig, InitKind};
pub use error::{FoxError, Result};
pub use fox::fox_multiply;
pub use grid::{Coord, ProcessGrid};
pub use init::{DummyInit, Initialize, MatrixInit, RandomInit};
pub use launch::{initialize_grid, multiply, multiply_with, shutdown};
pub use types::FloatNum;
