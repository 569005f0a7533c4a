//! Number traits used throughout the crate
use ndarray::LinalgScalar;
use num_traits::Float;
use std::fmt::Debug;

/// Floating point element of a matrix block
pub trait FloatNum: LinalgScalar + Float + Debug + Send + Sync {}

impl<T> FloatNum for T where T: LinalgScalar + Float + Debug + Send + Sync {}

/// Plain value that can travel through a group communicator.
#[cfg(not(feature = "mpi"))]
pub trait Element: Copy + Default + Send + 'static {}

#[cfg(not(feature = "mpi"))]
impl<T> Element for T where T: Copy + Default + Send + 'static {}

/// Plain value that can travel through a group communicator.
#[cfg(feature = "mpi")]
pub trait Element: Copy + Default + Send + 'static + rsmpi_grid::mpi::traits::Equivalence {}

#[cfg(feature = "mpi")]
impl<T> Element for T where T: Copy + Default + Send + 'static + rsmpi_grid::mpi::traits::Equivalence
{}
