//! Per-round block communication: skewed pivot broadcast of A along
//! grid rows and ring shift of B along grid columns.
use crate::comm::{GridComms, GroupComm};
use crate::error::{FoxError, Result};
use crate::grid::{pivot_column, shift_destination, shift_source};
use ndarray::Array2;

/// Broadcast the pivot A-block of round `iteration` along this worker's
/// grid row. On return `pivot_a` holds the resident A-block of worker
/// `(row, (row + iteration) mod q)` on every member of the row.
pub fn broadcast_pivot<C: GroupComm>(
    comms: &GridComms<C>,
    iteration: usize,
    resident_a: &Array2<f64>,
    pivot_a: &mut Array2<f64>,
) -> Result<()> {
    let coord = comms.coord();
    let pivot = pivot_column(coord.row, iteration, comms.side());
    if coord.col == pivot {
        pivot_a.assign(resident_a);
    }
    let buf = pivot_a
        .as_slice_mut()
        .ok_or_else(|| FoxError::comm("pivot buffer is not contiguous"))?;
    comms.row().broadcast(pivot, buf)
}

/// Send the current B-block one row up and receive the one from the
/// row below, both along this worker's grid column and in one call.
pub fn ring_shift_b<C: GroupComm>(comms: &GridComms<C>, b: &mut Array2<f64>) -> Result<()> {
    let q = comms.side();
    let row = comms.coord().row;
    let buf = b
        .as_slice_mut()
        .ok_or_else(|| FoxError::comm("B-block buffer is not contiguous"))?;
    comms
        .col()
        .exchange(shift_destination(row, q), shift_source(row, q), buf)
}
