//! Collection of simplified mpi routines
use mpi::collective::Root;
use mpi::point_to_point::send_receive_replace_into;
use mpi::topology::{Communicator, SimpleCommunicator};
use mpi::traits::Equivalence;

/// Broadcast scalar value from root to all processes
pub fn broadcast_scalar<T: Equivalence>(comm: &SimpleCommunicator, data: &mut T) {
    let root_rank = 0;
    let root_process = comm.process_at_rank(root_rank);
    root_process.broadcast_into(data);
}

/// Send `data` to rank `dest` and replace it with the buffer
/// received from rank `source` (both ranks in `comm`).
///
/// Send and receive are paired, so a ring of processes shifting
/// at the same time does not deadlock.
pub fn shift_replace<T: Equivalence>(
    comm: &SimpleCommunicator,
    data: &mut [T],
    dest: usize,
    source: usize,
) {
    let dest_process = comm.process_at_rank(dest as i32);
    let source_process = comm.process_at_rank(source as i32);
    send_receive_replace_into(data, &dest_process, &source_process);
}
