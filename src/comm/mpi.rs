//! Feature: Mpi backend
//!
//! rsmpi aborts the job on a failed call, so these methods never
//! return [`FoxError::Communication`] themselves. An error raised
//! locally leaves the other ranks blocked; callers abort the world
//! communicator on any `Err`.
use super::{GridComms, GroupComm};
use crate::error::{FoxError, Result};
use crate::grid::ProcessGrid;
use crate::types::Element;
use crate::utils::try_buffer;
use rsmpi_grid::functions::shift_replace;
use rsmpi_grid::mpi::topology::SimpleCommunicator;
use rsmpi_grid::mpi::traits::{Communicator, Root};
use rsmpi_grid::Grid2d;

/// Group communicator backed by an mpi communicator
pub struct MpiComm {
    comm: SimpleCommunicator,
}

impl MpiComm {
    pub fn new(comm: SimpleCommunicator) -> Self {
        Self { comm }
    }
}

impl GroupComm for MpiComm {
    fn rank(&self) -> usize {
        self.comm.rank() as usize
    }

    fn size(&self) -> usize {
        self.comm.size() as usize
    }

    fn broadcast<T: Element>(&self, root: usize, buf: &mut [T]) -> Result<()> {
        self.comm.process_at_rank(root as i32).broadcast_into(buf);
        Ok(())
    }

    fn scatter<T: Element>(
        &self,
        root: usize,
        send: Option<&[T]>,
        chunk: usize,
    ) -> Result<Vec<T>> {
        let mut recv = try_buffer(chunk)?;
        recv.resize(chunk, T::default());
        let root_process = self.comm.process_at_rank(root as i32);
        if self.rank() == root {
            let send = send.ok_or_else(|| FoxError::comm("scatter root has no send buffer"))?;
            if send.len() != chunk * self.size() {
                return Err(FoxError::comm(format!(
                    "scatter buffer has {} values, expected {}",
                    send.len(),
                    chunk * self.size()
                )));
            }
            root_process.scatter_into_root(send, &mut recv[..]);
        } else {
            root_process.scatter_into(&mut recv[..]);
        }
        Ok(recv)
    }

    fn gather<T: Element>(&self, root: usize, send: &[T]) -> Result<Option<Vec<T>>> {
        let root_process = self.comm.process_at_rank(root as i32);
        if self.rank() == root {
            let total = send
                .len()
                .checked_mul(self.size())
                .ok_or(FoxError::Allocation { elements: usize::MAX })?;
            let mut recv = try_buffer(total)?;
            recv.resize(total, T::default());
            root_process.gather_into_root(send, &mut recv[..]);
            Ok(Some(recv))
        } else {
            root_process.gather_into(send);
            Ok(None)
        }
    }

    fn exchange<T: Element>(&self, dest: usize, source: usize, buf: &mut [T]) -> Result<()> {
        shift_replace(&self.comm, buf, dest, source);
        Ok(())
    }
}

impl GridComms<MpiComm> {
    /// Wrap the communicators of an mpi process grid.
    pub fn from_mpi(grid: ProcessGrid, decomp: Grid2d) -> Result<Self> {
        GridComms::new(
            grid,
            MpiComm::new(decomp.world),
            MpiComm::new(decomp.row),
            MpiComm::new(decomp.col),
        )
    }
}
