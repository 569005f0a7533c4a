//! In-process backend: every worker is a thread, every ordered pair of
//! group members is connected by its own unbounded FIFO channel.
//!
//! Sends never block, receives block until the partner's message has
//! arrived. Since all members of a group issue collective calls in the
//! same order, per-pair FIFO order is enough to match messages.
//!
//! A worker that returns early drops its endpoints. Its partners then
//! see a disconnected channel and fail with
//! [`FoxError::Communication`] instead of waiting forever.
use super::{GridComms, GroupComm};
use crate::error::{FoxError, Result};
use crate::grid::{Coord, ProcessGrid};
use crate::types::Element;
use crate::utils::{try_buffer, try_copy};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::time::Duration;

type Message = Box<dyn Any + Send>;

/// Channel based communicator of one group member
pub struct LocalComm {
    rank: usize,
    /// `senders[j]` delivers to member `j`
    senders: Vec<Sender<Message>>,
    /// `receivers[i]` holds messages from member `i`
    receivers: Vec<Receiver<Message>>,
    timeout: Option<Duration>,
}

impl LocalComm {
    /// Fully connected group of `size` members, returned in rank order.
    pub fn group(size: usize, timeout: Option<Duration>) -> Vec<LocalComm> {
        // channels[i][j] carries messages from i to j
        let mut channels: Vec<Vec<Option<(Sender<Message>, Receiver<Message>)>>> = (0..size)
            .map(|_| (0..size).map(|_| Some(unbounded())).collect())
            .collect();
        let mut senders: Vec<Vec<Sender<Message>>> = vec![Vec::with_capacity(size); size];
        let mut receivers: Vec<Vec<Receiver<Message>>> = vec![Vec::with_capacity(size); size];
        for (i, row) in channels.iter_mut().enumerate() {
            for (j, slot) in row.iter_mut().enumerate() {
                if let Some((tx, rx)) = slot.take() {
                    senders[i].push(tx);
                    receivers[j].push(rx);
                }
            }
        }
        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (senders, receivers))| LocalComm {
                rank,
                senders,
                receivers,
                timeout,
            })
            .collect()
    }

    fn send<T: Element>(&self, dest: usize, data: Vec<T>) -> Result<()> {
        let tx = self
            .senders
            .get(dest)
            .ok_or_else(|| FoxError::comm(format!("no group member with rank {}", dest)))?;
        tx.send(Box::new(data)).map_err(|_| {
            FoxError::comm(format!(
                "member {} hung up before receiving from {}",
                dest, self.rank
            ))
        })
    }

    fn recv<T: Element>(&self, source: usize) -> Result<Vec<T>> {
        let rx = self
            .receivers
            .get(source)
            .ok_or_else(|| FoxError::comm(format!("no group member with rank {}", source)))?;
        let msg = match self.timeout {
            None => rx.recv().map_err(|_| {
                FoxError::comm(format!(
                    "member {} hung up before sending to {}",
                    source, self.rank
                ))
            })?,
            Some(timeout) => rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => FoxError::comm(format!(
                    "member {} timed out after {:?} waiting for {}",
                    self.rank, timeout, source
                )),
                RecvTimeoutError::Disconnected => FoxError::comm(format!(
                    "member {} hung up before sending to {}",
                    source, self.rank
                )),
            })?,
        };
        msg.downcast::<Vec<T>>()
            .map(|data| *data)
            .map_err(|_| FoxError::comm(format!("unexpected message type from {}", source)))
    }

    fn recv_into<T: Element>(&self, source: usize, buf: &mut [T]) -> Result<()> {
        let data = self.recv::<T>(source)?;
        if data.len() != buf.len() {
            return Err(FoxError::comm(format!(
                "expected {} values from {}, got {}",
                buf.len(),
                source,
                data.len()
            )));
        }
        buf.copy_from_slice(&data);
        Ok(())
    }
}

impl GroupComm for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn broadcast<T: Element>(&self, root: usize, buf: &mut [T]) -> Result<()> {
        if self.rank == root {
            for dest in (0..self.size()).filter(|&d| d != root) {
                self.send(dest, try_copy(buf)?)?;
            }
            Ok(())
        } else {
            self.recv_into(root, buf)
        }
    }

    fn scatter<T: Element>(
        &self,
        root: usize,
        send: Option<&[T]>,
        chunk: usize,
    ) -> Result<Vec<T>> {
        if self.rank != root {
            let mut recv = try_buffer(chunk)?;
            recv.resize(chunk, T::default());
            self.recv_into(root, &mut recv)?;
            return Ok(recv);
        }
        let send = send.ok_or_else(|| FoxError::comm("scatter root has no send buffer"))?;
        if send.len() != chunk * self.size() {
            return Err(FoxError::comm(format!(
                "scatter buffer has {} values, expected {}",
                send.len(),
                chunk * self.size()
            )));
        }
        let mut own = Vec::new();
        for dest in 0..self.size() {
            let part = &send[dest * chunk..(dest + 1) * chunk];
            if dest == root {
                own = try_copy(part)?;
            } else {
                self.send(dest, try_copy(part)?)?;
            }
        }
        Ok(own)
    }

    fn gather<T: Element>(&self, root: usize, send: &[T]) -> Result<Option<Vec<T>>> {
        if self.rank != root {
            self.send(root, try_copy(send)?)?;
            return Ok(None);
        }
        let total = send
            .len()
            .checked_mul(self.size())
            .ok_or(FoxError::Allocation { elements: usize::MAX })?;
        let mut recv = try_buffer(total)?;
        for source in 0..self.size() {
            if source == root {
                recv.extend_from_slice(send);
            } else {
                let data = self.recv::<T>(source)?;
                if data.len() != send.len() {
                    return Err(FoxError::comm(format!(
                        "expected {} values from {}, got {}",
                        send.len(),
                        source,
                        data.len()
                    )));
                }
                recv.extend(data);
            }
        }
        Ok(Some(recv))
    }

    fn exchange<T: Element>(&self, dest: usize, source: usize, buf: &mut [T]) -> Result<()> {
        self.send(dest, try_copy(buf)?)?;
        self.recv_into(source, buf)
    }
}

/// Wires up the communicators of all workers of a grid.
pub struct LocalFabric;

impl LocalFabric {
    /// Returns one [`GridComms`] per worker, in rank order.
    pub fn build(
        grid: &ProcessGrid,
        timeout: Option<Duration>,
    ) -> Result<Vec<GridComms<LocalComm>>> {
        let q = grid.side();
        let p = grid.workers();

        let mut world: Vec<Option<LocalComm>> =
            LocalComm::group(p, timeout).into_iter().map(Some).collect();
        let mut rows: Vec<Option<LocalComm>> = (0..p).map(|_| None).collect();
        let mut cols: Vec<Option<LocalComm>> = (0..p).map(|_| None).collect();
        for r in 0..q {
            for (col, comm) in LocalComm::group(q, timeout).into_iter().enumerate() {
                rows[grid.rank_of(Coord::new(r, col))] = Some(comm);
            }
        }
        for c in 0..q {
            for (row, comm) in LocalComm::group(q, timeout).into_iter().enumerate() {
                cols[grid.rank_of(Coord::new(row, c))] = Some(comm);
            }
        }

        let mut comms = Vec::with_capacity(p);
        for rank in 0..p {
            match (world[rank].take(), rows[rank].take(), cols[rank].take()) {
                (Some(w), Some(r), Some(c)) => comms.push(GridComms::new(grid.clone(), w, r, c)?),
                _ => {
                    return Err(FoxError::config(format!(
                        "rank {} is missing a communicator",
                        rank
                    )))
                }
            }
        }
        Ok(comms)
    }
}
