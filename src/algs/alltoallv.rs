//! Symmetric variable-length all-to-all exchange.
//!
//! An [`AllToAllV`] captures one communication pattern: how many items this
//! rank sends to every peer and how many it receives from every peer, with
//! the matching displacements into a rank-ordered flat buffer. Once built,
//! the same pattern can ship any number of data arrays (`exchange`,
//! `exchange_blocks`), and [`AllToAllV::swap`] reverses the roles so a reply
//! can reuse the pattern without a second count exchange.
//!
//! All methods that touch the transport are blocking and collective on the
//! communicator: every rank must enter them in the same order. The range
//! destined to this rank itself is copied locally and never sent.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::mesh_error::MeshPlexError;
use bytemuck::Pod;

fn displacements(counts: &[usize]) -> Vec<usize> {
    let mut displs = Vec::with_capacity(counts.len() + 1);
    let mut acc = 0usize;
    displs.push(0);
    for &c in counts {
        acc += c;
        displs.push(acc);
    }
    displs
}

/// A reusable, reversible variable-length exchange pattern.
pub struct AllToAllV<'c, C: Communicator> {
    comm: &'c C,
    tag: CommTag,
    send_counts: Vec<usize>,
    send_displs: Vec<usize>,
    recv_counts: Vec<usize>,
    recv_displs: Vec<usize>,
}

impl<'c, C: Communicator> AllToAllV<'c, C> {
    /// Builds the pattern from per-peer send counts; the receive counts are
    /// learned through a count exchange. Collective.
    pub fn new(
        send_counts: Vec<usize>,
        comm: &'c C,
        tag: CommTag,
    ) -> Result<Self, MeshPlexError> {
        let rank = comm.rank();
        let size = comm.size();
        if send_counts.len() != size {
            return Err(MeshPlexError::CountMismatch {
                expected: size,
                got: send_counts.len(),
            });
        }
        let mut recv_counts = vec![0usize; size];
        recv_counts[rank] = send_counts[rank];

        let mut recvs = Vec::with_capacity(size.saturating_sub(1));
        for peer in 0..size {
            if peer != rank {
                recvs.push((peer, comm.irecv(peer, tag.as_u16(), 8)));
            }
        }
        let mut sends = Vec::with_capacity(size.saturating_sub(1));
        for peer in 0..size {
            if peer != rank {
                let count = send_counts[peer] as u64;
                sends.push(comm.isend(peer, tag.as_u16(), &count.to_le_bytes()));
            }
        }
        for (peer, handle) in recvs {
            let raw = handle.wait().ok_or(MeshPlexError::CommError {
                neighbor: peer,
                reason: "count exchange returned no data".into(),
            })?;
            if raw.len() != 8 {
                return Err(MeshPlexError::BufferSizeMismatch {
                    neighbor: peer,
                    expected: 8,
                    got: raw.len(),
                });
            }
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&raw);
            recv_counts[peer] = u64::from_le_bytes(bytes) as usize;
        }
        for s in sends {
            let _ = s.wait();
        }

        Ok(Self::from_counts(send_counts, recv_counts, comm, tag)?)
    }

    /// Builds the pattern when both sides of the counts are already known.
    /// No communication happens here.
    pub fn from_counts(
        send_counts: Vec<usize>,
        recv_counts: Vec<usize>,
        comm: &'c C,
        tag: CommTag,
    ) -> Result<Self, MeshPlexError> {
        let size = comm.size();
        if send_counts.len() != size || recv_counts.len() != size {
            return Err(MeshPlexError::CountMismatch {
                expected: size,
                got: send_counts.len().min(recv_counts.len()),
            });
        }
        let send_displs = displacements(&send_counts);
        let recv_displs = displacements(&recv_counts);
        Ok(AllToAllV {
            comm,
            tag,
            send_counts,
            send_displs,
            recv_counts,
            recv_displs,
        })
    }

    /// Total number of items this rank sends.
    pub fn total_send(&self) -> usize {
        *self.send_displs.last().unwrap_or(&0)
    }

    /// Total number of items this rank receives.
    pub fn total_recv(&self) -> usize {
        *self.recv_displs.last().unwrap_or(&0)
    }

    /// Swaps the send and receive roles so the next `exchange` travels in
    /// the opposite direction over the same pattern.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.send_counts, &mut self.recv_counts);
        std::mem::swap(&mut self.send_displs, &mut self.recv_displs);
    }

    /// `(peer, index)` pairs describing the send buffer: the item at
    /// `index` travels to `peer`. Pairs are emitted in buffer order.
    pub fn send_slots(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let displs = &self.send_displs;
        (0..self.send_counts.len())
            .flat_map(move |p| (displs[p]..displs[p + 1]).map(move |i| (p, i)))
    }

    /// `(peer, index)` pairs describing the receive buffer: the item at
    /// `index` originated at `peer`. Pairs are emitted in buffer order.
    pub fn recv_slots(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let displs = &self.recv_displs;
        (0..self.recv_counts.len())
            .flat_map(move |p| (displs[p]..displs[p + 1]).map(move |i| (p, i)))
    }

    /// Exchanges one item of `T` per counted slot.
    pub fn exchange<T: Pod>(&self, data: &[T]) -> Result<Vec<T>, MeshPlexError> {
        self.exchange_blocks(data, 1)
    }

    /// Exchanges fixed-size blocks of `width` items of `T` per counted slot;
    /// `data` must hold exactly `total_send() * width` items and the result
    /// holds `total_recv() * width`, both in rank order.
    pub fn exchange_blocks<T: Pod>(
        &self,
        data: &[T],
        width: usize,
    ) -> Result<Vec<T>, MeshPlexError> {
        let rank = self.comm.rank();
        let size = self.comm.size();
        if data.len() != self.total_send() * width {
            return Err(MeshPlexError::CountMismatch {
                expected: self.total_send() * width,
                got: data.len(),
            });
        }
        let item = std::mem::size_of::<T>();
        let mut out = vec![T::zeroed(); self.total_recv() * width];

        // local copy for the self-destined range
        let self_n = self.send_counts[rank] * width;
        if self_n > 0 {
            let src = self.send_displs[rank] * width;
            let dst = self.recv_displs[rank] * width;
            out[dst..dst + self_n].copy_from_slice(&data[src..src + self_n]);
        }

        let payload_tag = self.tag.offset(1).as_u16();
        let mut recvs = Vec::new();
        for peer in 0..size {
            let n = self.recv_counts[peer] * width;
            if peer != rank && n > 0 {
                recvs.push((peer, self.comm.irecv(peer, payload_tag, n * item)));
            }
        }
        let mut sends = Vec::new();
        for peer in 0..size {
            let n = self.send_counts[peer] * width;
            if peer != rank && n > 0 {
                let lo = self.send_displs[peer] * width;
                let bytes = bytemuck::cast_slice(&data[lo..lo + n]);
                sends.push(self.comm.isend(peer, payload_tag, bytes));
            }
        }
        for (peer, handle) in recvs {
            let raw = handle.wait().ok_or(MeshPlexError::CommError {
                neighbor: peer,
                reason: "payload exchange returned no data".into(),
            })?;
            let n = self.recv_counts[peer] * width;
            if raw.len() != n * item {
                return Err(MeshPlexError::BufferSizeMismatch {
                    neighbor: peer,
                    expected: n * item,
                    got: raw.len(),
                });
            }
            let lo = self.recv_displs[peer] * width;
            bytemuck::cast_slice_mut(&mut out[lo..lo + n]).copy_from_slice(&raw);
        }
        for s in sends {
            let _ = s.wait();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, ThreadComm};

    #[test]
    fn serial_exchange_is_a_copy() {
        let comm = NoComm;
        let a2a = AllToAllV::new(vec![3], &comm, CommTag::new(0x300)).unwrap();
        assert_eq!(a2a.total_send(), 3);
        assert_eq!(a2a.total_recv(), 3);
        let out = a2a.exchange::<u64>(&[7, 8, 9]).unwrap();
        assert_eq!(out, vec![7, 8, 9]);
        let blocks = a2a.exchange_blocks::<u64>(&[1, 2, 3, 4, 5, 6], 2).unwrap();
        assert_eq!(blocks, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let comm = NoComm;
        let a2a = AllToAllV::new(vec![2], &comm, CommTag::new(0x304)).unwrap();
        assert!(matches!(
            a2a.exchange::<u64>(&[1]),
            Err(MeshPlexError::CountMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn slot_iterators_mirror_displacements() {
        let comm = NoComm;
        let a2a = AllToAllV::from_counts(vec![2], vec![2], &comm, CommTag::new(0x306)).unwrap();
        let slots: Vec<_> = a2a.send_slots().collect();
        assert_eq!(slots, vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn two_rank_exchange_swap_and_reply() {
        let handles: Vec<_> = (0..2)
            .map(|r| {
                std::thread::spawn(move || {
                    let comm = ThreadComm::new(r, 2);
                    // rank 0 sends [10, 11] to rank 1; rank 1 sends [20] to rank 0
                    let send_counts = if r == 0 { vec![0, 2] } else { vec![1, 0] };
                    let data: Vec<u64> = if r == 0 { vec![10, 11] } else { vec![20] };
                    let mut a2a = AllToAllV::new(send_counts, &comm, CommTag::new(0x310)).unwrap();
                    let got = a2a.exchange::<u64>(&data).unwrap();
                    // reply: echo each received value incremented
                    a2a.swap();
                    let reply: Vec<u64> = got.iter().map(|v| v + 1).collect();
                    let answer = a2a.exchange::<u64>(&reply).unwrap();
                    (got, answer)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0].0, vec![20]);
        assert_eq!(results[0].1, vec![11, 12]);
        assert_eq!(results[1].0, vec![10, 11]);
        assert_eq!(results[1].1, vec![21]);
    }

    #[test]
    fn recv_slots_name_the_origin_rank() {
        let handles: Vec<_> = (0..3)
            .map(|r| {
                std::thread::spawn(move || {
                    let comm = ThreadComm::new(r, 3);
                    // every rank sends its rank id once to every peer
                    let send_counts = vec![1; 3];
                    let data = vec![r as u64; 3];
                    let a2a = AllToAllV::new(send_counts, &comm, CommTag::new(0x320)).unwrap();
                    let got = a2a.exchange::<u64>(&data).unwrap();
                    let origins: Vec<usize> = a2a.recv_slots().map(|(p, _)| p).collect();
                    (got, origins)
                })
            })
            .collect();
        for h in handles {
            let (got, origins) = h.join().unwrap();
            assert_eq!(got, vec![0, 1, 2]);
            assert_eq!(origins, vec![0, 1, 2]);
        }
    }
}
