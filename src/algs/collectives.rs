//! Blocking collectives built from pairwise messages.
//!
//! Both operations here are collective: every rank of the communicator must
//! enter them, in the same program order. Self-contributions never touch the
//! transport.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::mesh_error::MeshPlexError;

fn read_u64(neighbor: usize, raw: &[u8]) -> Result<u64, MeshPlexError> {
    if raw.len() != 8 {
        return Err(MeshPlexError::BufferSizeMismatch {
            neighbor,
            expected: 8,
            got: raw.len(),
        });
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(raw);
    Ok(u64::from_le_bytes(bytes))
}

/// Gathers one `u64` from every rank; the result is indexed by rank and
/// identical on all ranks.
pub fn all_gather_u64<C: Communicator>(
    comm: &C,
    tag: CommTag,
    value: u64,
) -> Result<Vec<u64>, MeshPlexError> {
    let rank = comm.rank();
    let size = comm.size();
    let mut out = vec![0u64; size];
    out[rank] = value;

    let mut recvs = Vec::with_capacity(size.saturating_sub(1));
    for peer in 0..size {
        if peer != rank {
            recvs.push((peer, comm.irecv(peer, tag.as_u16(), 8)));
        }
    }
    let bytes = value.to_le_bytes();
    let mut sends = Vec::with_capacity(size.saturating_sub(1));
    for peer in 0..size {
        if peer != rank {
            sends.push(comm.isend(peer, tag.as_u16(), &bytes));
        }
    }
    for (peer, handle) in recvs {
        let raw = handle.wait().ok_or(MeshPlexError::CommError {
            neighbor: peer,
            reason: "all-gather receive returned no data".into(),
        })?;
        out[peer] = read_u64(peer, &raw)?;
    }
    for s in sends {
        let _ = s.wait();
    }
    Ok(out)
}

/// Inclusive prefix sum over one `u64` per rank: rank `r` receives
/// `value_0 + ... + value_r`.
pub fn scan_sum_u64<C: Communicator>(
    comm: &C,
    tag: CommTag,
    value: u64,
) -> Result<u64, MeshPlexError> {
    let gathered = all_gather_u64(comm, tag, value)?;
    Ok(gathered[..=comm.rank()].iter().sum())
}
