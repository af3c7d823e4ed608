//! Sorted prefix-sum distributions of contiguous global id ranges.
//!
//! A `SortedDistribution` records, for every rank, the half-open range of
//! global ids it owns: rank `r` owns `[dist[r], dist[r+1])`. It is built
//! collectively from each rank's local count and inverted by binary search.

use crate::algs::collectives::all_gather_u64;
use crate::algs::communicator::{CommTag, Communicator};
use crate::mesh_error::MeshPlexError;

/// Monotone prefix sums of per-rank counts; length `procs + 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortedDistribution {
    dist: Vec<u64>,
}

impl SortedDistribution {
    /// Collectively builds the distribution `[0, n_0, n_0+n_1, ...]` from
    /// this rank's local count. All ranks of the communicator must call this
    /// together.
    pub fn from_local_count<C: Communicator>(
        comm: &C,
        tag: CommTag,
        local: u64,
    ) -> Result<Self, MeshPlexError> {
        let counts = all_gather_u64(comm, tag, local)?;
        let mut dist = Vec::with_capacity(counts.len() + 1);
        let mut acc = 0u64;
        dist.push(0);
        for c in counts {
            acc += c;
            dist.push(acc);
        }
        Ok(SortedDistribution { dist })
    }

    /// Wraps an existing prefix-sum array. Must be non-decreasing and start
    /// at zero.
    pub fn from_prefix_sums(dist: Vec<u64>) -> Result<Self, MeshPlexError> {
        let monotone = dist.first() == Some(&0) && dist.windows(2).all(|w| w[0] <= w[1]);
        if dist.len() < 2 || !monotone {
            return Err(MeshPlexError::CountMismatch {
                expected: 2,
                got: dist.len(),
            });
        }
        Ok(SortedDistribution { dist })
    }

    /// Number of ranks covered.
    pub fn procs(&self) -> usize {
        self.dist.len() - 1
    }

    /// Global count across all ranks.
    pub fn total(&self) -> u64 {
        *self.dist.last().unwrap_or(&0)
    }

    /// First id owned by `rank`.
    pub fn start(&self, rank: usize) -> u64 {
        self.dist[rank]
    }

    /// One past the last id owned by `rank`.
    pub fn end(&self, rank: usize) -> u64 {
        self.dist[rank + 1]
    }

    /// The unique rank whose range contains `id`. Ids at or beyond the
    /// global total map to the last rank holding any ids.
    pub fn rank_of(&self, id: u64) -> usize {
        // first rank r with dist[r+1] > id
        let upper = self.dist[1..].partition_point(|&end| end <= id);
        upper.min(self.procs() - 1)
    }

    /// The raw prefix sums, length `procs + 1`.
    pub fn prefix_sums(&self) -> &[u64] {
        &self.dist
    }
}
