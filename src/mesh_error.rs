//! Unified error type for all public mesh-plex APIs.
//!
//! Every fallible operation in this crate reports through [`MeshPlexError`].
//! Errors are coarse by design: precondition violations, distributed
//! invariant breaches (non-manifold input), and transport failures. None of
//! them are recoverable; callers are expected to fail fast.

use thiserror::Error;

/// Unified error type for mesh-plex operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshPlexError {
    /// A simplex was constructed from an empty or duplicated vertex list.
    #[error("invalid simplex: vertex ids {0:?} must be non-empty and distinct")]
    InvalidSimplex(Vec<u64>),
    /// An element of the wrong dimension was handed to a mesh.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// The same element appeared twice in a local element array.
    #[error("duplicate element {0} in local element array")]
    DuplicateElement(crate::topology::simplex::Simplex),
    /// A partition vector did not have one entry per local element.
    #[error("partition vector has length {got}, expected {expected}")]
    PartitionLengthMismatch { expected: usize, got: usize },
    /// A partition vector referenced a rank outside the communicator.
    #[error("partition target rank {rank} out of range (communicator has {procs} ranks)")]
    RankOutOfRange { rank: usize, procs: usize },
    /// A vertex id fell outside the valid vertex distribution range.
    #[error("vertex id {vertex} outside range [{lo}, {hi})")]
    VertexIdOutOfRange { vertex: u64, lo: u64, hi: u64 },
    /// A boundary mesh must have dimension strictly between 0 and the
    /// element dimension of its parent.
    #[error("boundary mesh dimension {got} invalid for a {parent}-mesh")]
    InvalidBoundaryDimension { got: usize, parent: usize },
    /// A facet had more than two witnessing elements; the input is not a
    /// manifold mesh.
    #[error("non-manifold input: face {face} has {multiplicity} element witnesses")]
    NonManifoldFace {
        face: crate::topology::simplex::Simplex,
        multiplicity: usize,
    },
    /// An attached-data row index was outside the stored rows.
    #[error("attached data index {index} out of range (have {len} rows)")]
    DataIndexOutOfRange { index: u64, len: usize },
    /// An exchange was driven with a buffer whose length does not match the
    /// communication pattern.
    #[error("exchange buffer holds {got} items, pattern requires {expected}")]
    CountMismatch { expected: usize, got: usize },
    /// A peer delivered a message of unexpected size.
    #[error("rank {neighbor} sent {got} bytes, expected {expected}")]
    BufferSizeMismatch {
        neighbor: usize,
        expected: usize,
        got: usize,
    },
    /// The transport layer failed outright.
    #[error("communication with rank {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
}
