//! # mesh-plex
//!
//! mesh-plex manages globally distributed unstructured simplex meshes for
//! finite-element and discontinuous-Galerkin codes. A
//! [`GlobalSimplexMesh`](mesh::global::GlobalSimplexMesh) owns one rank's
//! share of a D-simplex collection (triangles, tetrahedra, ...) together
//! with optional per-vertex and per-element data, and turns it into a
//! [`LocalSimplexMesh`](mesh::local::LocalSimplexMesh): an explicit
//! enumeration of the owned elements, all their sub-simplices, and a
//! requested number of ghost layers, each entity carrying a
//! globally-unique contiguous id and the set of ranks sharing it.
//!
//! ## Features
//! - Order-independent simplex values with deterministic canonical hashing
//! - Symmetric variable-length all-to-all exchange, reversible for replies
//! - Element redistribution by partition vector or by hash, carrying
//!   attached data in lock-step
//! - Ghost-layer discovery through a hash-owner rendezvous, with domain
//!   boundary detection
//! - Per-dimension face enumeration with contiguous global ids and
//!   symmetric shared-rank tables
//! - Pluggable communication backends: serial, threads-as-ranks, and MPI
//!   (behind the `mpi-support` feature)
//!
//! ## Usage
//! ```rust
//! use mesh_plex::prelude::*;
//! use std::sync::Arc;
//!
//! let comm = Arc::new(NoComm);
//! let elems = vec![Simplex::new([0u64, 1, 2]).unwrap()];
//! let mut mesh = GlobalSimplexMesh::new(2, elems, None, None, comm).unwrap();
//! let local = mesh.build_local_mesh(0).unwrap();
//! assert_eq!(local.elements().len(), 1);
//! assert_eq!(local.faces(1).len(), 3);
//! assert_eq!(local.vertices().len(), 3);
//! ```
//!
//! All communicating operations are collective: every rank of the
//! communicator must call them in the same order. With the serial
//! [`NoComm`](algs::communicator::NoComm) backend the same code runs
//! unchanged on one rank.

pub mod algs;
pub mod data;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

/// A convenient prelude importing the most-used types.
pub mod prelude {
    pub use crate::algs::alltoallv::AllToAllV;
    pub use crate::algs::collectives::{all_gather_u64, scan_sum_u64};
    pub use crate::algs::communicator::{CommTag, Communicator, NoComm, ThreadComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::data::attached::{ArrayData, MeshData, UNSET};
    pub use crate::mesh::csr::{CsrIndex, DistributedCsr, Partitioner};
    pub use crate::mesh::global::GlobalSimplexMesh;
    pub use crate::mesh::local::{LocalFaces, LocalSimplexMesh};
    pub use crate::mesh_error::MeshPlexError;
    pub use crate::topology::distribution::SortedDistribution;
    pub use crate::topology::simplex::Simplex;
}
