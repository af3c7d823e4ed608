//! Communication primitives: process groups, collectives, and the
//! variable-length exchange pattern.

pub mod alltoallv;
pub mod collectives;
pub mod communicator;
