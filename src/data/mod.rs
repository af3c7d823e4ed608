//! Attached per-entity data and its redistribution.

pub mod attached;
