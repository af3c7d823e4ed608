//! Opaque per-entity payloads that travel with mesh entities.
//!
//! The mesh never inspects attached data; it only asks it to follow a
//! redistribution through [`MeshData::redistributed`]. The permutation maps
//! each send slot of the exchange pattern to a local entity index, with
//! [`UNSET`] marking slots that carry no data. Unset slots survive the trip:
//! the receiver sees them as absent rows, never as garbage values.

use crate::algs::alltoallv::AllToAllV;
use crate::algs::communicator::Communicator;
use crate::mesh_error::MeshPlexError;
use bytemuck::Pod;
use std::any::Any;

/// Sentinel local index meaning "no data for this slot".
pub const UNSET: u64 = u64::MAX;

/// Capability contract between the mesh and user data.
///
/// Implementations gather their rows in `send_lids` order (one entry per
/// send slot of `exchange`), ship them through the exchange, and return the
/// received rows as a fresh object of the same concrete type.
pub trait MeshData<C: Communicator>: Send {
    /// Number of locally stored rows.
    fn len(&self) -> usize;

    /// True when no rows are stored locally.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gathers rows by `send_lids` (with [`UNSET`] producing absent rows),
    /// ships them over `exchange`, and returns the received object.
    fn redistributed(
        &self,
        send_lids: &[u64],
        exchange: &AllToAllV<'_, C>,
    ) -> Result<Box<dyn MeshData<C>>, MeshPlexError>;

    /// Downcast support for consumers that know the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Fixed-arity rows of a `Pod` value type, with per-row presence flags.
#[derive(Clone, Debug)]
pub struct ArrayData<T> {
    dof: usize,
    rows: Vec<T>,
    present: Vec<bool>,
}

impl<T: Pod> ArrayData<T> {
    /// Wraps `values` as rows of `dof` entries each, all present.
    pub fn new(dof: usize, values: Vec<T>) -> Result<Self, MeshPlexError> {
        if dof == 0 || values.len() % dof != 0 {
            return Err(MeshPlexError::CountMismatch {
                expected: dof.max(1),
                got: values.len(),
            });
        }
        let n = values.len() / dof;
        Ok(ArrayData {
            dof,
            rows: values,
            present: vec![true; n],
        })
    }

    /// Entries per row.
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// The row at `index`, or `None` when the slot is unset.
    pub fn row(&self, index: usize) -> Option<&[T]> {
        if !*self.present.get(index)? {
            return None;
        }
        Some(&self.rows[index * self.dof..(index + 1) * self.dof])
    }

    fn num_rows(&self) -> usize {
        self.present.len()
    }
}

impl<C: Communicator, T: Pod + Send + 'static> MeshData<C> for ArrayData<T> {
    fn len(&self) -> usize {
        self.num_rows()
    }

    fn redistributed(
        &self,
        send_lids: &[u64],
        exchange: &AllToAllV<'_, C>,
    ) -> Result<Box<dyn MeshData<C>>, MeshPlexError> {
        if send_lids.len() != exchange.total_send() {
            return Err(MeshPlexError::CountMismatch {
                expected: exchange.total_send(),
                got: send_lids.len(),
            });
        }
        let mut rows = Vec::with_capacity(send_lids.len() * self.dof);
        let mut flags = Vec::with_capacity(send_lids.len());
        for &lid in send_lids {
            if lid == UNSET {
                rows.extend(std::iter::repeat(T::zeroed()).take(self.dof));
                flags.push(0u8);
                continue;
            }
            let i = usize::try_from(lid).map_err(|_| MeshPlexError::DataIndexOutOfRange {
                index: lid,
                len: self.num_rows(),
            })?;
            if i >= self.num_rows() {
                return Err(MeshPlexError::DataIndexOutOfRange {
                    index: lid,
                    len: self.num_rows(),
                });
            }
            if self.present[i] {
                rows.extend_from_slice(&self.rows[i * self.dof..(i + 1) * self.dof]);
                flags.push(1);
            } else {
                rows.extend(std::iter::repeat(T::zeroed()).take(self.dof));
                flags.push(0);
            }
        }
        let rows = exchange.exchange_blocks(&rows, self.dof)?;
        let flags = exchange.exchange::<u8>(&flags)?;
        Ok(Box::new(ArrayData {
            dof: self.dof,
            rows,
            present: flags.into_iter().map(|f| f != 0).collect(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
