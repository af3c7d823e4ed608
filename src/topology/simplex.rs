//! `Simplex`: the basic combinatorial entity of a simplicial mesh.
//!
//! A d-simplex is an unordered set of `d+1` distinct 64-bit vertex ids
//! (a vertex for d=0, an edge for d=1, a triangle for d=2, and so on).
//! Vertex ids are canonicalized to sorted order at construction, so
//! equality, ordering, and hashing are all independent of the order the
//! vertices were supplied in. The derived `Ord` (lexicographic over the
//! sorted ids) is the canonical total order used throughout the crate to
//! make distributed protocols deterministic.
//!
//! The dimension is a runtime property: a `Simplex` of dimension `d`
//! serializes to exactly `d+1` little-endian `u64` words, which is also its
//! wire format in the exchange layer.

use crate::mesh_error::MeshPlexError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An unordered set of `d+1` distinct vertex ids, stored sorted.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Simplex {
    verts: Vec<u64>,
}

impl Simplex {
    /// Creates a simplex from a vertex id list, canonicalizing to sorted
    /// order. Fails if the list is empty or contains duplicates.
    pub fn new(verts: impl Into<Vec<u64>>) -> Result<Self, MeshPlexError> {
        let mut verts = verts.into();
        if verts.is_empty() {
            return Err(MeshPlexError::InvalidSimplex(verts));
        }
        verts.sort_unstable();
        if verts.windows(2).any(|w| w[0] == w[1]) {
            return Err(MeshPlexError::InvalidSimplex(verts));
        }
        Ok(Simplex { verts })
    }

    /// The 0-simplex holding a single vertex id.
    pub fn vertex(id: u64) -> Self {
        Simplex { verts: vec![id] }
    }

    /// Rebuilds a simplex from an already sorted, distinct vertex slice.
    /// Used when decoding wire buffers produced by [`flatten`].
    pub(crate) fn from_sorted(verts: Vec<u64>) -> Self {
        debug_assert!(verts.windows(2).all(|w| w[0] < w[1]));
        Simplex { verts }
    }

    /// Dimension `d`; the simplex has `d+1` vertices.
    #[inline]
    pub fn dim(&self) -> usize {
        self.verts.len() - 1
    }

    /// The sorted vertex ids.
    #[inline]
    pub fn vertices(&self) -> &[u64] {
        &self.verts
    }

    /// Enumerates the downward closure to dimension `k`: all `(k+1)`-subsets
    /// of the vertex set, emitted in lexicographic vertex-index order.
    ///
    /// For `k == self.dim()` this returns the simplex itself; for larger `k`
    /// the result is empty.
    pub fn downward(&self, k: usize) -> Vec<Simplex> {
        let n = self.verts.len();
        let m = k + 1;
        if m > n {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(binomial(n, m));
        let mut idx: Vec<usize> = (0..m).collect();
        loop {
            out.push(Simplex::from_sorted(
                idx.iter().map(|&i| self.verts[i]).collect(),
            ));
            // advance to the next combination in lexicographic order
            let mut i = m;
            loop {
                if i == 0 {
                    return out;
                }
                i -= 1;
                if idx[i] != i + n - m {
                    break;
                }
            }
            idx[i] += 1;
            for j in i + 1..m {
                idx[j] = idx[j - 1] + 1;
            }
        }
    }

    /// The `(d-1)`-faces of this simplex (its facets).
    pub fn facets(&self) -> Vec<Simplex> {
        self.downward(self.dim().saturating_sub(1))
    }

    /// Commutative 64-bit hash: the wrapping sum of an integer mix of every
    /// vertex id. Permutations of the same vertex set therefore hash
    /// identically, and the value is stable across processes, which makes it
    /// usable for owner-rank selection (`hash % procs`).
    pub fn canonical_hash(&self) -> u64 {
        self.verts
            .iter()
            .fold(0u64, |acc, &v| acc.wrapping_add(mix64(v)))
    }
}

impl fmt::Debug for Simplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Simplex").field(&self.verts).finish()
    }
}

impl fmt::Display for Simplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.verts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

/// splitmix64 finalizer; bijective on `u64`.
#[inline]
fn mix64(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc = 1usize;
    for i in 0..k {
        acc = acc * (n - i) / (i + 1);
    }
    acc
}

/// Flattens simplices of uniform dimension into one `u64` stream for the
/// exchange layer.
pub fn flatten(simplices: &[Simplex]) -> Vec<u64> {
    let width = simplices.first().map_or(0, |s| s.verts.len());
    let mut out = Vec::with_capacity(simplices.len() * width);
    for s in simplices {
        debug_assert_eq!(s.verts.len(), width);
        out.extend_from_slice(&s.verts);
    }
    out
}

/// Rebuilds simplices of vertex count `width` from a flat `u64` stream.
pub fn unflatten(flat: &[u64], width: usize) -> Result<Vec<Simplex>, MeshPlexError> {
    if width == 0 || flat.len() % width != 0 {
        return Err(MeshPlexError::CountMismatch {
            expected: width.max(1),
            got: flat.len(),
        });
    }
    flat.chunks_exact(width)
        .map(|chunk| Simplex::new(chunk.to_vec()))
        .collect()
}
