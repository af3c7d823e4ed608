//! The distributed global mesh.
//!
//! A [`GlobalSimplexMesh`] holds this rank's share of a globally distributed
//! collection of D-simplices: every element lives on exactly one rank, and
//! vertices are distributed independently of the elements referencing them.
//! Vertex data and element data may be attached; edge or facet data is
//! attached through a boundary mesh of the matching dimension, whose element
//! data then plays that role.
//!
//! The mesh supports three mutations and one query: `repartition` /
//! `repartition_with` move elements according to a partition vector,
//! `repartition_by_hash` moves every element to its hash owner, and
//! `build_local_mesh` constructs the per-rank local view with a requested
//! number of ghost layers.
//!
//! All operations that communicate are collective: every rank of the
//! communicator must call them in the same order with consistent arguments
//! (in particular, either all ranks attach data of a kind or none do).

use crate::algs::alltoallv::AllToAllV;
use crate::algs::collectives::scan_sum_u64;
use crate::algs::communicator::{CommTag, Communicator};
use crate::data::attached::{MeshData, UNSET};
use crate::mesh::csr::{CsrIndex, DistributedCsr, Partitioner};
use crate::mesh::local::{LocalFaces, LocalSimplexMesh};
use crate::mesh_error::MeshPlexError;
use crate::topology::distribution::SortedDistribution;
use crate::topology::simplex::{flatten, unflatten, Simplex};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Default base tag for a mesh's collectives. Concurrent meshes sharing one
/// in-process communicator must be given disjoint tag ranges via
/// [`GlobalSimplexMesh::with_tag`].
pub const DEFAULT_TAG: CommTag = CommTag::new(0x4d00);

// Tag offsets per collective phase; each exchange pattern also uses the
// following odd offset for its payloads.
const TAG_DIST: u16 = 0;
const TAG_SCAN: u16 = 2;
const TAG_PARTITION: u16 = 4;
const TAG_GHOST: u16 = 6;
const TAG_BOUNDARY: u16 = 8;
const TAG_FACES: u16 = 10;
const TAG_SHARED: u16 = 12;

/// Owner-rank selection for a sub-simplex dimension.
enum PlexOwner {
    /// `canonical_hash % procs`; the rendezvous rule for `d > 0`.
    Hash { procs: u64 },
    /// Vertex owner from the sorted vertex distribution.
    Range(SortedDistribution),
    /// Vertex fallback when no distribution exists: `id % procs`.
    Modulo { procs: u64 },
}

impl PlexOwner {
    fn rank_of(&self, s: &Simplex) -> usize {
        match self {
            PlexOwner::Hash { procs } => (s.canonical_hash() % procs) as usize,
            PlexOwner::Range(dist) => dist.rank_of(s.vertices()[0]),
            PlexOwner::Modulo { procs } => (s.vertices()[0] % procs) as usize,
        }
    }
}

/// This rank's share of a distributed D-simplex mesh, with optional
/// attached data.
pub struct GlobalSimplexMesh<C: Communicator> {
    dim: usize,
    elems: Vec<Simplex>,
    vertex_data: Option<Box<dyn MeshData<C>>>,
    element_data: Option<Box<dyn MeshData<C>>>,
    comm: Arc<C>,
    tag: CommTag,
    vtxdist: Option<SortedDistribution>,
    partitioned_by_hash: bool,
    boundary_meshes: Vec<Option<Box<GlobalSimplexMesh<C>>>>,
}

impl<C: Communicator> GlobalSimplexMesh<C> {
    /// Builds a mesh from this rank's owned elements. Collective.
    ///
    /// `vertex_data`, when present, is keyed by global contiguous vertex id;
    /// its local size defines this rank's slice of the vertex distribution.
    /// `element_data` is keyed by position in `elements`.
    pub fn new(
        dim: usize,
        elements: Vec<Simplex>,
        vertex_data: Option<Box<dyn MeshData<C>>>,
        element_data: Option<Box<dyn MeshData<C>>>,
        comm: Arc<C>,
    ) -> Result<Self, MeshPlexError> {
        Self::with_tag(dim, elements, vertex_data, element_data, comm, DEFAULT_TAG)
    }

    /// Like [`Self::new`] with an explicit base tag for all collectives of
    /// this mesh.
    pub fn with_tag(
        dim: usize,
        elements: Vec<Simplex>,
        vertex_data: Option<Box<dyn MeshData<C>>>,
        element_data: Option<Box<dyn MeshData<C>>>,
        comm: Arc<C>,
        tag: CommTag,
    ) -> Result<Self, MeshPlexError> {
        if dim == 0 {
            return Err(MeshPlexError::DimensionMismatch {
                expected: 1,
                got: 0,
            });
        }
        for e in &elements {
            if e.dim() != dim {
                return Err(MeshPlexError::DimensionMismatch {
                    expected: dim,
                    got: e.dim(),
                });
            }
        }
        let mut seen = HashSet::with_capacity(elements.len());
        for e in &elements {
            if !seen.insert(e) {
                return Err(MeshPlexError::DuplicateElement(e.clone()));
            }
        }
        drop(seen);

        let vtxdist = match &vertex_data {
            Some(vd) => Some(SortedDistribution::from_local_count(
                &*comm,
                tag.offset(TAG_DIST),
                vd.len() as u64,
            )?),
            None => None,
        };
        if let Some(dist) = &vtxdist {
            let total = dist.total();
            for e in &elements {
                for &v in e.vertices() {
                    if v >= total {
                        return Err(MeshPlexError::VertexIdOutOfRange {
                            vertex: v,
                            lo: 0,
                            hi: total,
                        });
                    }
                }
            }
        }

        let boundary_meshes = (0..dim).map(|_| None).collect();
        Ok(GlobalSimplexMesh {
            dim,
            elems: elements,
            vertex_data,
            element_data,
            comm,
            tag,
            vtxdist,
            partitioned_by_hash: false,
            boundary_meshes,
        })
    }

    /// Element dimension D.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// This rank's elements, in local order.
    pub fn elements(&self) -> &[Simplex] {
        &self.elems
    }

    pub fn num_elements(&self) -> usize {
        self.elems.len()
    }

    /// Attached element data, keyed by position in [`Self::elements`].
    pub fn element_data(&self) -> Option<&dyn MeshData<C>> {
        self.element_data.as_deref()
    }

    /// The vertex distribution, defined when vertex data was attached.
    pub fn vtxdist(&self) -> Option<&SortedDistribution> {
        self.vtxdist.as_ref()
    }

    /// Attaches a boundary mesh whose element data provides d-face data for
    /// the local view. Requires `0 < d < D`; replaces any previous boundary
    /// mesh of that dimension. Ownership transfers to this mesh.
    pub fn set_boundary_mesh(
        &mut self,
        mesh: GlobalSimplexMesh<C>,
    ) -> Result<(), MeshPlexError> {
        let d = mesh.dim;
        if d == 0 || d >= self.dim {
            return Err(MeshPlexError::InvalidBoundaryDimension {
                got: d,
                parent: self.dim,
            });
        }
        self.boundary_meshes[d] = Some(Box::new(mesh));
        Ok(())
    }

    /// Exports the element connectivity as a distributed CSR for an
    /// external graph partitioner. Collective.
    pub fn distributed_csr<I: CsrIndex>(&self) -> Result<DistributedCsr<I>, MeshPlexError> {
        let elmdist = SortedDistribution::from_local_count(
            &*self.comm,
            self.tag.offset(TAG_DIST),
            self.elems.len() as u64,
        )?;
        let dist = elmdist
            .prefix_sums()
            .iter()
            .map(|&v| I::from_u64(v))
            .collect();
        let width = self.dim + 1;
        let mut row_ptr = Vec::with_capacity(self.elems.len() + 1);
        let mut col_ind = Vec::with_capacity(self.elems.len() * width);
        let mut ind = 0u64;
        for elem in &self.elems {
            row_ptr.push(I::from_u64(ind));
            for &v in elem.vertices() {
                col_ind.push(I::from_u64(v));
                ind += 1;
            }
        }
        row_ptr.push(I::from_u64(ind));
        Ok(DistributedCsr {
            dist,
            row_ptr,
            col_ind,
        })
    }

    /// Repartitions the elements with an external partitioner. Collective.
    pub fn repartition<P: Partitioner>(&mut self, partitioner: &P) -> Result<(), MeshPlexError> {
        let csr = self.distributed_csr::<i64>()?;
        let part = partitioner.partition(&csr, self.dim)?;
        self.apply_partition(&part)?;
        self.partitioned_by_hash = false;
        Ok(())
    }

    /// Repartitions the elements according to an explicit partition vector
    /// (one target rank per local element). Collective.
    pub fn repartition_with(&mut self, part: &[usize]) -> Result<(), MeshPlexError> {
        self.apply_partition(part)?;
        self.partitioned_by_hash = false;
        Ok(())
    }

    /// Moves every element to its hash owner (`canonical_hash % procs`),
    /// making element-data queries dispatchable with a single hash.
    /// Idempotent: a no-op when the mesh is already hash-partitioned.
    /// Collective.
    pub fn repartition_by_hash(&mut self) -> Result<(), MeshPlexError> {
        if self.partitioned_by_hash {
            return Ok(());
        }
        let procs = self.comm.size() as u64;
        let part: Vec<usize> = self
            .elems
            .iter()
            .map(|e| (e.canonical_hash() % procs) as usize)
            .collect();
        self.apply_partition(&part)?;
        self.partitioned_by_hash = true;
        Ok(())
    }

    fn apply_partition(&mut self, part: &[usize]) -> Result<(), MeshPlexError> {
        let comm = Arc::clone(&self.comm);
        let procs = comm.size();
        if part.len() != self.elems.len() {
            return Err(MeshPlexError::PartitionLengthMismatch {
                expected: self.elems.len(),
                got: part.len(),
            });
        }
        if let Some(&bad) = part.iter().find(|&&p| p >= procs) {
            return Err(MeshPlexError::RankOutOfRange { rank: bad, procs });
        }

        // stable sort keeps the local order within each destination rank
        let mut order: Vec<usize> = (0..part.len()).collect();
        order.sort_by_key(|&i| part[i]);
        let mut send_counts = vec![0usize; procs];
        for &i in &order {
            send_counts[part[i]] += 1;
        }
        let width = self.dim + 1;
        let mut outgoing = Vec::with_capacity(order.len() * width);
        for &i in &order {
            outgoing.extend_from_slice(self.elems[i].vertices());
        }

        let a2a = AllToAllV::new(send_counts, &*comm, self.tag.offset(TAG_PARTITION))?;
        self.elems = unflatten(&a2a.exchange_blocks(&outgoing, width)?, width)?;
        if let Some(ed) = self.element_data.take() {
            let perm: Vec<u64> = order.iter().map(|&i| i as u64).collect();
            self.element_data = Some(ed.redistributed(&perm, &a2a)?);
        }
        Ok(())
    }

    /// Builds the local view: the owned elements grown by `overlap` ghost
    /// layers, plus, for every dimension `0 <= d <= D`, the distinct d-faces
    /// with globally-unique contiguous ids, shared-rank tables, and any
    /// attached data. Collective.
    pub fn build_local_mesh(
        &mut self,
        overlap: usize,
    ) -> Result<LocalSimplexMesh<C>, MeshPlexError> {
        // owned elements receive contiguous ids by prefix scan; ghosts keep
        // the id assigned by their owner, carried through the ghost replies
        let owned = self.elems.len() as u64;
        let scanned = scan_sum_u64(&*self.comm, self.tag.offset(TAG_SCAN), owned)?;
        let (all_elems, all_gids) = self.ghost_elements(overlap, scanned - owned)?;

        let mut faces = Vec::with_capacity(self.dim + 1);
        for d in 0..self.dim {
            faces.push(self.face_layer(d, &all_elems)?);
        }
        faces.push(LocalFaces::from_parts(all_elems, all_gids));
        Ok(LocalSimplexMesh::new(self.dim, faces))
    }

    /// Grows the element set by `overlap` layers of face-adjacent elements.
    /// Returns the extended element list (owned prefix preserved) and the
    /// parallel global-id list.
    fn ghost_elements(
        &self,
        overlap: usize,
        gid_offset: u64,
    ) -> Result<(Vec<Simplex>, Vec<u64>), MeshPlexError> {
        let mut elems = self.elems.clone();
        let mut gids: Vec<u64> = (0..elems.len() as u64).map(|i| gid_offset + i).collect();
        if overlap == 0 {
            return Ok((elems, gids));
        }
        let comm = &*self.comm;
        let procs = comm.size();
        let owner = self.plex_owner(self.dim - 1);
        let elem_width = self.dim + 1;
        let face_width = self.dim;

        let mut domain_boundary: Option<HashSet<Simplex>> = None;
        let mut have: HashSet<Simplex> = elems.iter().cloned().collect();

        for layer in 1..=overlap {
            let mut up = boundary_face_map(&elems)?;
            match &domain_boundary {
                // the global round trip ran on the first layer; afterwards
                // the persistent set filters locally
                Some(db) => up.retain(|face, _| !db.contains(face)),
                None => domain_boundary = Some(self.classify_domain_boundary(&mut up, &owner)?),
            }

            // bucket the surviving partition-cut faces by hash owner, in
            // canonical face order per bucket
            let mut buckets: Vec<Vec<(&Simplex, usize)>> = vec![Vec::new(); procs];
            for (face, &el) in &up {
                buckets[owner.rank_of(face)].push((face, el));
            }
            let counts: Vec<usize> = buckets.iter().map(|b| b.len()).collect();
            let total: usize = counts.iter().sum();
            let mut faces_flat = Vec::with_capacity(total * face_width);
            let mut elems_flat = Vec::with_capacity(total * elem_width);
            let mut gids_send = Vec::with_capacity(total);
            for bucket in &buckets {
                for &(face, el) in bucket {
                    faces_flat.extend_from_slice(face.vertices());
                    elems_flat.extend_from_slice(elems[el].vertices());
                    gids_send.push(gids[el]);
                }
            }

            let mut a2a = AllToAllV::new(counts, comm, self.tag.offset(TAG_GHOST))?;
            let req_faces =
                unflatten(&a2a.exchange_blocks(&faces_flat, face_width)?, face_width)?;
            let req_elems =
                unflatten(&a2a.exchange_blocks(&elems_flat, elem_width)?, elem_width)?;
            let req_gids = a2a.exchange::<u64>(&gids_send)?;
            a2a.swap();

            // rendezvous: all witnesses of a face meet at its hash owner;
            // each witness is answered with the element on the other side
            let mut witnesses: HashMap<&Simplex, Vec<usize>> = HashMap::new();
            for (i, face) in req_faces.iter().enumerate() {
                witnesses.entry(face).or_default().push(i);
            }
            let mut reply_elems = Vec::with_capacity(req_elems.len() * elem_width);
            let mut reply_gids = Vec::with_capacity(req_gids.len());
            for (i, face) in req_faces.iter().enumerate() {
                // at saturation every witness already holds the opposite
                // element; answering the witness itself dedups to a no-op
                let other = witnesses[face]
                    .iter()
                    .copied()
                    .find(|&j| req_elems[j] != req_elems[i])
                    .unwrap_or(i);
                reply_elems.extend_from_slice(req_elems[other].vertices());
                reply_gids.push(req_gids[other]);
            }
            let got_elems =
                unflatten(&a2a.exchange_blocks(&reply_elems, elem_width)?, elem_width)?;
            let got_gids = a2a.exchange::<u64>(&reply_gids)?;

            let mut incoming: Vec<(Simplex, u64)> = got_elems
                .into_iter()
                .zip(got_gids)
                .filter(|(s, _)| !have.contains(s))
                .collect();
            incoming.sort_by(|a, b| a.0.cmp(&b.0));
            incoming.dedup_by(|a, b| a.0 == b.0);
            log::debug!(
                "ghost layer {layer}: rank {} gained {} elements",
                comm.rank(),
                incoming.len()
            );
            for (s, g) in incoming {
                have.insert(s.clone());
                elems.push(s);
                gids.push(g);
            }
        }
        Ok((elems, gids))
    }

    /// First-layer round trip: every local-boundary face is counted at its
    /// hash owner across the whole fleet. Faces seen once are domain
    /// boundary and are removed from `up`; faces seen twice are partition
    /// cuts and stay. Returns the persistent domain-boundary set.
    fn classify_domain_boundary(
        &self,
        up: &mut BTreeMap<Simplex, usize>,
        owner: &PlexOwner,
    ) -> Result<HashSet<Simplex>, MeshPlexError> {
        let comm = &*self.comm;
        let procs = comm.size();
        let face_width = self.dim;

        let mut buckets: Vec<Vec<&Simplex>> = vec![Vec::new(); procs];
        for face in up.keys() {
            buckets[owner.rank_of(face)].push(face);
        }
        let counts: Vec<usize> = buckets.iter().map(|b| b.len()).collect();
        let sent: Vec<Simplex> = buckets.into_iter().flatten().cloned().collect();

        let mut a2a = AllToAllV::new(counts, comm, self.tag.offset(TAG_BOUNDARY))?;
        let requested = unflatten(&a2a.exchange_blocks(&flatten(&sent), face_width)?, face_width)?;

        let mut mult: HashMap<&Simplex, u64> = HashMap::new();
        for face in &requested {
            *mult.entry(face).or_insert(0) += 1;
        }
        for (face, &m) in &mult {
            if m > 2 {
                return Err(MeshPlexError::NonManifoldFace {
                    face: (*face).clone(),
                    multiplicity: m as usize,
                });
            }
        }
        let reply: Vec<u64> = requested.iter().map(|f| mult[f]).collect();
        a2a.swap();
        let face_counts = a2a.exchange::<u64>(&reply)?;

        let mut boundary = HashSet::new();
        for (face, count) in sent.iter().zip(face_counts) {
            match count {
                1 => {
                    up.remove(face);
                    boundary.insert(face.clone());
                }
                2 => {}
                m => {
                    return Err(MeshPlexError::NonManifoldFace {
                        face: face.clone(),
                        multiplicity: m as usize,
                    })
                }
            }
        }
        Ok(boundary)
    }

    /// Builds the `LocalFaces` of dimension `d < D` for the extended element
    /// set: distinct d-faces, contiguous global ids, shared ranks, and
    /// attached vertex or boundary data.
    fn face_layer(
        &mut self,
        d: usize,
        all_elems: &[Simplex],
    ) -> Result<LocalFaces<C>, MeshPlexError> {
        let comm = Arc::clone(&self.comm);
        let procs = comm.size();
        let owner = self.plex_owner(d);
        let width = d + 1;

        // distinct required faces, grouped by owner; BTreeSet iteration
        // fixes the deterministic emission order
        let mut required: Vec<BTreeSet<Simplex>> = vec![BTreeSet::new(); procs];
        for elem in all_elems {
            for s in elem.downward(d) {
                required[owner.rank_of(&s)].insert(s);
            }
        }
        let counts: Vec<usize> = required.iter().map(|set| set.len()).collect();
        let mut faces = Vec::with_capacity(counts.iter().sum());
        for set in required {
            faces.extend(set);
        }

        let mut a2a = AllToAllV::new(counts, &*comm, self.tag.offset(TAG_FACES))?;
        let requested = unflatten(&a2a.exchange_blocks(&flatten(&faces), width)?, width)?;
        a2a.swap();

        let gids = self.contiguous_gids(d, &requested, &a2a)?;
        let mut lf = LocalFaces::from_parts(faces, gids);

        if d == 0 {
            if let (Some(vd), Some(dist)) = (self.vertex_data.as_deref(), self.vtxdist.as_ref())
            {
                let rank = comm.rank();
                let (lo, hi) = (dist.start(rank), dist.end(rank));
                let lids = requested
                    .iter()
                    .map(|f| {
                        let v = f.vertices()[0];
                        if v < lo || v >= hi {
                            return Err(MeshPlexError::VertexIdOutOfRange { vertex: v, lo, hi });
                        }
                        Ok(v - lo)
                    })
                    .collect::<Result<Vec<u64>, _>>()?;
                lf.set_data(vd.redistributed(&lids, &a2a)?);
            }
        } else if let Some(bm) = self.boundary_meshes[d].as_deref_mut() {
            if bm.element_data.is_some() {
                // align the boundary elements with the face hash owners so
                // each requested face can be looked up locally
                bm.repartition_by_hash()?;
                let g2l: HashMap<&Simplex, u64> = bm
                    .elems
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (s, i as u64))
                    .collect();
                let lids: Vec<u64> = requested
                    .iter()
                    .map(|f| g2l.get(f).copied().unwrap_or(UNSET))
                    .collect();
                if let Some(ed) = bm.element_data.as_deref() {
                    lf.set_data(ed.redistributed(&lids, &a2a)?);
                }
            }
        }

        self.shared_ranks(&mut lf, &requested, &a2a)?;
        Ok(lf)
    }

    /// Owner-side contiguous GID assignment, answered back to requesters.
    /// For vertices the global id *is* the vertex id; for `d > 0` the owner
    /// numbers its distinct faces in canonical order from a scanned offset.
    fn contiguous_gids(
        &self,
        d: usize,
        requested: &[Simplex],
        a2a: &AllToAllV<'_, C>,
    ) -> Result<Vec<u64>, MeshPlexError> {
        let gids: Vec<u64> = if d == 0 {
            requested.iter().map(|f| f.vertices()[0]).collect()
        } else {
            let mut owned: BTreeMap<&Simplex, u64> =
                requested.iter().map(|f| (f, 0)).collect();
            let owned_n = owned.len() as u64;
            let scanned = scan_sum_u64(&*self.comm, self.tag.offset(TAG_SCAN), owned_n)?;
            let mut next = scanned - owned_n;
            for gid in owned.values_mut() {
                *gid = next;
                next += 1;
            }
            requested.iter().map(|f| owned[f]).collect()
        };
        a2a.exchange::<u64>(&gids)
    }

    /// Owner-side shared-ranks table: for every requested face, the set of
    /// ranks that requested it, answered back per request. The requester
    /// itself is part of the set.
    fn shared_ranks(
        &self,
        lf: &mut LocalFaces<C>,
        requested: &[Simplex],
        a2a: &AllToAllV<'_, C>,
    ) -> Result<(), MeshPlexError> {
        let comm = &*self.comm;
        let procs = comm.size();

        let mut info: HashMap<&Simplex, Vec<u64>> = HashMap::new();
        for (peer, i) in a2a.send_slots() {
            info.entry(&requested[i]).or_default().push(peer as u64);
        }
        let per_item: Vec<u64> = requested.iter().map(|f| info[f].len() as u64).collect();
        let recv_per_item = a2a.exchange::<u64>(&per_item)?;

        let mut flat = Vec::new();
        for face in requested {
            flat.extend_from_slice(&info[face]);
        }
        let mut send_counts = vec![0usize; procs];
        for (peer, i) in a2a.send_slots() {
            send_counts[peer] += per_item[i] as usize;
        }
        let mut recv_counts = vec![0usize; procs];
        for (peer, i) in a2a.recv_slots() {
            recv_counts[peer] += recv_per_item[i] as usize;
        }
        let shared_a2a =
            AllToAllV::from_counts(send_counts, recv_counts, comm, self.tag.offset(TAG_SHARED))?;
        let shared = shared_a2a.exchange::<u64>(&flat)?;

        let mut displs = Vec::with_capacity(recv_per_item.len() + 1);
        let mut acc = 0usize;
        displs.push(0);
        for &c in &recv_per_item {
            acc += c as usize;
            displs.push(acc);
        }
        lf.set_shared_ranks(shared.into_iter().map(|r| r as usize).collect(), displs);
        Ok(())
    }

    fn plex_owner(&self, d: usize) -> PlexOwner {
        let procs = self.comm.size() as u64;
        if d == 0 {
            match &self.vtxdist {
                Some(dist) => PlexOwner::Range(dist.clone()),
                None => PlexOwner::Modulo { procs },
            }
        } else {
            PlexOwner::Hash { procs }
        }
    }
}

/// Maps each facet of `elems` that lies on the local boundary (multiplicity
/// one) to its witnessing element index. Interior facets (multiplicity two)
/// are culled; higher multiplicity means the input is not a manifold mesh.
fn boundary_face_map(elems: &[Simplex]) -> Result<BTreeMap<Simplex, usize>, MeshPlexError> {
    let mut up: BTreeMap<Simplex, (usize, usize)> = BTreeMap::new();
    for (el, elem) in elems.iter().enumerate() {
        for face in elem.facets() {
            let entry = up.entry(face).or_insert((el, 0));
            entry.1 += 1;
        }
    }
    let mut out = BTreeMap::new();
    for (face, (el, mult)) in up {
        match mult {
            1 => {
                out.insert(face, el);
            }
            2 => {}
            m => {
                return Err(MeshPlexError::NonManifoldFace {
                    face,
                    multiplicity: m,
                })
            }
        }
    }
    Ok(out)
}
