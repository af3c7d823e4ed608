//! Strip of four triangles split between two ranks: domain-boundary
//! classification, ghost saturation, and idempotence at saturation.

mod common;

use common::spmd;
use mesh_plex::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn tri(v: [u64; 3]) -> Simplex {
    Simplex::new(v).unwrap()
}

// T0..T3 form a strip; cut edges are (1,2), (2,3), (3,4)
fn strip() -> [Simplex; 4] {
    [
        tri([0, 1, 2]),
        tri([1, 2, 3]),
        tri([2, 3, 4]),
        tri([3, 4, 5]),
    ]
}

// interleaved partition: rank 0 gets T0, T2; rank 1 gets T1, T3
fn owned(rank: usize) -> Vec<Simplex> {
    let [t0, t1, t2, t3] = strip();
    if rank == 0 {
        vec![t0, t2]
    } else {
        vec![t1, t3]
    }
}

#[test]
fn one_layer_saturates_the_strip() {
    let results = spmd(2, |rank| {
        let comm = Arc::new(ThreadComm::new(rank, 2));
        let mut mesh = GlobalSimplexMesh::with_tag(
            2,
            owned(rank),
            None,
            None,
            comm,
            CommTag::new(0x4000),
        )
        .unwrap();
        let local = mesh.build_local_mesh(1).unwrap();
        (
            local.elements().simplices().to_vec(),
            local.elements().gids().to_vec(),
        )
    });

    let [t0, t1, t2, t3] = strip();
    // owned prefix preserved, ghosts appended in canonical order
    assert_eq!(results[0].0, vec![t0.clone(), t2.clone(), t1.clone(), t3.clone()]);
    assert_eq!(results[0].1, vec![0, 1, 2, 3]);
    assert_eq!(results[1].0, vec![t1, t3, t0, t2]);
    assert_eq!(results[1].1, vec![2, 3, 0, 1]);
}

#[test]
fn deeper_overlap_is_idempotent_at_saturation() {
    let one = spmd(2, |rank| {
        let comm = Arc::new(ThreadComm::new(rank, 2));
        let mut mesh = GlobalSimplexMesh::with_tag(
            2,
            owned(rank),
            None,
            None,
            comm,
            CommTag::new(0x4100),
        )
        .unwrap();
        mesh.build_local_mesh(1)
            .unwrap()
            .elements()
            .simplices()
            .to_vec()
    });
    let two = spmd(2, |rank| {
        let comm = Arc::new(ThreadComm::new(rank, 2));
        let mut mesh = GlobalSimplexMesh::with_tag(
            2,
            owned(rank),
            None,
            None,
            comm,
            CommTag::new(0x4200),
        )
        .unwrap();
        mesh.build_local_mesh(2)
            .unwrap()
            .elements()
            .simplices()
            .to_vec()
    });
    assert_eq!(one, two);
    assert_eq!(one[0].len(), 4);
    assert_eq!(one[1].len(), 4);
}

#[test]
fn face_witness_counts_match_the_topology() {
    // after one ghost layer both ranks hold the full strip, so witness
    // counts over the union of element sets follow the strip topology:
    // end and lateral edges have one witness, interior edges two
    let results = spmd(2, |rank| {
        let comm = Arc::new(ThreadComm::new(rank, 2));
        let mut mesh = GlobalSimplexMesh::with_tag(
            2,
            owned(rank),
            None,
            None,
            comm,
            CommTag::new(0x4300),
        )
        .unwrap();
        mesh.build_local_mesh(1)
            .unwrap()
            .elements()
            .simplices()
            .to_vec()
    });

    let union: HashSet<Simplex> = results.into_iter().flatten().collect();
    let mut witness_count: HashMap<Simplex, usize> = HashMap::new();
    for elem in &union {
        for facet in elem.facets() {
            *witness_count.entry(facet).or_insert(0) += 1;
        }
    }
    for cut in [tri_edge(1, 2), tri_edge(2, 3), tri_edge(3, 4)] {
        assert_eq!(witness_count[&cut], 2, "interior edge {cut}");
    }
    for boundary in [
        tri_edge(0, 1),
        tri_edge(0, 2),
        tri_edge(1, 3),
        tri_edge(2, 4),
        tri_edge(3, 5),
        tri_edge(4, 5),
    ] {
        assert_eq!(witness_count[&boundary], 1, "boundary edge {boundary}");
    }
}

fn tri_edge(a: u64, b: u64) -> Simplex {
    Simplex::new([a, b]).unwrap()
}
