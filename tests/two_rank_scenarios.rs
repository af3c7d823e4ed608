//! Two-rank protocol scenarios over `ThreadComm`: shared-rank symmetry,
//! ghost growth, globally consistent face ids, and vertex data transport.

mod common;

use common::spmd;
use mesh_plex::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

fn tri(v: [u64; 3]) -> Simplex {
    Simplex::new(v).unwrap()
}

fn owned_triangle(rank: usize) -> Vec<Simplex> {
    // the two triangles share edge (0, 1)
    if rank == 0 {
        vec![tri([0, 1, 2])]
    } else {
        vec![tri([0, 1, 3])]
    }
}

#[test]
fn shared_edge_names_both_ranks() {
    let results = spmd(2, |rank| {
        let comm = Arc::new(ThreadComm::new(rank, 2));
        let mut mesh = GlobalSimplexMesh::with_tag(
            2,
            owned_triangle(rank),
            None,
            None,
            comm,
            CommTag::new(0x3000),
        )
        .unwrap();
        let local = mesh.build_local_mesh(0).unwrap();

        let edges = local.faces(1);
        let cut = edges.position(&Simplex::new([0, 1]).unwrap()).unwrap();
        let mut cut_ranks = edges.shared_ranks(cut).to_vec();
        cut_ranks.sort_unstable();

        // every other local edge is private to this rank
        let private: Vec<Vec<usize>> = (0..edges.len())
            .filter(|&i| i != cut)
            .map(|i| edges.shared_ranks(i).to_vec())
            .collect();

        let vert_ranks: HashMap<u64, Vec<usize>> = (0..local.vertices().len())
            .map(|i| {
                let mut r = local.vertices().shared_ranks(i).to_vec();
                r.sort_unstable();
                (local.vertices().simplex(i).vertices()[0], r)
            })
            .collect();
        (cut_ranks, private, vert_ranks)
    });

    for (rank, (cut_ranks, private, vert_ranks)) in results.iter().enumerate() {
        assert_eq!(cut_ranks, &[0, 1], "cut edge on rank {rank}");
        for ranks in private {
            assert_eq!(ranks, &[rank]);
        }
        assert_eq!(vert_ranks[&0], vec![0, 1]);
        assert_eq!(vert_ranks[&1], vec![0, 1]);
    }
    // the unshared vertices belong to exactly one rank each
    assert_eq!(results[0].2[&2], vec![0]);
    assert_eq!(results[1].2[&3], vec![1]);
}

#[test]
fn edge_gids_are_globally_consistent() {
    let results = spmd(2, |rank| {
        let comm = Arc::new(ThreadComm::new(rank, 2));
        let mut mesh = GlobalSimplexMesh::with_tag(
            2,
            owned_triangle(rank),
            None,
            None,
            comm,
            CommTag::new(0x3100),
        )
        .unwrap();
        let local = mesh.build_local_mesh(0).unwrap();
        let edges = local.faces(1);
        let map: HashMap<Simplex, u64> = edges
            .simplices()
            .iter()
            .cloned()
            .zip(edges.gids().iter().copied())
            .collect();
        map
    });

    // same edge, same id on both ranks
    for (edge, gid) in &results[0] {
        if let Some(other) = results[1].get(edge) {
            assert_eq!(gid, other, "gid of shared edge {edge}");
        }
    }
    // distinct edges cover a contiguous id range
    let mut union: HashMap<Simplex, u64> = HashMap::new();
    for map in &results {
        for (edge, gid) in map {
            if let Some(prev) = union.insert(edge.clone(), *gid) {
                assert_eq!(prev, *gid);
            }
        }
    }
    assert_eq!(union.len(), 5);
    let mut gids: Vec<u64> = union.values().copied().collect();
    gids.sort_unstable();
    assert_eq!(gids, (0..5).collect::<Vec<u64>>());
}

#[test]
fn one_ghost_layer_grows_to_both_triangles() {
    let results = spmd(2, |rank| {
        let comm = Arc::new(ThreadComm::new(rank, 2));
        let mut mesh = GlobalSimplexMesh::with_tag(
            2,
            owned_triangle(rank),
            None,
            None,
            comm,
            CommTag::new(0x3200),
        )
        .unwrap();
        let local = mesh.build_local_mesh(1).unwrap();
        (
            local.elements().simplices().to_vec(),
            local.elements().gids().to_vec(),
        )
    });

    // owned element stays first; the ghost follows with its owner's id
    assert_eq!(results[0].0, vec![tri([0, 1, 2]), tri([0, 1, 3])]);
    assert_eq!(results[0].1, vec![0, 1]);
    assert_eq!(results[1].0, vec![tri([0, 1, 3]), tri([0, 1, 2])]);
    assert_eq!(results[1].1, vec![1, 0]);
}

#[test]
fn vertex_data_round_trips_across_ranks() {
    let results = spmd(2, |rank| {
        let comm = Arc::new(ThreadComm::new(rank, 2));
        // global vertices 0..4; rank 0 owns rows for {0, 1}, rank 1 for {2, 3}
        let rows: Vec<u64> = if rank == 0 { vec![0, 10] } else { vec![20, 30] };
        let data = ArrayData::new(1, rows).unwrap();
        let mut mesh = GlobalSimplexMesh::with_tag(
            2,
            owned_triangle(rank),
            Some(Box::new(data)),
            None,
            comm,
            CommTag::new(0x3300),
        )
        .unwrap();
        let local = mesh.build_local_mesh(0).unwrap();
        let verts = local.vertices();
        let rows = verts
            .data()
            .unwrap()
            .as_any()
            .downcast_ref::<ArrayData<u64>>()
            .unwrap();
        (0..verts.len())
            .map(|i| {
                (
                    verts.simplex(i).vertices()[0],
                    rows.row(i).unwrap().to_vec(),
                )
            })
            .collect::<Vec<_>>()
    });

    for per_rank in &results {
        for (vid, row) in per_rank {
            assert_eq!(row, &vec![vid * 10]);
        }
    }
    // each rank saw exactly its triangle's vertices
    let vids = |r: usize| {
        let mut v: Vec<u64> = results[r].iter().map(|(vid, _)| *vid).collect();
        v.sort_unstable();
        v
    };
    assert_eq!(vids(0), vec![0, 1, 2]);
    assert_eq!(vids(1), vec![0, 1, 3]);
}
