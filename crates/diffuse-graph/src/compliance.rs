//! SocialGraph trait compliance test helpers.
//!
//! These functions verify that a graph implementation satisfies the
//! orientation contract documented on [`SocialGraph`].

use diffuse_core::{EdgeOrientation, SocialGraph, UserId};
use indexmap::IndexSet;

fn users(graph: &dyn SocialGraph) -> impl Iterator<Item = UserId> {
    (0..graph.user_count() as u32).map(UserId)
}

/// Assert that `v in neighbours(u, Out)` iff `edge(u, v)` exists.
pub fn assert_out_matches_edges(graph: &dyn SocialGraph) {
    for u in users(graph) {
        let out = graph.neighbours(u, EdgeOrientation::Out);
        for v in users(graph) {
            assert_eq!(
                out.contains(&v),
                graph.edge(u, v).is_some(),
                "out-neighbourhood of {u} disagrees with edge({u}, {v})"
            );
        }
    }
}

/// Assert that `v in neighbours(u, Out)` iff `u in neighbours(v, In)`.
pub fn assert_in_mirrors_out(graph: &dyn SocialGraph) {
    for u in users(graph) {
        for v in graph.neighbours(u, EdgeOrientation::Out) {
            assert!(
                graph.neighbours(v, EdgeOrientation::In).contains(&u),
                "{v} lists no incoming edge from {u}"
            );
        }
        for v in graph.neighbours(u, EdgeOrientation::In) {
            assert!(
                graph.neighbours(v, EdgeOrientation::Out).contains(&u),
                "{v} lists no outgoing edge to {u}"
            );
        }
    }
}

/// Assert that `Und` is the duplicate-free union of `In` and `Out`.
pub fn assert_und_is_union(graph: &dyn SocialGraph) {
    for u in users(graph) {
        let und = graph.neighbours(u, EdgeOrientation::Und);
        let unique: IndexSet<UserId> = und.iter().copied().collect();
        assert_eq!(unique.len(), und.len(), "duplicate neighbours of {u}");
        let expected: IndexSet<UserId> = graph
            .neighbours(u, EdgeOrientation::Out)
            .into_iter()
            .chain(graph.neighbours(u, EdgeOrientation::In))
            .collect();
        assert_eq!(
            unique.len(),
            expected.len(),
            "und-neighbourhood of {u} is not the union of in and out"
        );
        assert!(expected.iter().all(|v| unique.contains(v)));
    }
}

/// Assert that undirected graphs report every edge both ways.
pub fn assert_undirected_symmetric(graph: &dyn SocialGraph) {
    if graph.is_directed() {
        return;
    }
    for u in users(graph) {
        for v in graph.neighbours(u, EdgeOrientation::Out) {
            assert!(graph.edge(v, u).is_some(), "edge {u}-{v} is not mirrored");
        }
    }
}

/// Assert that neighbour lists are identical across calls.
pub fn assert_neighbours_deterministic(graph: &dyn SocialGraph) {
    for u in users(graph) {
        for o in [EdgeOrientation::In, EdgeOrientation::Out, EdgeOrientation::Und] {
            assert_eq!(graph.neighbours(u, o), graph.neighbours(u, o));
        }
    }
}

/// Run all compliance checks on a graph.
pub fn run_full_compliance(graph: &dyn SocialGraph) {
    assert_out_matches_edges(graph);
    assert_in_mirrors_out(graph);
    assert_und_is_union(graph);
    assert_undirected_symmetric(graph);
    assert_neighbours_deterministic(graph);
}
