//! Test fixtures and mock policies for Diffuse development.
//!
//! Data fixtures build small [`StaticData`] networks with known shapes;
//! [`fixtures`] holds mock policies for exercising engine error paths.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use diffuse_core::{Edge, PieceId, PropagatedInformation, SimulationState, UserId};
use diffuse_graph::StaticData;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ── Data fixtures ───────────────────────────────────────────────

/// Directed star: hub `0` points at leaves `1..=leaves`.
///
/// The hub owns pieces `0..pieces`; leaf `i` owns piece `pieces + i - 1`.
pub fn owning_star(pieces: usize, leaves: usize) -> StaticData {
    let mut b = StaticData::builder(true);
    b.add_user("hub").unwrap();
    for k in 0..pieces {
        b.add_piece(format!("h{k}"), &["hub"], None).unwrap();
    }
    for i in 1..=leaves {
        let leaf = format!("leaf{i}");
        b.add_user(leaf.clone()).unwrap();
        b.add_edge("hub", &leaf, Edge::organic()).unwrap();
        b.add_piece(format!("l{i}"), &[leaf.as_str()], None).unwrap();
    }
    b.build()
}

/// Directed star whose hub `0` points at `organic` leaves over organic
/// edges, then at `recommended` leaves over recommended edges.
///
/// Leaf `i` owns piece `i - 1`; the hub owns nothing.
pub fn recommended_star(organic: usize, recommended: usize) -> StaticData {
    let mut b = StaticData::builder(true);
    b.add_user("hub").unwrap();
    for i in 1..=organic + recommended {
        let leaf = format!("leaf{i}");
        b.add_user(leaf.clone()).unwrap();
        let edge = if i <= organic {
            Edge::organic()
        } else {
            Edge::recommended()
        };
        b.add_edge("hub", &leaf, edge).unwrap();
        b.add_piece(format!("l{i}"), &[leaf.as_str()], None).unwrap();
    }
    b.build()
}

/// Directed chain `1 -> 2 -> ... -> n` (ids `0..n`); user `1` owns the
/// single piece `P`.
pub fn chain(n: usize) -> StaticData {
    let mut b = StaticData::builder(true);
    let labels: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
    b.add_users(labels.iter().cloned()).unwrap();
    for pair in labels.windows(2) {
        b.add_edge(&pair[0], &pair[1], Edge::organic()).unwrap();
    }
    if let Some(first) = labels.first() {
        b.add_piece("P", &[first.as_str()], None).unwrap();
    }
    b.build()
}

/// Complete directed graph on `n` users; user `0` owns piece `p`.
pub fn complete(n: usize) -> StaticData {
    let mut b = StaticData::builder(true);
    let labels: Vec<String> = (0..n).map(|i| format!("u{i}")).collect();
    b.add_users(labels.iter().cloned()).unwrap();
    for from in &labels {
        for to in &labels {
            if from != to {
                b.add_edge(from, to, Edge::organic()).unwrap();
            }
        }
    }
    if n > 0 {
        b.add_piece("p", &["u0"], None).unwrap();
    }
    b.build()
}

/// Undirected ring on `n >= 3` users; user `0` owns piece `p`.
pub fn ring(n: usize) -> StaticData {
    let mut b = StaticData::builder(false);
    let labels: Vec<String> = (0..n).map(|i| format!("u{i}")).collect();
    b.add_users(labels.iter().cloned()).unwrap();
    for i in 0..n {
        b.add_edge(&labels[i], &labels[(i + 1) % n], Edge::organic())
            .unwrap();
    }
    b.add_piece("p", &["u0"], None).unwrap();
    b.build()
}

/// Three users with a timeline.
///
/// Edges `a -> b`, `b -> c`, `c -> b`. `a` creates `p0` and `c` creates
/// `p1`, both at t=10. `b` really re-shared `p0` at t=20 and never `p1`.
/// Timeline: `[10, 20]`.
pub fn timeline_data() -> StaticData {
    let mut b = StaticData::builder(true);
    b.add_users(["a", "b", "c"]).unwrap();
    b.add_edge("a", "b", Edge::organic()).unwrap();
    b.add_edge("b", "c", Edge::organic()).unwrap();
    b.add_edge("c", "b", Edge::organic()).unwrap();
    b.add_piece("p0", &["a"], Some(10)).unwrap();
    b.add_piece("p1", &["c"], Some(10)).unwrap();
    b.add_real_propagation("b", "p0", Some(20)).unwrap();
    b.build()
}

/// Random directed graph: each ordered pair is an arc with probability
/// `p`, one arc in five is recommended. User `i` owns piece `i`.
pub fn random_graph(n: usize, p: f64, seed: u64) -> StaticData {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = StaticData::builder(true);
    let labels: Vec<String> = (0..n).map(|i| format!("u{i}")).collect();
    b.add_users(labels.iter().cloned()).unwrap();
    for from in &labels {
        for to in &labels {
            if from != to && rng.gen::<f64>() < p {
                let edge = if rng.gen_range(0..5) == 0 {
                    Edge::recommended()
                } else {
                    Edge::organic()
                };
                b.add_edge(from, to, edge).unwrap();
            }
        }
    }
    for (i, label) in labels.iter().enumerate() {
        b.add_piece(format!("p{i}"), &[label.as_str()], None)
            .unwrap();
    }
    b.build()
}

// ── State helpers ───────────────────────────────────────────────

/// Deliver `piece` from `sender` to `user` during `iteration`, then move
/// it to `user`'s seen pool.
///
/// Panics if the user ignores the arrival.
pub fn deliver_and_see(
    state: &mut SimulationState,
    user: UserId,
    piece: PieceId,
    sender: UserId,
    iteration: u32,
) {
    let u = state.user_mut(user).unwrap();
    let outcome = u.receive(PropagatedInformation::new(piece, iteration, sender), sender);
    assert!(outcome.is_accepted(), "{user} ignored {piece}");
    assert!(u.see(piece));
}
