//! End-to-end checks of StaticData through the trait-object interface the
//! engine consumes.

use diffuse_core::{DiffusionData, Edge, EdgeOrientation, PieceId, SimulationState, UserId};
use diffuse_graph::StaticData;

fn star(directed: bool) -> StaticData {
    let mut b = StaticData::builder(directed);
    b.add_users(["hub", "a", "b", "c"]).unwrap();
    for leaf in ["a", "b", "c"] {
        b.add_edge("hub", leaf, Edge::organic()).unwrap();
    }
    b.add_piece("news", &["hub"], Some(1)).unwrap();
    b.add_piece("meme", &["c"], Some(3)).unwrap();
    b.build()
}

#[test]
fn trait_object_exposes_graph() {
    let data = star(true);
    let dyn_data: &dyn DiffusionData = &data;
    let hub = dyn_data.user_by_label("hub").unwrap();
    let out = dyn_data.graph().neighbours(hub, EdgeOrientation::Out);
    assert_eq!(out.len(), 3);
    assert!(dyn_data.graph().neighbours(hub, EdgeOrientation::In).is_empty());
}

#[test]
fn undirected_star_reaches_hub_from_leaves() {
    let data = star(false);
    let c = data.user_by_label("c").unwrap();
    let nb = data.graph().neighbours(c, EdgeOrientation::Out);
    assert_eq!(nb.as_slice(), &[UserId(0)]);
}

#[test]
fn initial_state_assigns_own_pieces() {
    let data = star(true);
    let state = SimulationState::initialize(&data).unwrap();
    assert_eq!(state.user_count(), 4);
    assert!(state.users()[0].own().contains(PieceId(0)));
    assert!(state.users()[3].own().contains(PieceId(1)));
    assert!(state.users()[1].own().is_empty());
    assert_eq!(state.iteration(), 0);
}

#[test]
fn out_of_range_ids_are_reported() {
    let data = star(true);
    assert!(data.check_user(UserId(4)).is_err());
    assert!(data.check_piece(PieceId(2)).is_err());
    assert!(data.check_piece(PieceId(1)).is_ok());
}
