//! Ground-truth filtered selection.

use diffuse_core::{PropagatedInformation, UserId, UserState};
use diffuse_policy::{
    default_selectable_users, Count, PolicyContext, PolicyError, Selection, SelectionMechanism,
};

use super::count::CountSelection;

/// Count-based selection whose seen pool is narrowed to pieces the user
/// really re-propagated.
///
/// When the data carries a timeline, only users recorded as really
/// propagating at the current timestamp are selectable.
#[derive(Debug)]
pub struct RealPropagatedSelection {
    inner: CountSelection,
}

impl RealPropagatedSelection {
    /// Create the policy with one count per pool.
    pub fn new(own: Count, received: Count, repropagate: Count, seed: u64) -> Self {
        Self {
            inner: CountSelection::builder()
                .own(own)
                .received(received)
                .repropagate(repropagate)
                .seed(seed)
                .build(),
        }
    }
}

impl SelectionMechanism for RealPropagatedSelection {
    fn name(&self) -> &str {
        "real_propagated"
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        self.inner.reset_selections(ctx)
    }

    fn selectable_users(&self, ctx: &PolicyContext<'_>) -> Vec<UserId> {
        let candidates = default_selectable_users(ctx);
        match ctx.timestamp() {
            Some(ts) => {
                let active = ctx.data().real_propagators_at(ts);
                candidates
                    .into_iter()
                    .filter(|u| active.contains(u))
                    .collect()
            }
            None => candidates,
        }
    }

    fn select(
        &mut self,
        user: &UserState,
        ctx: &PolicyContext<'_>,
    ) -> Result<Selection, PolicyError> {
        let me = user.user();
        let data = ctx.data();
        let pool: Vec<PropagatedInformation> = user
            .seen()
            .iter()
            .filter(|i| data.is_real_propagated(me, i.piece))
            .copied()
            .collect();
        Ok(self.inner.sample_pools(user, &pool, ctx.iteration()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::{DiffusionData, PieceId, SimulationState, SocialGraph};
    use diffuse_graph::StaticData;
    use diffuse_test_utils::{deliver_and_see, timeline_data};

    /// Timeline data whose propagator lists come back in descending order.
    struct Descending(StaticData);

    impl DiffusionData for Descending {
        fn graph(&self) -> &dyn SocialGraph {
            self.0.graph()
        }
        fn user_count(&self) -> usize {
            self.0.user_count()
        }
        fn piece_count(&self) -> usize {
            self.0.piece_count()
        }
        fn user_label(&self, user: UserId) -> Option<&str> {
            self.0.user_label(user)
        }
        fn user_by_label(&self, label: &str) -> Option<UserId> {
            self.0.user_by_label(label)
        }
        fn piece_label(&self, piece: PieceId) -> Option<&str> {
            self.0.piece_label(piece)
        }
        fn piece_by_label(&self, label: &str) -> Option<PieceId> {
            self.0.piece_by_label(label)
        }
        fn creators(&self, piece: PieceId) -> &[UserId] {
            self.0.creators(piece)
        }
        fn own_pieces(&self, user: UserId) -> &[PieceId] {
            self.0.own_pieces(user)
        }
        fn timestamps(&self) -> &[i64] {
            self.0.timestamps()
        }
        fn real_propagators_at(&self, _timestamp: i64) -> &[UserId] {
            &[UserId(2), UserId(0)]
        }
    }

    #[test]
    fn seen_pool_is_filtered_by_ground_truth() {
        // u1 really re-shared p0 at t=20 but never p1.
        let data = timeline_data();
        let mut state = SimulationState::initialize(&data).unwrap();
        deliver_and_see(&mut state, UserId(1), PieceId(0), UserId(0), 1);
        deliver_and_see(&mut state, UserId(1), PieceId(1), UserId(2), 1);
        let ctx = PolicyContext::new(&data, &state, 2, None);
        let mut sel = RealPropagatedSelection::new(Count::None, Count::All, Count::None, 0);
        sel.reset_selections(&ctx).unwrap();
        let s = sel.select(&state.users()[1], &ctx).unwrap();
        let pieces: Vec<_> = s.received.iter().map(|i| i.piece).collect();
        assert_eq!(pieces, vec![PieceId(0)]);
    }

    #[test]
    fn selectable_users_follow_timeline() {
        let data = timeline_data();
        let mut state = SimulationState::initialize(&data).unwrap();
        deliver_and_see(&mut state, UserId(1), PieceId(0), UserId(0), 1);
        let sel = RealPropagatedSelection::new(Count::All, Count::All, Count::None, 0);

        let at_20 = PolicyContext::new(&data, &state, 2, Some(20));
        assert_eq!(sel.selectable_users(&at_20), vec![UserId(1)]);

        let at_10 = PolicyContext::new(&data, &state, 2, Some(10));
        assert!(sel.selectable_users(&at_10).is_empty());

        let untimed = PolicyContext::new(&data, &state, 2, None);
        assert_eq!(
            sel.selectable_users(&untimed),
            vec![UserId(0), UserId(1), UserId(2)]
        );
    }

    #[test]
    fn propagator_order_does_not_matter() {
        let data = Descending(timeline_data());
        let state = SimulationState::initialize(&data).unwrap();
        let sel = RealPropagatedSelection::new(Count::All, Count::All, Count::None, 0);
        let ctx = PolicyContext::new(&data, &state, 1, Some(10));
        assert_eq!(sel.selectable_users(&ctx), vec![UserId(0), UserId(2)]);
    }
}
