//! Selection biased towards, or restricted to, pieces received over
//! recommended edges.

use diffuse_core::{EdgeOrientation, PropagatedInformation, UserState};
use diffuse_policy::{
    check_probability, iteration_rng, outgoing, sample, Count, PolicyContext, PolicyError,
    Selection, SelectionMechanism,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Count-based selection where each seen piece slot is drawn from the
/// recommended pool with probability `recommended_probability` and from
/// the organic pool otherwise.
///
/// A seen piece belongs to the recommended pool when the edge linking the
/// user with the piece's origin (through `orientation`) is recommended.
/// When the chosen pool is exhausted the other one is used. Drawn pieces
/// leave their pool, so the loop ends after at most `|seen|` draws.
#[derive(Debug)]
pub struct RecommenderSelection {
    own: Count,
    received: Count,
    repropagate: Count,
    recommended_probability: f64,
    orientation: EdgeOrientation,
    seed: u64,
    rng: ChaCha8Rng,
}

impl RecommenderSelection {
    /// Create the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidParameter`] if the probability is
    /// outside `[0, 1]`.
    pub fn new(
        own: Count,
        received: Count,
        repropagate: Count,
        recommended_probability: f64,
        orientation: EdgeOrientation,
        seed: u64,
    ) -> Result<Self, PolicyError> {
        check_probability("recommender", "recommended_probability", recommended_probability)?;
        Ok(Self {
            own,
            received,
            repropagate,
            recommended_probability,
            orientation,
            seed,
            rng: iteration_rng(seed, 0),
        })
    }
}

impl SelectionMechanism for RecommenderSelection {
    fn name(&self) -> &str {
        "recommender"
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        self.rng = iteration_rng(self.seed, ctx.iteration());
        Ok(())
    }

    fn select(
        &mut self,
        user: &UserState,
        ctx: &PolicyContext<'_>,
    ) -> Result<Selection, PolicyError> {
        let me = user.user();
        let it = ctx.iteration();
        let graph = ctx.graph();

        let own_pool: Vec<PropagatedInformation> = user.own_pool().copied().collect();
        let own = sample(&own_pool, self.own, &mut self.rng);

        let (mut rec, mut org): (Vec<_>, Vec<_>) = user.seen().iter().copied().partition(|i| {
            graph
                .edge_towards(me, i.origin, self.orientation)
                .is_some_and(|e| e.is_recommended())
        });
        let wanted = self.received.bound(rec.len() + org.len());
        let mut received = Vec::with_capacity(wanted);
        while received.len() < wanted {
            let r: f64 = self.rng.gen();
            let pool = if org.is_empty() || (r < self.recommended_probability && !rec.is_empty()) {
                &mut rec
            } else {
                &mut org
            };
            let idx = self.rng.gen_range(0..pool.len());
            received.push(pool.swap_remove(idx));
        }

        let repr_pool: Vec<PropagatedInformation> = user.propagated().iter().copied().collect();
        let repropagated = sample(&repr_pool, self.repropagate, &mut self.rng);

        let stamp = |v: Vec<PropagatedInformation>| {
            v.iter().map(|i| outgoing(i, it, me)).collect::<Vec<_>>()
        };
        Ok(Selection {
            own: stamp(own),
            received: stamp(received),
            repropagated: stamp(repropagated),
        })
    }
}

/// Count-based selection that only forwards seen pieces received over
/// recommended edges.
///
/// Own and repropagated pieces are sampled as in
/// [`CountSelection`](crate::CountSelection). A seen piece is only a
/// candidate when the edge towards its origin is recommended.
#[derive(Debug)]
pub struct PureRecommenderSelection {
    own: Count,
    received: Count,
    repropagate: Count,
    orientation: EdgeOrientation,
    seed: u64,
    rng: ChaCha8Rng,
}

impl PureRecommenderSelection {
    /// Create the policy.
    pub fn new(
        own: Count,
        received: Count,
        repropagate: Count,
        orientation: EdgeOrientation,
        seed: u64,
    ) -> Self {
        Self {
            own,
            received,
            repropagate,
            orientation,
            seed,
            rng: iteration_rng(seed, 0),
        }
    }
}

impl SelectionMechanism for PureRecommenderSelection {
    fn name(&self) -> &str {
        "pure_recommender"
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        self.rng = iteration_rng(self.seed, ctx.iteration());
        Ok(())
    }

    fn select(
        &mut self,
        user: &UserState,
        ctx: &PolicyContext<'_>,
    ) -> Result<Selection, PolicyError> {
        let me = user.user();
        let it = ctx.iteration();
        let graph = ctx.graph();

        let own_pool: Vec<PropagatedInformation> = user.own_pool().copied().collect();
        let own = sample(&own_pool, self.own, &mut self.rng);

        let rec_pool: Vec<PropagatedInformation> = user
            .seen()
            .iter()
            .filter(|i| {
                graph
                    .edge_towards(me, i.origin, self.orientation)
                    .is_some_and(|e| e.is_recommended())
            })
            .copied()
            .collect();
        let received = sample(&rec_pool, self.received, &mut self.rng);

        let repr_pool: Vec<PropagatedInformation> = user.propagated().iter().copied().collect();
        let repropagated = sample(&repr_pool, self.repropagate, &mut self.rng);

        let stamp = |v: Vec<PropagatedInformation>| {
            v.iter().map(|i| outgoing(i, it, me)).collect::<Vec<_>>()
        };
        Ok(Selection {
            own: stamp(own),
            received: stamp(received),
            repropagated: stamp(repropagated),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::{PieceId, SimulationState, UserId};
    use diffuse_test_utils::{deliver_and_see, recommended_star};

    /// Hub 0 with organic leaves 1..=3 and recommended leaves 4..=6; each
    /// leaf owns one piece, delivered to and seen by the hub.
    fn hub_with_mixed_inbox() -> (diffuse_graph::StaticData, SimulationState) {
        let data = recommended_star(3, 3);
        let mut state = SimulationState::initialize(&data).unwrap();
        for leaf in 1..=6u32 {
            deliver_and_see(&mut state, UserId(0), PieceId(leaf - 1), UserId(leaf), 1);
        }
        (data, state)
    }

    #[test]
    fn probability_one_prefers_recommended_pool() {
        let (data, state) = hub_with_mixed_inbox();
        let ctx = PolicyContext::new(&data, &state, 2, None);
        let mut sel = RecommenderSelection::new(
            Count::None,
            Count::Exactly(3),
            Count::None,
            1.0,
            EdgeOrientation::Out,
            5,
        )
        .unwrap();
        sel.reset_selections(&ctx).unwrap();
        let s = sel.select(&state.users()[0], &ctx).unwrap();
        let mut pieces: Vec<u32> = s.received.iter().map(|i| i.piece.0).collect();
        pieces.sort_unstable();
        assert_eq!(pieces, vec![3, 4, 5]);
    }

    #[test]
    fn exhausted_pool_falls_back_to_the_other() {
        let (data, state) = hub_with_mixed_inbox();
        let ctx = PolicyContext::new(&data, &state, 2, None);
        let mut sel = RecommenderSelection::new(
            Count::None,
            Count::Exactly(5),
            Count::None,
            0.0,
            EdgeOrientation::Out,
            5,
        )
        .unwrap();
        sel.reset_selections(&ctx).unwrap();
        let s = sel.select(&state.users()[0], &ctx).unwrap();
        assert_eq!(s.received.len(), 5);
        let organic = s.received.iter().filter(|i| i.piece.0 < 3).count();
        assert_eq!(organic, 3);
    }

    #[test]
    fn rejects_bad_probability() {
        assert!(RecommenderSelection::new(
            Count::All,
            Count::All,
            Count::None,
            1.5,
            EdgeOrientation::Out,
            0
        )
        .is_err());
    }

    #[test]
    fn pure_selection_skips_organic_pieces() {
        let (data, state) = hub_with_mixed_inbox();
        for seed in 0..6 {
            let ctx = PolicyContext::new(&data, &state, 2, None);
            let mut sel = PureRecommenderSelection::new(
                Count::None,
                Count::All,
                Count::None,
                EdgeOrientation::Out,
                seed,
            );
            sel.reset_selections(&ctx).unwrap();
            let s = sel.select(&state.users()[0], &ctx).unwrap();
            let mut pieces: Vec<u32> = s.received.iter().map(|i| i.piece.0).collect();
            pieces.sort_unstable();
            assert_eq!(pieces, vec![3, 4, 5]);

            let mut one = PureRecommenderSelection::new(
                Count::None,
                Count::Exactly(1),
                Count::None,
                EdgeOrientation::Out,
                seed,
            );
            one.reset_selections(&ctx).unwrap();
            let s = one.select(&state.users()[0], &ctx).unwrap();
            assert_eq!(s.received.len(), 1);
            assert!(s.received[0].piece.0 >= 3);
        }
    }

    #[test]
    fn pure_selection_with_only_organic_pieces_forwards_none() {
        let data = recommended_star(3, 0);
        let mut state = SimulationState::initialize(&data).unwrap();
        for leaf in 1..=3u32 {
            deliver_and_see(&mut state, UserId(0), PieceId(leaf - 1), UserId(leaf), 1);
        }
        let ctx = PolicyContext::new(&data, &state, 2, None);
        let mut sel =
            PureRecommenderSelection::new(Count::All, Count::All, Count::None, EdgeOrientation::Out, 1);
        sel.reset_selections(&ctx).unwrap();
        let s = sel.select(&state.users()[0], &ctx).unwrap();
        assert!(s.received.is_empty());
        assert!(s.own.is_empty());
    }
}
