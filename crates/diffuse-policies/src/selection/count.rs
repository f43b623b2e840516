//! Count-bounded selection.
//!
//! Each of the three pools (own, seen, propagated) is sampled with its own
//! [`Count`]. Randomness comes from a ChaCha8 generator reseeded from
//! `(seed, iteration)` in `reset_selections`.
//!
//! Constructed via the builder pattern: [`CountSelection::builder`].

use diffuse_core::{PropagatedInformation, UserState};
use diffuse_policy::{
    iteration_rng, outgoing, sample, Count, PolicyContext, PolicyError, Selection,
    SelectionMechanism,
};
use rand_chacha::ChaCha8Rng;

/// Samples up to a fixed number of pieces from each pool.
#[derive(Debug)]
pub struct CountSelection {
    own: Count,
    received: Count,
    repropagate: Count,
    seed: u64,
    rng: ChaCha8Rng,
}

/// Builder for [`CountSelection`].
///
/// Defaults: one own piece, every seen piece, no repropagation, seed 0.
pub struct CountSelectionBuilder {
    own: Count,
    received: Count,
    repropagate: Count,
    seed: u64,
}

impl CountSelection {
    /// Create a new builder.
    pub fn builder() -> CountSelectionBuilder {
        CountSelectionBuilder {
            own: Count::Exactly(1),
            received: Count::All,
            repropagate: Count::None,
            seed: 0,
        }
    }

    /// Pull-push / epidemic selection: every pool is taken whole.
    pub fn epidemic() -> Self {
        Self::with_counts(Count::All, Count::All, Count::All, 0)
    }

    fn with_counts(own: Count, received: Count, repropagate: Count, seed: u64) -> Self {
        Self {
            own,
            received,
            repropagate,
            seed,
            rng: iteration_rng(seed, 0),
        }
    }

    /// Sample the three pools of `user` and stamp the result.
    pub(crate) fn sample_pools(
        &mut self,
        user: &UserState,
        received_pool: &[PropagatedInformation],
        iteration: u32,
    ) -> Selection {
        let me = user.user();
        let own_pool: Vec<PropagatedInformation> = user.own_pool().copied().collect();
        let repr_pool: Vec<PropagatedInformation> = user.propagated().iter().copied().collect();
        let stamp = |v: Vec<PropagatedInformation>| {
            v.iter().map(|i| outgoing(i, iteration, me)).collect::<Vec<_>>()
        };
        Selection {
            own: stamp(sample(&own_pool, self.own, &mut self.rng)),
            received: stamp(sample(received_pool, self.received, &mut self.rng)),
            repropagated: stamp(sample(&repr_pool, self.repropagate, &mut self.rng)),
        }
    }
}

impl CountSelectionBuilder {
    /// Count for own, not yet propagated pieces.
    pub fn own(mut self, count: Count) -> Self {
        self.own = count;
        self
    }

    /// Count for seen pieces.
    pub fn received(mut self, count: Count) -> Self {
        self.received = count;
        self
    }

    /// Count for already propagated pieces.
    pub fn repropagate(mut self, count: Count) -> Self {
        self.repropagate = count;
        self
    }

    /// Seed of the sampling generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the policy.
    pub fn build(self) -> CountSelection {
        CountSelection::with_counts(self.own, self.received, self.repropagate, self.seed)
    }
}

impl SelectionMechanism for CountSelection {
    fn name(&self) -> &str {
        "count"
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
        let seen: Vec<PropagatedInformation> = user.seen().iter().copied().collect();
        Ok(self.sample_pools(user, &seen, ctx.iteration()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::{PieceId, SimulationState, UserId};
    use diffuse_test_utils::{deliver_and_see, owning_star};
    use proptest::prelude::*;

    #[test]
    fn own_count_one_takes_a_single_piece() {
        let data = owning_star(5, 3);
        let state = SimulationState::initialize(&data).unwrap();
        let ctx = PolicyContext::new(&data, &state, 1, None);
        let mut sel = CountSelection::builder().own(Count::Exactly(1)).seed(3).build();
        sel.reset_selections(&ctx).unwrap();
        let s = sel.select(&state.users()[0], &ctx).unwrap();
        assert_eq!(s.own.len(), 1);
        assert!(s.received.is_empty());
        assert!(s.repropagated.is_empty());
        assert_eq!(s.own[0].origin, UserId(0));
        assert_eq!(s.own[0].iteration, 1);
    }

    #[test]
    fn epidemic_takes_every_pool() {
        let data = owning_star(3, 2);
        let mut state = SimulationState::initialize(&data).unwrap();
        state.user_mut(UserId(0)).unwrap().mark_propagated(PieceId(0), 1);
        // Leaf 1 owns piece 3.
        deliver_and_see(&mut state, UserId(0), PieceId(3), UserId(1), 1);
        let ctx = PolicyContext::new(&data, &state, 2, None);
        let mut sel = CountSelection::epidemic();
        sel.reset_selections(&ctx).unwrap();
        let s = sel.select(&state.users()[0], &ctx).unwrap();
        assert_eq!(s.own.len(), 2);
        assert_eq!(s.received.len(), 1);
        assert_eq!(s.received[0].piece, PieceId(3));
        assert_eq!(s.repropagated.len(), 1);
        assert_eq!(s.repropagated[0].piece, PieceId(0));
    }

    #[test]
    fn same_seed_same_iteration_same_selection() {
        let data = owning_star(20, 1);
        let state = SimulationState::initialize(&data).unwrap();
        let ctx = PolicyContext::new(&data, &state, 4, None);
        let run = || {
            let mut sel = CountSelection::builder().own(Count::Exactly(5)).seed(11).build();
            sel.reset_selections(&ctx).unwrap();
            sel.select(&state.users()[0], &ctx).unwrap()
        };
        assert_eq!(run(), run());
    }

    proptest! {
        #[test]
        fn own_sampling_bound(pieces in 0usize..15, n in 0usize..20, seed in any::<u64>()) {
            let data = owning_star(pieces, 1);
            let state = SimulationState::initialize(&data).unwrap();
            let ctx = PolicyContext::new(&data, &state, 1, None);
            let mut sel = CountSelection::builder().own(Count::Exactly(n)).seed(seed).build();
            sel.reset_selections(&ctx).unwrap();
            let s = sel.select(&state.users()[0], &ctx).unwrap();
            prop_assert!(s.own.len() <= n.min(pieces));
            if n >= pieces {
                prop_assert_eq!(s.own.len(), pieces);
            }
        }
    }
}
