//! Push-pull gossip biased towards, or restricted to, recommended contacts.

use diffuse_core::{EdgeOrientation, PropagatedInformation, UserId, UserState};
use diffuse_policy::{
    check_probability, iteration_rng, PolicyContext, PolicyError, PropagationMechanism, Readiness,
};
use rand::Rng;

use super::window::{PartnerTable, RevisitWindow};

/// Push-pull gossip where each partner is drawn from the recommended
/// neighbours with probability `recommended_probability` and from the
/// organic ones otherwise.
///
/// Both pools skip the revisit window. If both filtered pools are empty
/// the window is relaxed as in [`Gossip`](super::Gossip). An empty pool
/// borrows the other one.
#[derive(Debug)]
pub struct RecommenderGossip {
    recommended_probability: f64,
    wait_time: usize,
    orientation: EdgeOrientation,
    seed: u64,
    windows: RevisitWindow,
    partners: PartnerTable,
    readiness: Readiness,
}

impl RecommenderGossip {
    /// Create the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidParameter`] if the probability is
    /// outside `[0, 1]`.
    pub fn new(
        recommended_probability: f64,
        wait_time: usize,
        orientation: EdgeOrientation,
        seed: u64,
    ) -> Result<Self, PolicyError> {
        check_probability(
            "recommender_gossip",
            "recommended_probability",
            recommended_probability,
        )?;
        Ok(Self {
            recommended_probability,
            wait_time,
            orientation,
            seed,
            windows: RevisitWindow::default(),
            partners: PartnerTable::default(),
            readiness: Readiness::default(),
        })
    }

    /// Current revisit windows.
    pub fn windows(&self) -> &RevisitWindow {
        &self.windows
    }
}

impl PropagationMechanism for RecommenderGossip {
    fn name(&self) -> &str {
        "recommender_gossip"
    }

    fn depends_on_piece(&self) -> bool {
        false
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        let n = ctx.data().user_count();
        let graph = ctx.graph();
        let mut rng = iteration_rng(self.seed, ctx.iteration());
        self.windows.ensure_users(n);
        self.partners.reset(n);

        for u in ctx.user_ids() {
            let (rec, org): (Vec<UserId>, Vec<UserId>) = graph
                .neighbours(u, self.orientation)
                .into_iter()
                .filter(|&v| v != u)
                .partition(|&v| {
                    graph
                        .edge_towards(u, v, self.orientation)
                        .is_some_and(|e| e.is_recommended())
                });
            let total = rec.len() + org.len();
            if total == 0 {
                continue;
            }
            let mut fresh_rec = self.windows.filter(u, &rec).to_vec();
            let mut fresh_org = self.windows.filter(u, &org).to_vec();
            if fresh_rec.is_empty() && fresh_org.is_empty() {
                let all: Vec<UserId> = rec.iter().chain(&org).copied().collect();
                let relaxed = self.windows.candidates(u, &all);
                fresh_rec = rec.into_iter().filter(|v| relaxed.contains(v)).collect();
                fresh_org = org.into_iter().filter(|v| relaxed.contains(v)).collect();
            }
            if fresh_rec.is_empty() {
                fresh_rec = fresh_org.clone();
            } else if fresh_org.is_empty() {
                fresh_org = fresh_rec.clone();
            }

            let r: f64 = rng.gen();
            let pool = if r < self.recommended_probability {
                &fresh_rec
            } else {
                &fresh_org
            };
            let partner = pool[rng.gen_range(0..pool.len())];
            self.windows.record(u, partner, self.wait_time.min(total));
            self.partners.link_both(u, partner);
        }

        self.readiness.mark_ready(ctx.iteration());
        tracing::trace!(
            policy = "recommender_gossip",
            iteration = ctx.iteration(),
            "gossip partners drawn"
        );
        Ok(())
    }

    fn targets(
        &mut self,
        sender: &UserState,
        _info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<Vec<UserId>, PolicyError> {
        self.readiness.check(self.name(), ctx.iteration())?;
        Ok(self.partners.of(sender.user()))
    }
}

/// Push-pull gossip over recommended neighbours only.
///
/// Organic neighbours are never drawn. A user without recommended
/// neighbours draws nobody, though it still exchanges with users that
/// drew it. The revisit window works as in [`Gossip`](super::Gossip).
#[derive(Debug)]
pub struct PureRecommenderGossip {
    wait_time: usize,
    orientation: EdgeOrientation,
    seed: u64,
    windows: RevisitWindow,
    partners: PartnerTable,
    readiness: Readiness,
}

impl PureRecommenderGossip {
    /// Create the policy.
    pub fn new(wait_time: usize, orientation: EdgeOrientation, seed: u64) -> Self {
        Self {
            wait_time,
            orientation,
            seed,
            windows: RevisitWindow::default(),
            partners: PartnerTable::default(),
            readiness: Readiness::default(),
        }
    }

    /// Current revisit windows.
    pub fn windows(&self) -> &RevisitWindow {
        &self.windows
    }
}

impl PropagationMechanism for PureRecommenderGossip {
    fn name(&self) -> &str {
        "pure_recommender_gossip"
    }

    fn depends_on_piece(&self) -> bool {
        false
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        let n = ctx.data().user_count();
        let graph = ctx.graph();
        let mut rng = iteration_rng(self.seed, ctx.iteration());
        self.windows.ensure_users(n);
        self.partners.reset(n);

        let mut pairs = 0usize;
        for u in ctx.user_ids() {
            let pool: Vec<UserId> = graph
                .neighbours(u, self.orientation)
                .into_iter()
                .filter(|&v| {
                    v != u
                        && graph
                            .edge_towards(u, v, self.orientation)
                            .is_some_and(|e| e.is_recommended())
                })
                .collect();
            if pool.is_empty() {
                continue;
            }
            let candidates = self.windows.candidates(u, &pool);
            let partner = candidates[rng.gen_range(0..candidates.len())];
            self.windows
                .record(u, partner, self.wait_time.min(pool.len()));
            self.partners.link_both(u, partner);
            pairs += 1;
        }

        self.readiness.mark_ready(ctx.iteration());
        tracing::trace!(
            policy = "pure_recommender_gossip",
            iteration = ctx.iteration(),
            pairs,
            "gossip partners drawn"
        );
        Ok(())
    }

    fn targets(
        &mut self,
        sender: &UserState,
        _info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<Vec<UserId>, PolicyError> {
        self.readiness.check(self.name(), ctx.iteration())?;
        Ok(self.partners.of(sender.user()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::{PieceId, SimulationState};
    use diffuse_test_utils::{random_graph, recommended_star};

    fn info() -> PropagatedInformation {
        PropagatedInformation::new(PieceId(0), 1, UserId(0))
    }

    fn hub_targets(p: f64, seed: u64) -> Vec<UserId> {
        // Leaves 1..=3 organic, 4..=6 recommended.
        let data = recommended_star(3, 3);
        let state = SimulationState::initialize(&data).unwrap();
        let ctx = PolicyContext::new(&data, &state, 1, None);
        let mut g = RecommenderGossip::new(p, 1, EdgeOrientation::Out, seed).unwrap();
        g.reset_selections(&ctx).unwrap();
        g.targets(&state.users()[0], &info(), &ctx).unwrap()
    }

    #[test]
    fn probability_one_picks_a_recommended_partner() {
        for seed in 0..8 {
            let t = hub_targets(1.0, seed);
            assert_eq!(t.len(), 1);
            assert!(t[0].0 >= 4, "seed {seed} picked {}", t[0]);
        }
    }

    #[test]
    fn probability_zero_picks_an_organic_partner() {
        for seed in 0..8 {
            let t = hub_targets(0.0, seed);
            assert_eq!(t.len(), 1);
            assert!((1..=3).contains(&t[0].0), "seed {seed} picked {}", t[0]);
        }
    }

    #[test]
    fn requires_reset() {
        let data = recommended_star(1, 1);
        let state = SimulationState::initialize(&data).unwrap();
        let ctx = PolicyContext::new(&data, &state, 1, None);
        let mut g = RecommenderGossip::new(0.5, 1, EdgeOrientation::Out, 0).unwrap();
        assert!(g.targets(&state.users()[0], &info(), &ctx).is_err());
    }

    #[test]
    fn rejects_bad_probability() {
        assert!(RecommenderGossip::new(2.0, 1, EdgeOrientation::Out, 0).is_err());
    }

    #[test]
    fn pure_gossip_never_draws_an_organic_partner() {
        let data = recommended_star(3, 3);
        let state = SimulationState::initialize(&data).unwrap();
        for seed in 0..8 {
            let mut g = PureRecommenderGossip::new(2, EdgeOrientation::Out, seed);
            for it in 1..=6 {
                let ctx = PolicyContext::new(&data, &state, it, None);
                g.reset_selections(&ctx).unwrap();
                let t = g.targets(&state.users()[0], &info(), &ctx).unwrap();
                assert_eq!(t.len(), 1);
                assert!(t[0].0 >= 4, "seed {seed} picked {}", t[0]);
                // Organic leaves are never linked back either.
                for leaf in 1..=3 {
                    assert!(g.targets(&state.users()[leaf], &info(), &ctx).unwrap().is_empty());
                }
            }
        }
    }

    #[test]
    fn pure_gossip_links_only_recommended_pairs() {
        let data = random_graph(14, 0.3, 8);
        let state = SimulationState::initialize(&data).unwrap();
        let mut g = PureRecommenderGossip::new(1, EdgeOrientation::Und, 2);
        for it in 1..=5 {
            let ctx = PolicyContext::new(&data, &state, it, None);
            g.reset_selections(&ctx).unwrap();
            for u in state.users() {
                for t in g.targets(u, &info(), &ctx).unwrap() {
                    let edge = ctx.graph().edge_towards(u.user(), t, EdgeOrientation::Und);
                    assert!(edge.is_some_and(|e| e.is_recommended()), "{} -> {t}", u.user());
                }
            }
        }
    }

    #[test]
    fn pure_gossip_without_recommended_edges_is_silent() {
        let data = recommended_star(3, 0);
        let state = SimulationState::initialize(&data).unwrap();
        let ctx = PolicyContext::new(&data, &state, 1, None);
        let mut g = PureRecommenderGossip::new(1, EdgeOrientation::Out, 0);
        g.reset_selections(&ctx).unwrap();
        for u in state.users() {
            assert!(g.targets(u, &info(), &ctx).unwrap().is_empty());
        }
    }
}
