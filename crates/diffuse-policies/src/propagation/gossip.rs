//! Rumour-spreading propagation.
//!
//! Once per iteration every user (ascending id) picks one partner among
//! its neighbours, avoiding the partners it contacted in the last
//! `wait_time` picks. When every neighbour is in the window the least
//! recent one is picked, so no partner repeats within
//! `min(wait_time, neighbours)` consecutive picks. The mode decides which
//! way pieces flow between the pair.

use diffuse_core::{EdgeOrientation, PropagatedInformation, UserId, UserState};
use diffuse_policy::{iteration_rng, PolicyContext, PolicyError, PropagationMechanism, Readiness};
use rand::Rng;

use super::window::{PartnerTable, RevisitWindow};

/// Direction of the exchange between a user and its partner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GossipMode {
    /// Both send to each other.
    PushPull,
    /// The user sends to the partner.
    Push,
    /// The partner sends to the user.
    Pull,
}

/// Gossip propagation with a revisit window.
#[derive(Debug)]
pub struct Gossip {
    mode: GossipMode,
    wait_time: usize,
    orientation: EdgeOrientation,
    seed: u64,
    windows: RevisitWindow,
    partners: PartnerTable,
    readiness: Readiness,
}

impl Gossip {
    /// Gossip in `mode`.
    pub fn new(mode: GossipMode, wait_time: usize, orientation: EdgeOrientation, seed: u64) -> Self {
        Self {
            mode,
            wait_time,
            orientation,
            seed,
            windows: RevisitWindow::default(),
            partners: PartnerTable::default(),
            readiness: Readiness::default(),
        }
    }

    /// Push-pull gossip.
    pub fn push_pull(wait_time: usize, orientation: EdgeOrientation, seed: u64) -> Self {
        Self::new(GossipMode::PushPull, wait_time, orientation, seed)
    }

    /// Push gossip.
    pub fn push(wait_time: usize, orientation: EdgeOrientation, seed: u64) -> Self {
        Self::new(GossipMode::Push, wait_time, orientation, seed)
    }

    /// Pull gossip.
    pub fn pull(wait_time: usize, orientation: EdgeOrientation, seed: u64) -> Self {
        Self::new(GossipMode::Pull, wait_time, orientation, seed)
    }

    /// The exchange direction.
    pub fn mode(&self) -> GossipMode {
        self.mode
    }

    /// Current revisit windows.
    pub fn windows(&self) -> &RevisitWindow {
        &self.windows
    }

    fn register(&mut self, user: UserId, partner: UserId) {
        match self.mode {
            GossipMode::PushPull => self.partners.link_both(user, partner),
            GossipMode::Push => self.partners.link(user, partner),
            GossipMode::Pull => self.partners.link(partner, user),
        }
    }
}

impl PropagationMechanism for Gossip {
    fn name(&self) -> &str {
        match self.mode {
            GossipMode::PushPull => "push_pull_gossip",
            GossipMode::Push => "push_gossip",
            GossipMode::Pull => "pull_gossip",
        }
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
                .filter(|&v| v != u)
                .collect();
            if pool.is_empty() {
                continue;
            }
            let candidates = self.windows.candidates(u, &pool);
            let partner = candidates[rng.gen_range(0..candidates.len())];
            self.windows
                .record(u, partner, self.wait_time.min(pool.len()));
            self.register(u, partner);
            pairs += 1;
        }

        self.readiness.mark_ready(ctx.iteration());
        tracing::trace!(
            policy = self.name(),
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
