//! Count-bounded sight.

use diffuse_core::{Arrival, PieceId, UserState};
use diffuse_policy::{
    iteration_rng, sample, Count, PolicyContext, PolicyError, SightMechanism,
};
use rand_chacha::ChaCha8Rng;

/// Notices a uniform sample of the inbox, bounded by `count`, each
/// iteration. The sample keeps inbox order.
#[derive(Debug)]
pub struct CountSight {
    count: Count,
    seed: u64,
    rng: ChaCha8Rng,
}

impl CountSight {
    /// Notice up to `count` pieces per iteration.
    pub fn new(count: Count, seed: u64) -> Self {
        Self {
            count,
            seed,
            rng: iteration_rng(seed, 0),
        }
    }
}

impl SightMechanism for CountSight {
    fn name(&self) -> &str {
        "count"
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        self.rng = iteration_rng(self.seed, ctx.iteration());
        Ok(())
    }

    /// A single arrival on its own always fits the budget unless the
    /// count is `None`.
    fn sees(
        &mut self,
        _user: &UserState,
        _arrival: &Arrival,
        _ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        Ok(self.count.bound(1) == 1)
    }

    fn observe(
        &mut self,
        user: &UserState,
        _ctx: &PolicyContext<'_>,
    ) -> Result<Vec<PieceId>, PolicyError> {
        let pool: Vec<PieceId> = user.inbox().keys().copied().collect();
        Ok(sample(&pool, self.count, &mut self.rng))
    }
}
