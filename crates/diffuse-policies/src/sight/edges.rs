//! Sight policies that look at the edges an arrival came through.

use diffuse_core::{Arrival, EdgeOrientation, UserState};
use diffuse_policy::{
    check_probability, iteration_rng, PolicyContext, PolicyError, SightMechanism,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Notices an arrival when at least one sender reached the user over an
/// organic edge.
///
/// A sender with no edge to the user (gossip partners can be non
/// neighbours along the chosen orientation) counts as organic.
#[derive(Clone, Copy, Debug)]
pub struct OrganicSight {
    orientation: EdgeOrientation,
}

impl OrganicSight {
    /// Inspect edges along `orientation`.
    pub fn new(orientation: EdgeOrientation) -> Self {
        Self { orientation }
    }
}

impl SightMechanism for OrganicSight {
    fn name(&self) -> &str {
        "organic"
    }

    fn sees(
        &mut self,
        user: &UserState,
        arrival: &Arrival,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        let graph = ctx.graph();
        Ok(arrival.senders.iter().any(|&s| {
            !graph
                .edge_towards(user.user(), s, self.orientation)
                .is_some_and(|e| e.is_recommended())
        }))
    }
}

/// Notices each sender's copy with a probability that depends on the
/// sender's edge kind.
///
/// One draw per sender, in arrival order. The piece is noticed as soon as
/// one draw succeeds.
#[derive(Debug)]
pub struct RecommendedSight {
    recommended_probability: f64,
    organic_probability: f64,
    orientation: EdgeOrientation,
    seed: u64,
    rng: ChaCha8Rng,
}

impl RecommendedSight {
    /// Create the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidParameter`] if a probability is
    /// outside `[0, 1]`.
    pub fn new(
        recommended_probability: f64,
        organic_probability: f64,
        orientation: EdgeOrientation,
        seed: u64,
    ) -> Result<Self, PolicyError> {
        check_probability("recommended", "recommended_probability", recommended_probability)?;
        check_probability("recommended", "organic_probability", organic_probability)?;
        Ok(Self {
            recommended_probability,
            organic_probability,
            orientation,
            seed,
            rng: iteration_rng(seed, 0),
        })
    }
}

impl SightMechanism for RecommendedSight {
    fn name(&self) -> &str {
        "recommended"
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        self.rng = iteration_rng(self.seed, ctx.iteration());
        Ok(())
    }

    fn sees(
        &mut self,
        user: &UserState,
        arrival: &Arrival,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        let graph = ctx.graph();
        for &sender in &arrival.senders {
            let recommended = graph
                .edge_towards(user.user(), sender, self.orientation)
                .is_some_and(|e| e.is_recommended());
            let p = if recommended {
                self.recommended_probability
            } else {
                self.organic_probability
            };
            let r: f64 = self.rng.gen();
            if r < p {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
