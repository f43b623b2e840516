//! Age-based expiration.

use diffuse_core::{PropagatedInformation, UserState};
use diffuse_policy::{iteration_rng, ExpirationMechanism, PolicyContext, PolicyError};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::piece_age;

/// Expires a piece once it is `max_age` iterations old.
#[derive(Clone, Copy, Debug)]
pub struct TimedExpiration {
    max_age: u32,
}

impl TimedExpiration {
    /// Create the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidParameter`] if `max_age` is zero.
    pub fn new(max_age: u32) -> Result<Self, PolicyError> {
        if max_age == 0 {
            return Err(PolicyError::invalid("timed", "max_age must be at least 1"));
        }
        Ok(Self { max_age })
    }
}

impl ExpirationMechanism for TimedExpiration {
    fn name(&self) -> &str {
        "timed"
    }

    fn expired(
        &mut self,
        user: &UserState,
        info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        Ok(piece_age(user, info, ctx.iteration()) >= self.max_age)
    }
}

/// Expires a piece of age `a` with probability `1 - 2^(-a / half_life)`.
#[derive(Debug)]
pub struct ExponentialDecayExpiration {
    half_life: f64,
    seed: u64,
    rng: ChaCha8Rng,
}

impl ExponentialDecayExpiration {
    /// Create the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidParameter`] unless `half_life` is a
    /// positive finite number.
    pub fn new(half_life: f64, seed: u64) -> Result<Self, PolicyError> {
        if !(half_life.is_finite() && half_life > 0.0) {
            return Err(PolicyError::invalid(
                "exponential_decay",
                format!("half_life must be positive, got {half_life}"),
            ));
        }
        Ok(Self {
            half_life,
            seed,
            rng: iteration_rng(seed, 0),
        })
    }

    /// Probability that a piece of age `age` expires.
    pub fn probability(&self, age: u32) -> f64 {
        1.0 - (-(age as f64) / self.half_life).exp2()
    }
}

impl ExpirationMechanism for ExponentialDecayExpiration {
    fn name(&self) -> &str {
        "exponential_decay"
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        self.rng = iteration_rng(self.seed, ctx.iteration());
        Ok(())
    }

    fn expired(
        &mut self,
        user: &UserState,
        info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        let p = self.probability(piece_age(user, info, ctx.iteration()));
        let r: f64 = self.rng.gen();
        Ok(r < p)
    }
}
