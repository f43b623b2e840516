//! Error type shared by all policy families.

use diffuse_core::DataError;
use thiserror::Error;

/// Errors raised by a policy while computing its decision.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A stateful policy was queried before `reset_selections` ran for the
    /// current iteration.
    #[error("policy '{policy}' queried at iteration {iteration} before reset_selections")]
    NotReset {
        /// Name of the policy.
        policy: String,
        /// Iteration being computed.
        iteration: u32,
    },
    /// A constructor parameter is out of range.
    #[error("policy '{policy}': {reason}")]
    InvalidParameter {
        /// Name of the policy.
        policy: String,
        /// What is wrong with the parameter.
        reason: String,
    },
    /// The state referenced an entity unknown to the data provider.
    #[error(transparent)]
    Data(#[from] DataError),
}

impl PolicyError {
    /// Shorthand for [`PolicyError::InvalidParameter`].
    pub fn invalid(policy: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            policy: policy.to_string(),
            reason: reason.into(),
        }
    }
}

/// Check that `p` is a probability in `[0, 1]`.
pub fn check_probability(policy: &str, name: &str, p: f64) -> Result<(), PolicyError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(PolicyError::invalid(
            policy,
            format!("{name} must be in [0, 1], got {p}"),
        ))
    }
}
