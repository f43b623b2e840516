//! The [`PropagationMechanism`] trait and its reset micro-state.

use diffuse_core::{PropagatedInformation, UserId, UserState};

use crate::context::PolicyContext;
use crate::error::PolicyError;

/// Chooses the recipients of an offered piece.
///
/// # Contract
///
/// - `reset_selections()` runs once per iteration before any sender is
///   processed. Policies with per-iteration target lists build them
///   there and must refuse `targets()` queries for an iteration they
///   were not reset for.
/// - When `depends_on_piece()` is `false`, `targets()` returns the same
///   list for every piece of a given sender in an iteration, and the
///   engine may call it once per sender.
/// - A sender with no eligible neighbour gets an empty list. That is not
///   an error.
pub trait PropagationMechanism: Send {
    /// Human-readable name for error reporting and logs.
    fn name(&self) -> &str;

    /// Whether targets can differ between pieces of the same sender.
    fn depends_on_piece(&self) -> bool;

    /// Rebuild per-iteration target lists.
    fn reset_selections(&mut self, _ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        Ok(())
    }

    /// Recipients of `info` offered by `sender`.
    fn targets(
        &mut self,
        sender: &UserState,
        info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<Vec<UserId>, PolicyError>;
}

/// Explicit `NEEDS_RESET -> READY` state of a policy with per-iteration
/// memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Readiness {
    /// Memory is stale.
    #[default]
    NeedsReset,
    /// Memory was rebuilt for `iteration`.
    Ready {
        /// The iteration the memory belongs to.
        iteration: u32,
    },
}

impl Readiness {
    /// Record that memory was rebuilt for `iteration`.
    pub fn mark_ready(&mut self, iteration: u32) {
        *self = Self::Ready { iteration };
    }

    /// Fail unless memory was rebuilt for `iteration`.
    pub fn check(&self, policy: &str, iteration: u32) -> Result<(), PolicyError> {
        match *self {
            Self::Ready { iteration: ready } if ready == iteration => Ok(()),
            _ => Err(PolicyError::NotReset {
                policy: policy.to_string(),
                iteration,
            }),
        }
    }
}
