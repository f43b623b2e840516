//! Deterministic sight policies driven by the user's own pools.
//!
//! Propagated pieces never reach the inbox, so [`AllSight`] already
//! notices exactly the pieces the user has not propagated.

use diffuse_core::{Arrival, UserState};
use diffuse_policy::{PolicyContext, PolicyError, SightMechanism};

/// Notices every arrival.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllSight;

impl SightMechanism for AllSight {
    fn name(&self) -> &str {
        "all"
    }

    fn sees(
        &mut self,
        _user: &UserState,
        _arrival: &Arrival,
        _ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        Ok(true)
    }
}

/// Notices arrivals of pieces the user has not discarded.
///
/// A discarded piece that comes back stays queued in the inbox.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotDiscardedSight;

impl SightMechanism for NotDiscardedSight {
    fn name(&self) -> &str {
        "not_discarded"
    }

    fn sees(
        &mut self,
        user: &UserState,
        arrival: &Arrival,
        _ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        Ok(!user.discarded().contains(arrival.info.piece))
    }
}
