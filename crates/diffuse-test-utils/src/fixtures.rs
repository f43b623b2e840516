//! Mock policies for engine testing.
//!
//! - [`FailingSelection`]: selects every own piece, fails after N calls.
//! - [`FixedTargets`]: sends to a fixed list of users, known or not.
//! - [`BlindSight`]: never notices anything.
//! - [`CountingExpiration`]: never expires, counts resets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use diffuse_core::{Arrival, PropagatedInformation, UserId, UserState};
use diffuse_policy::{
    outgoing, ExpirationMechanism, PolicyContext, PolicyError, PropagationMechanism, Selection,
    SelectionMechanism, SightMechanism,
};

/// Selects all own pieces; the call numbered `fail_after` (zero based)
/// and every later one fail.
pub struct FailingSelection {
    fail_after: usize,
    calls: AtomicUsize,
}

impl FailingSelection {
    pub fn new(fail_after: usize) -> Self {
        Self {
            fail_after,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl SelectionMechanism for FailingSelection {
    fn name(&self) -> &str {
        "failing"
    }

    fn select(
        &mut self,
        user: &UserState,
        ctx: &PolicyContext<'_>,
    ) -> Result<Selection, PolicyError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n >= self.fail_after {
            return Err(PolicyError::invalid(
                "failing",
                format!("call {n} failed deliberately"),
            ));
        }
        Ok(Selection {
            own: user
                .own_pool()
                .map(|i| outgoing(i, ctx.iteration(), user.user()))
                .collect(),
            ..Selection::default()
        })
    }
}

/// Sends every piece of every sender to the same fixed list of users.
pub struct FixedTargets {
    pub targets: Vec<UserId>,
}

impl FixedTargets {
    pub fn new(targets: Vec<UserId>) -> Self {
        Self { targets }
    }
}

impl PropagationMechanism for FixedTargets {
    fn name(&self) -> &str {
        "fixed_targets"
    }

    fn depends_on_piece(&self) -> bool {
        false
    }

    fn targets(
        &mut self,
        _sender: &UserState,
        _info: &PropagatedInformation,
        _ctx: &PolicyContext<'_>,
    ) -> Result<Vec<UserId>, PolicyError> {
        Ok(self.targets.clone())
    }
}

/// Never notices anything; every arrival stays in the inbox.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlindSight;

impl SightMechanism for BlindSight {
    fn name(&self) -> &str {
        "blind"
    }

    fn sees(
        &mut self,
        _user: &UserState,
        _arrival: &Arrival,
        _ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        Ok(false)
    }
}

/// Never expires anything and counts `reset_selections` calls through a
/// shared counter.
#[derive(Clone, Default)]
pub struct CountingExpiration {
    pub resets: Arc<AtomicUsize>,
}

impl CountingExpiration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::Relaxed)
    }
}

impl ExpirationMechanism for CountingExpiration {
    fn name(&self) -> &str {
        "counting"
    }

    fn reset_selections(&mut self, _ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        self.resets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn expired(
        &mut self,
        _user: &UserState,
        _info: &PropagatedInformation,
        _ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        Ok(false)
    }
}
