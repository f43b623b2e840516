//! Update rules: how a re-arrival merges with a piece the user already holds.
//!
//! An [`UpdateMechanism`] is consulted by [`UserState::receive_with`] for
//! two cases:
//!
//! - the piece is already in `seen`: the rule picks the provenance the
//!   seen record keeps;
//! - the piece was discarded: the rule picks the record that re-enters the
//!   inbox, or refuses the re-entry.
//!
//! The same rule must drive the engine and every replay of its log, so
//! [`SimulationState::apply_with`] takes it too.
//!
//! [`UserState::receive_with`]: crate::UserState::receive_with
//! [`SimulationState::apply_with`]: crate::SimulationState::apply_with

use crate::info::PropagatedInformation;

/// Merge rule for pieces that arrive again.
pub trait UpdateMechanism: Send {
    /// Rule name, as written in configuration files.
    fn name(&self) -> &str;

    /// Record kept in `seen` when `incoming` arrives for a piece already
    /// seen.
    fn update_seen(
        &self,
        seen: &PropagatedInformation,
        incoming: &PropagatedInformation,
    ) -> PropagatedInformation;

    /// Record that re-enters the inbox when `incoming` arrives for a
    /// discarded piece, or `None` to refuse the arrival.
    fn update_discarded(
        &self,
        discarded: &PropagatedInformation,
        incoming: &PropagatedInformation,
    ) -> Option<PropagatedInformation>;
}

/// The older provenance wins; a discarded piece re-enters as a fresh
/// arrival. This is the default rule.
#[derive(Clone, Copy, Debug, Default)]
pub struct OlderUpdate;

impl UpdateMechanism for OlderUpdate {
    fn name(&self) -> &str {
        "older"
    }

    fn update_seen(
        &self,
        seen: &PropagatedInformation,
        incoming: &PropagatedInformation,
    ) -> PropagatedInformation {
        if incoming.iteration < seen.iteration {
            *incoming
        } else {
            *seen
        }
    }

    fn update_discarded(
        &self,
        _discarded: &PropagatedInformation,
        incoming: &PropagatedInformation,
    ) -> Option<PropagatedInformation> {
        Some(*incoming)
    }
}

/// The newest copy wins: a seen record takes the provenance of every later
/// arrival.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewestUpdate;

impl UpdateMechanism for NewestUpdate {
    fn name(&self) -> &str {
        "newest"
    }

    fn update_seen(
        &self,
        seen: &PropagatedInformation,
        incoming: &PropagatedInformation,
    ) -> PropagatedInformation {
        if incoming.iteration >= seen.iteration {
            *incoming
        } else {
            *seen
        }
    }

    fn update_discarded(
        &self,
        _discarded: &PropagatedInformation,
        incoming: &PropagatedInformation,
    ) -> Option<PropagatedInformation> {
        Some(*incoming)
    }
}

/// Like [`OlderUpdate`], but a discarded piece never comes back.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReentryUpdate;

impl UpdateMechanism for NoReentryUpdate {
    fn name(&self) -> &str {
        "no_reentry"
    }

    fn update_seen(
        &self,
        seen: &PropagatedInformation,
        incoming: &PropagatedInformation,
    ) -> PropagatedInformation {
        OlderUpdate.update_seen(seen, incoming)
    }

    fn update_discarded(
        &self,
        _discarded: &PropagatedInformation,
        _incoming: &PropagatedInformation,
    ) -> Option<PropagatedInformation> {
        None
    }
}

/// Look up a built-in rule by [`UpdateMechanism::name`].
pub fn builtin_update(name: &str) -> Option<Box<dyn UpdateMechanism>> {
    match name {
        "older" => Some(Box::new(OlderUpdate)),
        "newest" => Some(Box::new(NewestUpdate)),
        "no_reentry" => Some(Box::new(NoReentryUpdate)),
        _ => None,
    }
}
