//! The [`SelectionMechanism`] trait and the [`Selection`] it produces.

use diffuse_core::{PropagatedInformation, UserId, UserState};

use crate::context::PolicyContext;
use crate::error::PolicyError;

/// Pieces a user offers in one iteration, split by pool.
///
/// Every entry is stamped with the current iteration and the sending
/// user as origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    /// Taken from own pieces not yet propagated.
    pub own: Vec<PropagatedInformation>,
    /// Taken from seen pieces.
    pub received: Vec<PropagatedInformation>,
    /// Taken from already propagated pieces.
    pub repropagated: Vec<PropagatedInformation>,
}

impl Selection {
    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.own.is_empty() && self.received.is_empty() && self.repropagated.is_empty()
    }

    /// Total number of selected pieces.
    pub fn len(&self) -> usize {
        self.own.len() + self.received.len() + self.repropagated.len()
    }

    /// All selected pieces: own, then received, then repropagated.
    pub fn iter(&self) -> impl Iterator<Item = &PropagatedInformation> + '_ {
        self.own
            .iter()
            .chain(&self.received)
            .chain(&self.repropagated)
    }
}

/// Chooses which known pieces a user offers in an iteration.
///
/// # Contract
///
/// - `select()` draws only from the user's pools at the previous
///   boundary: own minus propagated, seen, and propagated.
/// - Randomness comes from a generator owned by the policy and reseeded
///   in `reset_selections()`; identical seeds give identical selections.
///
/// # Object safety
///
/// This trait is object-safe; the engine stores the policy as
/// `Box<dyn SelectionMechanism>`.
pub trait SelectionMechanism: Send {
    /// Human-readable name for error reporting and logs.
    fn name(&self) -> &str;

    /// Rebuild per-iteration memory. Called once per iteration before any
    /// user is processed.
    fn reset_selections(&mut self, _ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        Ok(())
    }

    /// Users asked to select this iteration, in ascending order.
    ///
    /// Default: every user with a non-empty pool.
    fn selectable_users(&self, ctx: &PolicyContext<'_>) -> Vec<UserId> {
        default_selectable_users(ctx)
    }

    /// Pieces `user` offers this iteration.
    fn select(
        &mut self,
        user: &UserState,
        ctx: &PolicyContext<'_>,
    ) -> Result<Selection, PolicyError>;
}

/// Every user that has something in its own, seen or propagated pool.
pub fn default_selectable_users(ctx: &PolicyContext<'_>) -> Vec<UserId> {
    ctx.state()
        .users()
        .iter()
        .filter(|u| u.has_candidates())
        .map(UserState::user)
        .collect()
}

/// Re-stamp a pool entry as sent by `sender` during `iteration`.
pub fn outgoing(info: &PropagatedInformation, iteration: u32, sender: UserId) -> PropagatedInformation {
    PropagatedInformation::new(info.piece, iteration, sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::{PieceId, SimulationState};
    use diffuse_graph::StaticData;

    #[test]
    fn default_selectable_skips_empty_users() {
        let mut b = StaticData::builder(true);
        b.add_users(["a", "b"]).unwrap();
        b.add_piece("p", &["b"], None).unwrap();
        let data = b.build();
        let state = SimulationState::initialize(&data).unwrap();
        let ctx = PolicyContext::new(&data, &state, 1, None);
        assert_eq!(default_selectable_users(&ctx), vec![UserId(1)]);
    }

    #[test]
    fn selection_iterates_pools_in_order() {
        let info = |p| PropagatedInformation::new(PieceId(p), 1, UserId(0));
        let sel = Selection {
            own: vec![info(0)],
            received: vec![info(1)],
            repropagated: vec![info(2)],
        };
        let order: Vec<_> = sel.iter().map(|i| i.piece.0).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(sel.len(), 3);
        assert!(Selection::default().is_empty());
    }
}
