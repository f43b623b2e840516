//! The immutable per-iteration record appended to a [`Simulation`](crate::Simulation).

use indexmap::IndexMap;

use crate::id::{PieceId, UserId};

/// A single accepted delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Reception {
    /// The delivered piece.
    pub piece: PieceId,
    /// The user that sent it.
    pub sender: UserId,
}

/// Everything that happened to one user during one iteration.
///
/// Columns are listed in commit order: receptions, then seen, then
/// discarded, then propagated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserDelta {
    /// Accepted deliveries, in delivery order.
    pub received: Vec<Reception>,
    /// Pieces that re-entered the inbox after having been discarded.
    pub rereceived: Vec<PieceId>,
    /// Pieces moved from the inbox to `seen`.
    pub seen: Vec<PieceId>,
    /// Pieces moved from `seen` to `discarded`.
    pub discarded: Vec<PieceId>,
    /// Pieces the user sent to at least one target.
    pub propagated: Vec<PieceId>,
}

impl UserDelta {
    /// Whether nothing happened to the user.
    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
            && self.rereceived.is_empty()
            && self.seen.is_empty()
            && self.discarded.is_empty()
            && self.propagated.is_empty()
    }
}

/// Snapshot of one state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Iteration {
    /// Iteration number (the first executed iteration is 1).
    pub number: u32,
    /// Real-world timestamp the iteration ran at, if any.
    pub timestamp: Option<i64>,
    /// Non-empty deltas keyed by user, in ascending user order.
    pub deltas: IndexMap<UserId, UserDelta>,
}

impl Iteration {
    /// An iteration with no deltas.
    pub fn new(number: u32, timestamp: Option<i64>) -> Self {
        Self {
            number,
            timestamp,
            deltas: IndexMap::new(),
        }
    }

    /// Build an iteration from a dense per-user delta vector, dropping
    /// empty deltas.
    pub fn from_dense(number: u32, timestamp: Option<i64>, deltas: Vec<UserDelta>) -> Self {
        let deltas = deltas
            .into_iter()
            .enumerate()
            .filter(|(_, d)| !d.is_empty())
            .map(|(i, d)| (UserId(i as u32), d))
            .collect();
        Self {
            number,
            timestamp,
            deltas,
        }
    }

    /// Delta of `user`, if anything happened to it.
    pub fn delta(&self, user: UserId) -> Option<&UserDelta> {
        self.deltas.get(&user)
    }

    /// Users that received at least one piece.
    pub fn receiving_users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.deltas
            .iter()
            .filter(|(_, d)| !d.received.is_empty())
            .map(|(&u, _)| u)
    }

    /// Users that propagated at least one piece.
    pub fn propagating_users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.deltas
            .iter()
            .filter(|(_, d)| !d.propagated.is_empty())
            .map(|(&u, _)| u)
    }

    /// Number of (user, piece) propagations.
    pub fn propagated_count(&self) -> usize {
        self.deltas.values().map(|d| d.propagated.len()).sum()
    }

    /// Number of (user, piece) pairs newly seen.
    pub fn seen_count(&self) -> usize {
        self.deltas.values().map(|d| d.seen.len()).sum()
    }

    /// Number of (user, piece) pairs discarded.
    pub fn discarded_count(&self) -> usize {
        self.deltas.values().map(|d| d.discarded.len()).sum()
    }

    /// Number of accepted receptions.
    pub fn received_count(&self) -> usize {
        self.deltas.values().map(|d| d.received.len()).sum()
    }
}
