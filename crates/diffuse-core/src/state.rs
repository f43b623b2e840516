//! Per-user state machine and the global state at an iteration boundary.
//!
//! A piece moves through a user's collections as follows:
//!
//! ```text
//!   receive ──► inbox ──see──► seen ──discard──► discarded
//!                               │                    │
//!                               └──────propagate     └──re-receive──► inbox
//!                                          ▼
//!   own ─────────────────────────────► propagated
//! ```
//!
//! `own` and `propagated` never shrink. `seen` and `discarded` are
//! disjoint at all times. What a re-arrival does to a seen or discarded
//! piece is decided by an [`UpdateMechanism`].

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::DataError;
use crate::id::{PieceId, UserId};
use crate::info::{InfoSet, PropagatedInformation};
use crate::iteration::Iteration;
use crate::traits::DiffusionData;
use crate::update::{OlderUpdate, UpdateMechanism};

// ── Arrival ─────────────────────────────────────────────────────

/// A piece waiting in a user's inbox.
#[derive(Clone, Debug, PartialEq)]
pub struct Arrival {
    /// Provenance of the first copy that arrived.
    pub info: PropagatedInformation,
    /// Every user that sent this piece while it was queued, in arrival
    /// order. Never empty.
    pub senders: SmallVec<[UserId; 4]>,
}

/// What [`UserState::receive`] did with an incoming piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// First arrival of a piece the user never saw.
    New,
    /// Arrival of a piece the user had discarded; it re-enters the inbox.
    Rereceived,
    /// The piece was already waiting; the sender was recorded.
    Queued,
    /// The piece was already seen and the update rule rewrote its
    /// provenance.
    Updated,
    /// The user owns or has propagated the piece, or the update rule left
    /// the state as it was.
    Ignored,
}

impl ReceiveOutcome {
    /// Whether the arrival changed the user's state.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

// ── UserState ───────────────────────────────────────────────────

/// Mutable diffusion record of a single user.
#[derive(Clone, Debug, PartialEq)]
pub struct UserState {
    user: UserId,
    own: InfoSet,
    inbox: IndexMap<PieceId, Arrival>,
    seen: InfoSet,
    propagated: InfoSet,
    discarded: InfoSet,
    first_received: IndexMap<PieceId, u32>,
}

impl UserState {
    /// An empty state for `user`.
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            own: InfoSet::new(),
            inbox: IndexMap::new(),
            seen: InfoSet::new(),
            propagated: InfoSet::new(),
            discarded: InfoSet::new(),
            first_received: IndexMap::new(),
        }
    }

    /// A state for `user` owning `pieces` at iteration 0.
    pub fn with_own(user: UserId, pieces: impl IntoIterator<Item = PieceId>) -> Self {
        let mut state = Self::new(user);
        state.own = pieces
            .into_iter()
            .map(|p| PropagatedInformation::new(p, 0, user))
            .collect();
        state
    }

    /// Rebuild a state from its raw collections.
    ///
    /// Used by decoders. Callers are responsible for the collection
    /// invariants; [`UserState::check_invariants`] verifies them.
    pub fn from_parts(
        user: UserId,
        own: InfoSet,
        inbox: IndexMap<PieceId, Arrival>,
        seen: InfoSet,
        propagated: InfoSet,
        discarded: InfoSet,
        first_received: IndexMap<PieceId, u32>,
    ) -> Self {
        Self {
            user,
            own,
            inbox,
            seen,
            propagated,
            discarded,
            first_received,
        }
    }

    /// The user this state belongs to.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Pieces the user created.
    pub fn own(&self) -> &InfoSet {
        &self.own
    }

    /// Own pieces not yet propagated.
    pub fn own_pool(&self) -> impl Iterator<Item = &PropagatedInformation> + '_ {
        self.own
            .iter()
            .filter(move |i| !self.propagated.contains(i.piece))
    }

    /// Pieces that arrived and have not been noticed yet.
    pub fn inbox(&self) -> &IndexMap<PieceId, Arrival> {
        &self.inbox
    }

    /// Pieces the user noticed and still holds as candidates.
    pub fn seen(&self) -> &InfoSet {
        &self.seen
    }

    /// Pieces the user has sent at least once.
    pub fn propagated(&self) -> &InfoSet {
        &self.propagated
    }

    /// Pieces the user dropped.
    pub fn discarded(&self) -> &InfoSet {
        &self.discarded
    }

    /// Iteration at which `piece` first arrived among the pieces the user
    /// has noticed.
    pub fn first_received(&self, piece: PieceId) -> Option<u32> {
        self.first_received.get(&piece).copied()
    }

    /// All first-arrival stamps, in stamping order.
    pub fn first_received_map(&self) -> &IndexMap<PieceId, u32> {
        &self.first_received
    }

    /// Whether the user has anything to offer to a selection policy.
    pub fn has_candidates(&self) -> bool {
        self.own_pool().next().is_some() || !self.seen.is_empty() || !self.propagated.is_empty()
    }

    /// Whether the user knows `piece` in any way other than the inbox.
    pub fn knows(&self, piece: PieceId) -> bool {
        self.own.contains(piece)
            || self.seen.contains(piece)
            || self.propagated.contains(piece)
            || self.discarded.contains(piece)
    }

    // ── Transitions ─────────────────────────────────────────────

    /// Deliver `info` from `sender` under the default [`OlderUpdate`] rule.
    pub fn receive(&mut self, info: PropagatedInformation, sender: UserId) -> ReceiveOutcome {
        self.receive_with(info, sender, &OlderUpdate)
    }

    /// Deliver `info` from `sender`, merging re-arrivals with `update`.
    pub fn receive_with(
        &mut self,
        info: PropagatedInformation,
        sender: UserId,
        update: &dyn UpdateMechanism,
    ) -> ReceiveOutcome {
        let piece = info.piece;
        if self.own.contains(piece) || self.propagated.contains(piece) {
            return ReceiveOutcome::Ignored;
        }
        if let Some(current) = self.seen.get(piece) {
            let merged = PropagatedInformation {
                piece,
                ..update.update_seen(current, &info)
            };
            if merged.identical(current) {
                return ReceiveOutcome::Ignored;
            }
            self.seen.replace(merged);
            return ReceiveOutcome::Updated;
        }
        if let Some(arrival) = self.inbox.get_mut(&piece) {
            if !arrival.senders.contains(&sender) {
                arrival.senders.push(sender);
            }
            return ReceiveOutcome::Queued;
        }
        let (info, outcome) = match self.discarded.get(piece) {
            Some(old) => match update.update_discarded(old, &info) {
                Some(back) => (PropagatedInformation { piece, ..back }, ReceiveOutcome::Rereceived),
                None => return ReceiveOutcome::Ignored,
            },
            None => (info, ReceiveOutcome::New),
        };
        let mut senders = SmallVec::new();
        senders.push(sender);
        self.inbox.insert(piece, Arrival { info, senders });
        outcome
    }

    /// Move `piece` from the inbox to `seen`.
    ///
    /// A previously discarded piece leaves `discarded`. The first-arrival
    /// stamp is set only once. Returns `false` if the piece was not in the
    /// inbox.
    pub fn see(&mut self, piece: PieceId) -> bool {
        let Some(arrival) = self.inbox.shift_remove(&piece) else {
            return false;
        };
        self.discarded.remove(piece);
        self.first_received
            .entry(piece)
            .or_insert(arrival.info.iteration);
        self.seen.insert(arrival.info);
        true
    }

    /// Move `piece` from `seen` to `discarded`. Returns `false` if the
    /// piece was not seen.
    pub fn discard(&mut self, piece: PieceId) -> bool {
        match self.seen.remove(piece) {
            Some(info) => {
                self.discarded.insert(info);
                true
            }
            None => false,
        }
    }

    /// Record that the user sent `piece` during `iteration`.
    ///
    /// Returns `true` the first time a piece is propagated; repeated
    /// propagation leaves the state untouched.
    pub fn mark_propagated(&mut self, piece: PieceId, iteration: u32) -> bool {
        if self.propagated.contains(piece) {
            return false;
        }
        self.seen.remove(piece);
        self.inbox.shift_remove(&piece);
        self.discarded.remove(piece);
        self.propagated
            .insert(PropagatedInformation::new(piece, iteration, self.user))
    }

    /// Verify the collection invariants, returning a description of the
    /// first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        for piece in self.seen.pieces() {
            if self.discarded.contains(piece) {
                return Err(format!(
                    "user {}: piece {piece} is both seen and discarded",
                    self.user
                ));
            }
            if self.propagated.contains(piece) {
                return Err(format!(
                    "user {}: piece {piece} is both seen and propagated",
                    self.user
                ));
            }
        }
        for (piece, arrival) in &self.inbox {
            if arrival.senders.is_empty() {
                return Err(format!(
                    "user {}: inbox entry {piece} has no sender",
                    self.user
                ));
            }
        }
        Ok(())
    }
}

// ── SimulationState ─────────────────────────────────────────────

/// All user states at an iteration boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    users: Vec<UserState>,
    iteration: u32,
    timestamp: Option<i64>,
}

impl SimulationState {
    /// Build the iteration-0 state: every user owns the pieces it created.
    pub fn initialize(data: &dyn DiffusionData) -> Result<Self, DataError> {
        let mut users = Vec::with_capacity(data.user_count());
        for idx in 0..data.user_count() {
            let user = UserId(idx as u32);
            let own = data.own_pieces(user);
            for &piece in own {
                data.check_piece(piece)?;
            }
            users.push(UserState::with_own(user, own.iter().copied()));
        }
        Ok(Self {
            users,
            iteration: 0,
            timestamp: None,
        })
    }

    /// Assemble a state from already-built user records.
    pub fn from_users(users: Vec<UserState>, iteration: u32, timestamp: Option<i64>) -> Self {
        Self {
            users,
            iteration,
            timestamp,
        }
    }

    /// Number of users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of the last completed iteration (0 before the first).
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Timestamp of the last completed iteration.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// All user states in index order.
    pub fn users(&self) -> &[UserState] {
        &self.users
    }

    /// State of `user`.
    pub fn user(&self, user: UserId) -> Result<&UserState, DataError> {
        self.users.get(user.index()).ok_or(DataError::UnknownUser {
            user,
            user_count: self.users.len(),
        })
    }

    /// Mutable state of `user`.
    pub fn user_mut(&mut self, user: UserId) -> Result<&mut UserState, DataError> {
        let user_count = self.users.len();
        self.users
            .get_mut(user.index())
            .ok_or(DataError::UnknownUser { user, user_count })
    }

    /// Advance the boundary markers after an iteration committed.
    pub fn advance(&mut self, iteration: u32, timestamp: Option<i64>) {
        self.iteration = iteration;
        self.timestamp = timestamp;
    }

    /// Replay a recorded iteration under the default [`OlderUpdate`] rule.
    pub fn apply(&mut self, iteration: &Iteration) -> Result<(), DataError> {
        self.apply_with(iteration, &OlderUpdate)
    }

    /// Replay a recorded iteration on top of this state.
    ///
    /// Per user: receptions, then seen, then discarded, then propagated.
    /// This is the order the engine commits them in, so replaying a log
    /// with the update rule that produced it reproduces the original
    /// states exactly.
    pub fn apply_with(
        &mut self,
        iteration: &Iteration,
        update: &dyn UpdateMechanism,
    ) -> Result<(), DataError> {
        for (&user, delta) in &iteration.deltas {
            let state = self.user_mut(user)?;
            for rec in &delta.received {
                let info = PropagatedInformation::new(rec.piece, iteration.number, rec.sender);
                state.receive_with(info, rec.sender, update);
            }
            for &piece in &delta.seen {
                state.see(piece);
            }
            for &piece in &delta.discarded {
                state.discard(piece);
            }
            for &piece in &delta.propagated {
                state.mark_propagated(piece, iteration.number);
            }
        }
        self.advance(iteration.number, iteration.timestamp);
        Ok(())
    }

    /// Total number of (user, piece) pairs in `propagated`.
    pub fn total_propagated(&self) -> usize {
        self.users.iter().map(|u| u.propagated().len()).sum()
    }
}
