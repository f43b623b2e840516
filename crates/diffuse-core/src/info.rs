//! [`PropagatedInformation`] and the insertion-ordered [`InfoSet`].

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::id::{PieceId, UserId};

/// The unit exchanged between users: a piece plus its provenance.
///
/// Identity is the piece alone. `iteration` and `origin` record when and
/// from whom the piece arrived, and are ignored by `==` and `Hash`, so a
/// set of these never holds the same piece twice.
#[derive(Clone, Copy, Debug)]
pub struct PropagatedInformation {
    /// The information piece.
    pub piece: PieceId,
    /// Iteration at which this copy was created.
    pub iteration: u32,
    /// User this copy came from (the holder itself for own pieces).
    pub origin: UserId,
}

impl PropagatedInformation {
    /// Create a new provenance record.
    pub fn new(piece: PieceId, iteration: u32, origin: UserId) -> Self {
        Self {
            piece,
            iteration,
            origin,
        }
    }

    /// Field-by-field equality, provenance included.
    pub fn identical(&self, other: &Self) -> bool {
        self.piece == other.piece
            && self.iteration == other.iteration
            && self.origin == other.origin
    }
}

impl PartialEq for PropagatedInformation {
    fn eq(&self, other: &Self) -> bool {
        self.piece == other.piece
    }
}

impl Eq for PropagatedInformation {}

impl Hash for PropagatedInformation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.piece.hash(state);
    }
}

/// A set of [`PropagatedInformation`] keyed by piece, in insertion order.
///
/// Insertion order is the iteration order used by every policy, which
/// keeps runs reproducible. The first inserted provenance for a piece
/// wins; later inserts of the same piece are rejected.
#[derive(Clone, Debug, Default)]
pub struct InfoSet {
    entries: IndexMap<PieceId, PropagatedInformation>,
}

impl InfoSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pieces in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `piece` is a member.
    pub fn contains(&self, piece: PieceId) -> bool {
        self.entries.contains_key(&piece)
    }

    /// Provenance of `piece`, if present.
    pub fn get(&self, piece: PieceId) -> Option<&PropagatedInformation> {
        self.entries.get(&piece)
    }

    /// Insert `info`. Returns `false` (and keeps the old provenance) when
    /// the piece is already present.
    pub fn insert(&mut self, info: PropagatedInformation) -> bool {
        if self.entries.contains_key(&info.piece) {
            return false;
        }
        self.entries.insert(info.piece, info);
        true
    }

    /// Overwrite the provenance of a piece already present, keeping its
    /// position. Returns the previous record, or `None` (and inserts
    /// nothing) when the piece is absent.
    pub fn replace(&mut self, info: PropagatedInformation) -> Option<PropagatedInformation> {
        let slot = self.entries.get_mut(&info.piece)?;
        Some(std::mem::replace(slot, info))
    }

    /// Remove `piece`, preserving the order of the remaining entries.
    pub fn remove(&mut self, piece: PieceId) -> Option<PropagatedInformation> {
        self.entries.shift_remove(&piece)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PropagatedInformation> + '_ {
        self.entries.values()
    }

    /// Iterate piece ids in insertion order.
    pub fn pieces(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.entries.keys().copied()
    }

    /// Membership and order equality, provenance included.
    pub fn identical(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.identical(b))
    }
}

impl PartialEq for InfoSet {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl Eq for InfoSet {}

impl FromIterator<PropagatedInformation> for InfoSet {
    fn from_iter<T: IntoIterator<Item = PropagatedInformation>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<PropagatedInformation> for InfoSet {
    fn extend<T: IntoIterator<Item = PropagatedInformation>>(&mut self, iter: T) {
        for info in iter {
            self.insert(info);
        }
    }
}
