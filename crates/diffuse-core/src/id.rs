//! Strongly-typed dense identifiers for users and information pieces.

use std::fmt;

/// Dense index of a user in the loaded data.
///
/// `UserId(n)` is the n-th user registered with the data provider. The
/// provider owns the mapping between these indices and external labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u32);

impl UserId {
    /// The id as a `usize`, for indexing per-user vectors.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UserId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Dense index of an information piece in the loaded data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u32);

impl PieceId {
    /// The id as a `usize`, for indexing per-piece vectors.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PieceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_index() {
        assert!(UserId(1) < UserId(2));
        assert!(PieceId(0) < PieceId(7));
        assert_eq!(UserId::from(3).index(), 3);
    }

    #[test]
    fn display_is_bare_index() {
        assert_eq!(UserId(12).to_string(), "12");
        assert_eq!(PieceId(5).to_string(), "5");
    }
}
