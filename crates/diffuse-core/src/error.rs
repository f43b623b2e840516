//! Error types for the core data model.

use thiserror::Error;

use crate::id::{PieceId, UserId};

/// The state or log referenced an entity the data provider does not know.
///
/// These always indicate an upstream contract violation and are never
/// swallowed by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DataError {
    /// A user index is outside `0..user_count`.
    #[error("unknown user {user} (data has {user_count} users)")]
    UnknownUser {
        /// The offending index.
        user: UserId,
        /// Number of users known to the data provider.
        user_count: usize,
    },
    /// A piece index is outside `0..piece_count`.
    #[error("unknown information piece {piece} (data has {piece_count} pieces)")]
    UnknownPiece {
        /// The offending index.
        piece: PieceId,
        /// Number of pieces known to the data provider.
        piece_count: usize,
    },
}

/// Errors from building or replaying a [`Simulation`](crate::Simulation) log.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// An appended iteration does not continue the numbering of the log.
    #[error("non-contiguous iteration: expected {expected}, found {found}")]
    NonContiguous {
        /// The number the next iteration must carry.
        expected: u32,
        /// The number it actually carried.
        found: u32,
    },
    /// A prefix or state was requested past the end of the log.
    #[error("iteration {requested} requested but the log holds {len}")]
    OutOfRange {
        /// Requested number of iterations.
        requested: usize,
        /// Number of iterations recorded.
        len: usize,
    },
    /// A delta referenced an unknown entity.
    #[error(transparent)]
    Data(#[from] DataError),
}
