//! Data types for backup recording and playback.

use diffuse_core::{DiffusionData, Iteration};
use diffuse_engine::UpdateSpec;

/// Run parameters stored in the backup header.
///
/// # Examples
///
/// ```
/// use diffuse_backup::Header;
///
/// let header = Header {
///     user_count: 3,
///     piece_count: 1,
///     seed: 42,
///     config_hash: 0xDEAD_BEEF,
///     ..Header::default()
/// };
/// assert_eq!(header.seed, 42);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// Number of users in the data the run used.
    pub user_count: u32,
    /// Number of information pieces in the data.
    pub piece_count: u32,
    /// Master seed of the run.
    pub seed: u64,
    /// Hash of the run configuration (0 if unknown).
    pub config_hash: u64,
    /// Update rule the run merged re-arrivals with. Replays use it too.
    pub update: UpdateSpec,
}

impl Header {
    /// Header for a run over `data`.
    pub fn for_data(data: &dyn DiffusionData, seed: u64, config_hash: u64) -> Self {
        Self {
            user_count: data.user_count() as u32,
            piece_count: data.piece_count() as u32,
            seed,
            config_hash,
            update: UpdateSpec::Older,
        }
    }

    /// The same header with another update rule.
    pub fn with_update(self, update: UpdateSpec) -> Self {
        Self { update, ..self }
    }
}

/// One recorded iteration and the hash of the state it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// The iteration record.
    pub iteration: Iteration,
    /// [`state_hash`](crate::state_hash) of the post-iteration state.
    pub state_hash: u64,
}
