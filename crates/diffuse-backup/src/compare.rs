//! State comparison and re-execution verification.
//!
//! Hash-first comparison with a per-user, per-pool fallback on mismatch,
//! plus a driver that re-runs a recorded backup through a [`Protocol`] and
//! stops at the first diverging iteration.

use std::io::Read;

use diffuse_core::{DiffusionData, InfoSet, PieceId, SimulationState, UserId, UserState};
use diffuse_engine::Protocol;

use crate::error::BackupError;
use crate::hash::state_hash;
use crate::reader::BackupReader;

/// A user pool, as named in divergence reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pool {
    /// Pieces the user created.
    Own,
    /// Pieces waiting to be noticed.
    Inbox,
    /// Noticed pieces.
    Seen,
    /// Sent pieces.
    Propagated,
    /// Dropped pieces.
    Discarded,
}

/// One pool of one user that differs between two states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserDivergence {
    /// The user.
    pub user: UserId,
    /// The differing pool.
    pub pool: Pool,
    /// Pieces in the recorded pool, in order.
    pub recorded: Vec<PieceId>,
    /// Pieces in the replayed pool, in order.
    pub replayed: Vec<PieceId>,
}

/// Everything found to differ at one iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivergenceReport {
    /// Iteration whose post-state differs.
    pub iteration: u32,
    /// Hash from the backup.
    pub recorded_hash: u64,
    /// Hash of the re-executed state.
    pub replayed_hash: u64,
    /// Per-pool differences. Empty when only hashes were available, or
    /// when only provenance or boundary markers differ.
    pub divergences: Vec<UserDivergence>,
}

fn pools(user: &UserState) -> [(Pool, Vec<PieceId>); 5] {
    let ids = |s: &InfoSet| s.pieces().collect::<Vec<_>>();
    [
        (Pool::Own, ids(user.own())),
        (Pool::Inbox, user.inbox().keys().copied().collect()),
        (Pool::Seen, ids(user.seen())),
        (Pool::Propagated, ids(user.propagated())),
        (Pool::Discarded, ids(user.discarded())),
    ]
}

/// Compare a replayed state against a recorded hash.
///
/// Fast path: hashes match and `None` is returned. On mismatch, the pools
/// of `recorded` (when given) and `replayed` are compared user by user.
pub fn compare_state(
    replayed: &SimulationState,
    recorded_hash: u64,
    recorded: Option<&SimulationState>,
) -> Option<DivergenceReport> {
    let replayed_hash = state_hash(replayed);
    if replayed_hash == recorded_hash {
        return None;
    }
    let mut divergences = Vec::new();
    if let Some(recorded) = recorded {
        for (rec, rep) in recorded.users().iter().zip(replayed.users()) {
            for ((pool, a), (_, b)) in pools(rec).into_iter().zip(pools(rep)) {
                if a != b {
                    divergences.push(UserDivergence {
                        user: rec.user(),
                        pool,
                        recorded: a,
                        replayed: b,
                    });
                }
            }
        }
    }
    Some(DivergenceReport {
        iteration: replayed.iteration(),
        recorded_hash,
        replayed_hash,
        divergences,
    })
}

/// Re-execute a recorded run with `protocol` and compare every
/// post-iteration state with the backup.
///
/// The protocol must be freshly built with the recorded configuration.
/// Returns `Ok(None)` when every iteration matches, or the report for the
/// first diverging one.
pub fn replay_and_compare<R: Read>(
    mut reader: BackupReader<R>,
    protocol: &mut Protocol,
    data: &dyn DiffusionData,
) -> Result<Option<DivergenceReport>, BackupError> {
    reader.check_data(data)?;
    let mut state = reader.initial().clone();
    while let Some(frame) = reader.next_frame()? {
        let transition = protocol.transition(data, &state)?;
        if let Some(report) =
            compare_state(&transition.state, frame.state_hash, Some(reader.state()))
        {
            tracing::warn!(
                iteration = report.iteration,
                pools = report.divergences.len(),
                "replay diverged from backup"
            );
            return Ok(Some(report));
        }
        state = transition.state;
    }
    Ok(None)
}
