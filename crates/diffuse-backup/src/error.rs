//! Error types for the backup system.

use std::io;

use diffuse_core::{DataError, SimulationError};
use diffuse_engine::StepError;
use thiserror::Error;

/// Errors that can occur while writing, reading or verifying a backup.
#[derive(Debug, Error)]
pub enum BackupError {
    /// An I/O error occurred during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The stream does not start with the expected `b"DIFF"` magic bytes.
    #[error("invalid magic bytes (expected b\"DIFF\")")]
    InvalidMagic,
    /// The format version is not supported by this build.
    #[error("unsupported format version {found}")]
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// A header, state or frame could not be decoded.
    #[error("malformed backup: {detail}")]
    MalformedFrame {
        /// What went wrong.
        detail: String,
    },
    /// An iteration was written out of order.
    #[error("iteration {found} written after iteration {previous}")]
    OutOfOrder {
        /// Last iteration written.
        previous: u32,
        /// Iteration offered.
        found: u32,
    },
    /// Replaying a frame did not reproduce the recorded state.
    #[error(
        "state mismatch at iteration {iteration}: recorded={recorded:#018x}, replayed={replayed:#018x}"
    )]
    StateMismatch {
        /// Iteration whose post-state differs.
        iteration: u32,
        /// Hash stored in the frame.
        recorded: u64,
        /// Hash of the replayed state.
        replayed: u64,
    },
    /// The backup was recorded with a different configuration.
    #[error("config hash mismatch: recorded={recorded:#018x}, current={current:#018x}")]
    ConfigMismatch {
        /// Hash from the header.
        recorded: u64,
        /// Hash of the current configuration.
        current: u64,
    },
    /// The backup does not fit the data it is being checked against.
    #[error("backup has {recorded} {what} but the data has {current}")]
    DataMismatch {
        /// `users` or `pieces`.
        what: &'static str,
        /// Count from the header.
        recorded: u32,
        /// Count from the data.
        current: u32,
    },
    /// Fewer frames than requested.
    #[error("requested {requested} iterations but the backup holds {available}")]
    Truncated {
        /// Requested prefix length.
        requested: usize,
        /// Frames present.
        available: usize,
    },
    /// A recorded delta does not fit the recorded state.
    #[error(transparent)]
    Data(#[from] DataError),
    /// The rebuilt log rejected an iteration.
    #[error(transparent)]
    Log(#[from] SimulationError),
    /// Re-executing a recorded iteration failed.
    #[error(transparent)]
    Step(#[from] StepError),
}

impl BackupError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedFrame {
            detail: detail.into(),
        }
    }
}
