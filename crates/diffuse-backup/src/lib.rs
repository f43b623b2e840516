//! Binary backups of Diffuse simulation logs.
//!
//! A backup holds the initial state and every iteration of a run, so any
//! prefix of the run can be rebuilt and resumed.
//!
//! # Architecture
//!
//! - [`BackupWriter`] records iterations to any `Write` sink
//! - [`BackupReader`] rebuilds the log from any `Read` source, verifying
//!   each frame's state hash as it goes
//! - [`write_simulation_atomic`] and [`Checkpointer`] put backups on disk
//! - [`compare_state`] and [`replay_and_compare`] verify determinism by
//!   re-executing a recorded run
//!
//! # Format
//!
//! ```text
//! [MAGIC "DIFF"] [VERSION u8] [Header] [Initial state]
//! [Frame 1] [Frame 2] ... [Frame N]
//! ```
//!
//! Each frame holds one iteration's per-user deltas and an FNV-1a hash of
//! the state after the iteration.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checkpoint;
pub mod codec;
pub mod compare;
pub mod error;
pub mod hash;
pub mod reader;
pub mod types;
pub mod writer;

pub use checkpoint::{read_simulation_file, write_simulation_atomic, Checkpointer};
pub use compare::{compare_state, replay_and_compare, DivergenceReport, Pool, UserDivergence};
pub use error::BackupError;
pub use hash::{config_hash, state_hash};
pub use reader::{BackupReader, FrameIter};
pub use types::{Frame, Header};
pub use writer::{write_simulation, BackupWriter};

/// Magic bytes at the start of every backup.
pub const MAGIC: [u8; 4] = *b"DIFF";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 2;
