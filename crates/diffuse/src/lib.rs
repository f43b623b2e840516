//! Diffuse: simulation of information spreading over social graphs.
//!
//! This is the facade crate that re-exports the public API of the Diffuse
//! sub-crates. Most users only need this one dependency.
//!
//! # Quick start
//!
//! ```rust
//! use diffuse::prelude::*;
//!
//! // a -> b -> c, with `a` owning a single piece.
//! let mut b = StaticData::builder(true);
//! b.add_users(["a", "b", "c"]).unwrap();
//! b.add_edge("a", "b", Edge::organic()).unwrap();
//! b.add_edge("b", "c", Edge::organic()).unwrap();
//! b.add_piece("news", &["a"], None).unwrap();
//! let data = b.build();
//!
//! let config = SimulationConfig::from_json_str(r#"{
//!     "protocol": {
//!         "selection": { "name": "count" },
//!         "propagation": { "name": "all_neighbours" },
//!         "sight": { "name": "all" },
//!         "expiration": { "name": "infinite" }
//!     },
//!     "stop": { "name": "no_progress" },
//!     "seed": 3
//! }"#).unwrap();
//!
//! let mut sim = config.simulator().unwrap();
//! sim.initialize(&data).unwrap();
//! assert_eq!(sim.run().unwrap(), RunStatus::Finished);
//!
//! let news = data.piece_by_label("news").unwrap();
//! let c = data.user_by_label("c").unwrap();
//! let state = sim.state().unwrap();
//! assert!(state.user(c).unwrap().seen().contains(news));
//! assert_eq!(state.user(c).unwrap().first_received(news), Some(2));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `diffuse-core` | IDs, user and simulation state, iteration log, data traits |
//! | [`graph`] | `diffuse-graph` | In-memory social graph and static data |
//! | [`policy`] | `diffuse-policy` | Policy traits, sampling and seeded generators |
//! | [`policies`] | `diffuse-policies` | Selection, propagation, sight and expiration policies |
//! | [`engine`] | `diffuse-engine` | Protocol, stop conditions, simulator and configuration |
//! | [`backup`] | `diffuse-backup` | Binary backups, resume and divergence checks |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`diffuse-core`).
///
/// Holds [`types::UserState`], [`types::SimulationState`], the
/// [`types::Simulation`] log and the [`types::DiffusionData`] trait.
pub use diffuse_core as types;

/// Social graph and data providers (`diffuse-graph`).
pub use diffuse_graph as graph;

/// Policy traits and shared helpers (`diffuse-policy`).
///
/// Implement [`policy::SelectionMechanism`] and friends to plug custom
/// behaviour into a [`engine::Protocol`].
pub use diffuse_policy as policy;

/// Built-in policies (`diffuse-policies`).
pub use diffuse_policies as policies;

/// Protocol, stop conditions and the simulator (`diffuse-engine`).
///
/// [`engine::SimulationConfig`] builds a ready [`engine::Simulator`] from
/// JSON.
pub use diffuse_engine as engine;

/// Backups of simulation logs (`diffuse-backup`).
///
/// Write with [`backup::BackupWriter`] or [`backup::Checkpointer`], read
/// and verify with [`backup::BackupReader`].
pub use diffuse_backup as backup;

/// Common imports for typical Diffuse usage.
///
/// ```rust
/// use diffuse::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use diffuse_core::{
        DiffusionData, Edge, EdgeKind, EdgeOrientation, InfoSet, Iteration, PieceId,
        PropagatedInformation, Simulation, SimulationState, SocialGraph, UpdateMechanism, UserId,
        UserState,
    };

    // Errors
    pub use diffuse_core::{DataError, SimulationError};
    pub use diffuse_engine::{ConfigError, SimulatorError, StepError};
    pub use diffuse_policy::PolicyError;

    // Data
    pub use diffuse_graph::{StaticData, StaticDataBuilder};

    // Policies
    pub use diffuse_policy::{
        ExpirationMechanism, PolicyContext, PropagationMechanism, SelectionMechanism,
        SightMechanism,
    };

    // Engine
    pub use diffuse_engine::{
        CancelToken, IterationObserver, IterationProgress, Protocol, RunStatus, SimulationConfig,
        Simulator, StopCondition, UpdateSpec,
    };

    // Backup
    pub use diffuse_backup::{BackupError, BackupReader, BackupWriter, Checkpointer, Header};
}
