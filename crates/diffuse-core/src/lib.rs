//! Core types and traits for the Diffuse simulation engine.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! per-user state machine ([`UserState`]), the global state at an
//! iteration boundary ([`SimulationState`]), the iteration log
//! ([`Iteration`], [`Simulation`]), the re-arrival merge rules
//! ([`UpdateMechanism`]), and the collaborator traits through
//! which the engine reads the social graph and the static input data
//! ([`SocialGraph`], [`DiffusionData`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod info;
pub mod iteration;
pub mod simulation;
pub mod state;
pub mod traits;
pub mod update;

pub use error::{DataError, SimulationError};
pub use id::{PieceId, UserId};
pub use info::{InfoSet, PropagatedInformation};
pub use iteration::{Iteration, Reception, UserDelta};
pub use simulation::Simulation;
pub use state::{Arrival, ReceiveOutcome, SimulationState, UserState};
pub use traits::{DiffusionData, Edge, EdgeKind, EdgeOrientation, Neighbours, SocialGraph};
pub use update::{builtin_update, NewestUpdate, NoReentryUpdate, OlderUpdate, UpdateMechanism};
