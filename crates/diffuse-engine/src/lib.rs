//! Simulation engine for Diffuse.
//!
//! [`Protocol`] performs one synchronous iteration: selection,
//! propagation, sight and expiration all read the previous boundary state,
//! and their decisions are committed together as one
//! [`Iteration`](diffuse_core::Iteration). [`Simulator`] drives a protocol
//! until a [`StopCondition`] fires or a [`CancelToken`] is set, appending
//! every iteration to the [`Simulation`](diffuse_core::Simulation) log.
//!
//! [`SimulationConfig`] builds both from a serde-deserializable
//! description.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod simulator;
pub mod stop;

pub use cancel::CancelToken;
pub use config::{
    ConfigError, CountKeyword, CountSpec, ExpirationSpec, OrientationSpec, PropagationSpec,
    ProtocolConfig, SelectionSpec, SightSpec, SimulationConfig, StopSpec, UpdateSpec,
};
pub use error::{SimulatorError, StepError};
pub use metrics::IterationMetrics;
pub use protocol::{timestamp_for, Protocol, Transition};
pub use simulator::{IterationObserver, Lifecycle, RunStatus, Simulator};
pub use stop::{
    AnyOf, IterationProgress, MaxIterations, MaxTimestamp, Never, NoProgress, StopCondition,
    TotalPropagated,
};
