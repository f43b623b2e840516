//! Error type for graph and data construction.

use thiserror::Error;

/// Errors raised while building a graph or a data set.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GraphError {
    /// An edge endpoint is outside `0..user_count`.
    #[error("edge endpoint {index} out of range (graph has {user_count} users)")]
    DanglingEndpoint {
        /// The offending endpoint.
        index: u32,
        /// Number of users in the graph.
        user_count: usize,
    },
    /// A self-loop was requested.
    #[error("self-loop on user {user}")]
    SelfLoop {
        /// The user.
        user: u32,
    },
    /// Edge weight is NaN, infinite or negative.
    #[error("invalid edge weight {weight}")]
    InvalidWeight {
        /// The rejected weight.
        weight: f64,
    },
    /// A label was registered twice.
    #[error("duplicate {kind} label '{label}'")]
    DuplicateLabel {
        /// "user" or "piece".
        kind: &'static str,
        /// The label.
        label: String,
    },
    /// A label was referenced before being registered.
    #[error("unknown {kind} label '{label}'")]
    UnknownLabel {
        /// "user" or "piece".
        kind: &'static str,
        /// The label.
        label: String,
    },
    /// A piece was registered without any creator.
    #[error("piece '{label}' has no creator")]
    NoCreator {
        /// Label of the piece.
        label: String,
    },
}
