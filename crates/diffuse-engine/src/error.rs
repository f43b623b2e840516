//! Errors raised while stepping and driving a simulation.

use diffuse_core::{DataError, PieceId, SimulationError, UserId};
use diffuse_policy::PolicyError;
use thiserror::Error;

/// Failure of a single state transition.
///
/// A failed transition leaves the boundary state untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StepError {
    /// A policy reported an error.
    #[error("{family} policy '{policy}' failed at iteration {iteration}: {source}")]
    Policy {
        /// Policy family: `selection`, `propagation`, `sight` or `expiration`.
        family: &'static str,
        /// Name of the failing policy.
        policy: String,
        /// Iteration being computed.
        iteration: u32,
        /// What went wrong.
        #[source]
        source: PolicyError,
    },
    /// A policy selected a piece its user could not offer.
    #[error("user {user} selected {piece} outside its pools at iteration {iteration}")]
    UnknownSelection {
        /// The selecting user.
        user: UserId,
        /// The offending piece.
        piece: PieceId,
        /// Iteration being computed.
        iteration: u32,
    },
    /// The boundary state and the data disagree on the number of users.
    #[error("state has {state} users but the data has {data}")]
    UserCountMismatch {
        /// Users in the state.
        state: usize,
        /// Users in the data.
        data: usize,
    },
    /// The state or a policy referenced an entity unknown to the data.
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Errors from the [`Simulator`](crate::Simulator) lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimulatorError {
    /// `step`/`run` was called before `initialize`.
    #[error("simulator is not initialized")]
    NotInitialized,
    /// `step`/`run` was called after a stop condition fired.
    #[error("simulation already finished at iteration {iteration}")]
    Finished {
        /// Last completed iteration.
        iteration: u32,
    },
    /// The data has no users.
    #[error("data has no users")]
    EmptyData,
    /// The prior simulation does not fit the data.
    #[error("prior simulation has {found} users but the data has {expected}")]
    UserCountMismatch {
        /// Users in the data.
        expected: usize,
        /// Users in the prior simulation.
        found: usize,
    },
    /// A transition failed.
    #[error(transparent)]
    Step(#[from] StepError),
    /// The iteration log rejected an operation.
    #[error(transparent)]
    Log(#[from] SimulationError),
    /// The initial state could not be built from the data.
    #[error(transparent)]
    Data(#[from] DataError),
    /// An iteration observer aborted the run.
    #[error("observer aborted the run at iteration {iteration}: {reason}")]
    Observer {
        /// Iteration just completed.
        iteration: u32,
        /// Observer-supplied reason.
        reason: String,
    },
}
