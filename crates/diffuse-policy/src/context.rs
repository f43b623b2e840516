//! Read-only view handed to every policy call.

use diffuse_core::{DiffusionData, SimulationState, SocialGraph, UserId, UserState};

use crate::error::PolicyError;

/// Everything a policy may read while deciding iteration `iteration`.
///
/// `state` is the boundary state left by the previous iteration; policies
/// never see partially applied deltas.
#[derive(Clone, Copy)]
pub struct PolicyContext<'a> {
    data: &'a dyn DiffusionData,
    state: &'a SimulationState,
    iteration: u32,
    timestamp: Option<i64>,
}

impl<'a> PolicyContext<'a> {
    /// Construct a context.
    ///
    /// Typically called by the engine. Tests build one directly from a
    /// data fixture and a hand-made state.
    pub fn new(
        data: &'a dyn DiffusionData,
        state: &'a SimulationState,
        iteration: u32,
        timestamp: Option<i64>,
    ) -> Self {
        Self {
            data,
            state,
            iteration,
            timestamp,
        }
    }

    /// The static input data.
    pub fn data(&self) -> &'a dyn DiffusionData {
        self.data
    }

    /// The social graph.
    pub fn graph(&self) -> &'a dyn SocialGraph {
        self.data.graph()
    }

    /// The previous boundary state.
    pub fn state(&self) -> &'a SimulationState {
        self.state
    }

    /// Number of the iteration being computed.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Real-world timestamp of the iteration being computed.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// State of `user` at the previous boundary.
    pub fn user(&self, user: UserId) -> Result<&'a UserState, PolicyError> {
        Ok(self.state.user(user)?)
    }

    /// All user ids in ascending order.
    pub fn user_ids(&self) -> impl Iterator<Item = UserId> {
        (0..self.data.user_count() as u32).map(UserId)
    }
}

impl std::fmt::Debug for PolicyContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyContext")
            .field("iteration", &self.iteration)
            .field("timestamp", &self.timestamp)
            .field("users", &self.state.user_count())
            .finish()
    }
}
