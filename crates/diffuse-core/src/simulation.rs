//! The append-only run log.

use crate::error::SimulationError;
use crate::iteration::Iteration;
use crate::state::SimulationState;
use crate::update::{OlderUpdate, UpdateMechanism};

/// The initial state of a run plus every iteration executed since.
///
/// Any boundary state can be rebuilt with [`state_at`](Simulation::state_at)
/// by replaying deltas on top of the initial state.
#[derive(Clone, Debug, PartialEq)]
pub struct Simulation {
    initial: SimulationState,
    iterations: Vec<Iteration>,
}

impl Simulation {
    /// An empty log starting from `initial`.
    pub fn new(initial: SimulationState) -> Self {
        Self {
            initial,
            iterations: Vec::new(),
        }
    }

    /// The state the log starts from.
    pub fn initial(&self) -> &SimulationState {
        &self.initial
    }

    /// Recorded iterations, oldest first.
    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }

    /// Number of recorded iterations.
    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    /// Whether no iteration has been recorded.
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    /// Number the next appended iteration must carry.
    pub fn next_number(&self) -> u32 {
        self.initial.iteration() + self.iterations.len() as u32 + 1
    }

    /// Append an iteration. Its number must continue the log.
    pub fn push(&mut self, iteration: Iteration) -> Result<(), SimulationError> {
        let expected = self.next_number();
        if iteration.number != expected {
            return Err(SimulationError::NonContiguous {
                expected,
                found: iteration.number,
            });
        }
        self.iterations.push(iteration);
        Ok(())
    }

    /// State after the first `k` recorded iterations, replayed under the
    /// default [`OlderUpdate`] rule.
    pub fn state_at(&self, k: usize) -> Result<SimulationState, SimulationError> {
        self.state_at_with(k, &OlderUpdate)
    }

    /// State after the first `k` recorded iterations, replayed under
    /// `update`.
    pub fn state_at_with(
        &self,
        k: usize,
        update: &dyn UpdateMechanism,
    ) -> Result<SimulationState, SimulationError> {
        if k > self.iterations.len() {
            return Err(SimulationError::OutOfRange {
                requested: k,
                len: self.iterations.len(),
            });
        }
        let mut state = self.initial.clone();
        for it in &self.iterations[..k] {
            state.apply_with(it, update)?;
        }
        Ok(state)
    }

    /// State after every recorded iteration.
    pub fn final_state(&self) -> Result<SimulationState, SimulationError> {
        self.state_at(self.iterations.len())
    }

    /// State after every recorded iteration, replayed under `update`.
    pub fn final_state_with(
        &self,
        update: &dyn UpdateMechanism,
    ) -> Result<SimulationState, SimulationError> {
        self.state_at_with(self.iterations.len(), update)
    }

    /// The log truncated to its first `k` iterations.
    pub fn prefix(&self, k: usize) -> Result<Simulation, SimulationError> {
        if k > self.iterations.len() {
            return Err(SimulationError::OutOfRange {
                requested: k,
                len: self.iterations.len(),
            });
        }
        Ok(Self {
            initial: self.initial.clone(),
            iterations: self.iterations[..k].to_vec(),
        })
    }
}
