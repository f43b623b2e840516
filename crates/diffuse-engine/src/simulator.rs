//! The simulation driver.
//!
//! [`Simulator`] owns a [`Protocol`] and a [`StopCondition`] and drives
//! them over a [`DiffusionData`] provider:
//!
//! ```text
//! Uninitialized --initialize / initialize_from--> Running --stop fires--> Finished
//!                                                   ^  |
//!                                                   +--+ step / cancelled run
//! ```
//!
//! Every committed iteration is appended to the [`Simulation`] log; the
//! current boundary state is kept alongside so steps never replay the log.

use diffuse_core::{DiffusionData, Simulation, SimulationState};

use crate::cancel::CancelToken;
use crate::error::SimulatorError;
use crate::metrics::IterationMetrics;
use crate::protocol::Protocol;
use crate::stop::{IterationProgress, StopCondition};

// ── Lifecycle ───────────────────────────────────────────────────

/// Where a [`Simulator`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// No data loaded yet.
    Uninitialized,
    /// Ready to step.
    Running,
    /// A stop condition fired; no further steps are allowed.
    Finished,
}

/// How [`Simulator::run()`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// A stop condition fired.
    Finished,
    /// The cancel token was set; the simulator stays `Running`.
    Cancelled,
}

/// Callback invoked after every committed iteration of a run.
///
/// Returning an error aborts the run after the iteration has been
/// committed.
pub trait IterationObserver {
    /// Inspect the log right after `progress.number` was appended.
    fn on_iteration(
        &mut self,
        simulation: &Simulation,
        progress: &IterationProgress,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<F> IterationObserver for F
where
    F: FnMut(
        &Simulation,
        &IterationProgress,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>,
{
    fn on_iteration(
        &mut self,
        simulation: &Simulation,
        progress: &IterationProgress,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self(simulation, progress)
    }
}

struct Session<'d> {
    data: &'d dyn DiffusionData,
    simulation: Simulation,
    state: SimulationState,
}

// ── Simulator ───────────────────────────────────────────────────

/// Drives a [`Protocol`] until a [`StopCondition`] fires or the run is
/// cancelled.
///
/// # Example
///
/// ```ignore
/// let mut sim = Simulator::new(protocol, Box::new(NoProgress::new(1)));
/// sim.initialize(&data)?;
/// let status = sim.run()?;
/// let log = sim.simulation().unwrap();
/// ```
pub struct Simulator<'d> {
    protocol: Protocol,
    stop: Box<dyn StopCondition>,
    cancel: CancelToken,
    lifecycle: Lifecycle,
    session: Option<Session<'d>>,
    last_metrics: IterationMetrics,
}

impl<'d> Simulator<'d> {
    /// A simulator waiting for data.
    pub fn new(protocol: Protocol, stop: Box<dyn StopCondition>) -> Self {
        Self {
            protocol,
            stop,
            cancel: CancelToken::new(),
            lifecycle: Lifecycle::Uninitialized,
            session: None,
            last_metrics: IterationMetrics::default(),
        }
    }

    /// A handle that cancels [`run()`](Self::run) between iterations.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current lifecycle stage.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The protocol being driven.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// The log so far.
    pub fn simulation(&self) -> Option<&Simulation> {
        self.session.as_ref().map(|s| &s.simulation)
    }

    /// The current boundary state.
    pub fn state(&self) -> Option<&SimulationState> {
        self.session.as_ref().map(|s| &s.state)
    }

    /// Take the log out of the simulator, leaving it uninitialized.
    pub fn into_simulation(self) -> Option<Simulation> {
        self.session.map(|s| s.simulation)
    }

    /// Metrics of the most recent iteration.
    pub fn last_metrics(&self) -> &IterationMetrics {
        &self.last_metrics
    }

    /// Start a fresh run on `data`.
    ///
    /// # Errors
    ///
    /// [`SimulatorError::EmptyData`] when `data` has no users, or a data
    /// error if an own piece is out of range.
    pub fn initialize(&mut self, data: &'d dyn DiffusionData) -> Result<(), SimulatorError> {
        if data.user_count() == 0 {
            return Err(SimulatorError::EmptyData);
        }
        let state = SimulationState::initialize(data)?;
        self.stop.reset();
        self.last_metrics = IterationMetrics::default();
        self.session = Some(Session {
            data,
            simulation: Simulation::new(state.clone()),
            state,
        });
        self.lifecycle = Lifecycle::Running;
        let [selection, propagation, sight, expiration, update] = self.protocol.names();
        tracing::info!(
            users = data.user_count(),
            pieces = data.piece_count(),
            selection,
            propagation,
            sight,
            expiration,
            update,
            stop = self.stop.name(),
            "simulation initialized"
        );
        Ok(())
    }

    /// Continue `prior` on `data`.
    ///
    /// The new iterations are appended to `prior`, numbering continues
    /// after its last iteration, and policies rebuild their memory from
    /// scratch.
    ///
    /// # Errors
    ///
    /// [`SimulatorError::UserCountMismatch`] when `prior` was recorded on
    /// data of another size, or a log error if `prior` cannot be replayed.
    pub fn initialize_from(
        &mut self,
        data: &'d dyn DiffusionData,
        prior: Simulation,
    ) -> Result<(), SimulatorError> {
        if data.user_count() == 0 {
            return Err(SimulatorError::EmptyData);
        }
        let found = prior.initial().user_count();
        if found != data.user_count() {
            return Err(SimulatorError::UserCountMismatch {
                expected: data.user_count(),
                found,
            });
        }
        let state = prior.final_state_with(self.protocol.update())?;
        self.stop.reset();
        self.last_metrics = IterationMetrics::default();
        tracing::info!(
            users = data.user_count(),
            resumed_after = state.iteration(),
            stop = self.stop.name(),
            "simulation resumed"
        );
        self.session = Some(Session {
            data,
            simulation: prior,
            state,
        });
        self.lifecycle = Lifecycle::Running;
        Ok(())
    }

    /// Execute one iteration and evaluate the stop condition.
    ///
    /// # Errors
    ///
    /// Lifecycle violations, or a failed transition. A failed transition
    /// commits nothing and leaves the simulator `Running`.
    pub fn step(&mut self) -> Result<IterationProgress, SimulatorError> {
        match self.lifecycle {
            Lifecycle::Uninitialized => return Err(SimulatorError::NotInitialized),
            Lifecycle::Finished => {
                let iteration = self.state().map_or(0, SimulationState::iteration);
                return Err(SimulatorError::Finished { iteration });
            }
            Lifecycle::Running => {}
        }
        let session = self.session.as_mut().ok_or(SimulatorError::NotInitialized)?;
        let transition = self.protocol.transition(session.data, &session.state)?;
        session.simulation.push(transition.iteration)?;
        session.state = transition.state;
        let progress = transition.progress;
        self.last_metrics = transition.metrics;

        let m = &self.last_metrics;
        tracing::debug!(
            iteration = progress.number,
            timestamp = ?progress.timestamp,
            propagated = progress.propagated,
            newly_propagated = progress.newly_propagated,
            received = progress.received,
            newly_seen = progress.newly_seen,
            discarded = progress.discarded,
            total_propagated = progress.total_propagated,
            total_us = m.total_us,
            selection_us = m.selection_us,
            propagation_us = m.propagation_us,
            sight_us = m.sight_us,
            expiration_us = m.expiration_us,
            "iteration committed"
        );

        if self.stop.should_stop(&progress) {
            self.lifecycle = Lifecycle::Finished;
            tracing::info!(
                iteration = progress.number,
                stop = self.stop.name(),
                total_propagated = progress.total_propagated,
                "simulation finished"
            );
        }
        Ok(progress)
    }

    /// Step until the stop condition fires or the run is cancelled.
    pub fn run(&mut self) -> Result<RunStatus, SimulatorError> {
        self.run_loop(None)
    }

    /// Like [`run()`](Self::run), calling `observer` after every
    /// committed iteration.
    pub fn run_observed(
        &mut self,
        observer: &mut dyn IterationObserver,
    ) -> Result<RunStatus, SimulatorError> {
        self.run_loop(Some(observer))
    }

    fn run_loop(
        &mut self,
        mut observer: Option<&mut dyn IterationObserver>,
    ) -> Result<RunStatus, SimulatorError> {
        loop {
            if self.cancel.is_cancelled() {
                let iteration = self.state().map_or(0, SimulationState::iteration);
                tracing::info!(iteration, "simulation cancelled");
                return Ok(RunStatus::Cancelled);
            }
            let progress = self.step()?;
            if let (Some(obs), Some(sim)) = (observer.as_deref_mut(), self.simulation()) {
                obs.on_iteration(sim, &progress)
                    .map_err(|e| SimulatorError::Observer {
                        iteration: progress.number,
                        reason: e.to_string(),
                    })?;
            }
            if self.lifecycle == Lifecycle::Finished {
                return Ok(RunStatus::Finished);
            }
        }
    }
}

impl std::fmt::Debug for Simulator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("protocol", &self.protocol)
            .field("stop", &self.stop.name())
            .field("lifecycle", &self.lifecycle)
            .field("iteration", &self.state().map(SimulationState::iteration))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop::{MaxIterations, NoProgress};
    use diffuse_core::EdgeOrientation;
    use diffuse_graph::StaticData;
    use diffuse_policies::{AllNeighbours, AllSight, CountSelection, InfiniteExpiration};
    use diffuse_test_utils::chain;
    use diffuse_test_utils::fixtures::FailingSelection;

    fn flooding() -> Protocol {
        Protocol::new(
            Box::new(CountSelection::builder().build()),
            Box::new(AllNeighbours::new(EdgeOrientation::Out)),
            Box::new(AllSight),
            Box::new(InfiniteExpiration),
        )
    }

    #[test]
    fn step_before_initialize_is_refused() {
        let mut sim: Simulator<'_> = Simulator::new(flooding(), Box::new(MaxIterations(1)));
        assert_eq!(sim.step(), Err(SimulatorError::NotInitialized));
        assert_eq!(sim.lifecycle(), Lifecycle::Uninitialized);
    }

    #[test]
    fn finished_simulator_refuses_more_steps() {
        let data = chain(3);
        let mut sim = Simulator::new(flooding(), Box::new(MaxIterations(1)));
        sim.initialize(&data).unwrap();
        sim.step().unwrap();
        assert_eq!(sim.lifecycle(), Lifecycle::Finished);
        assert_eq!(sim.step(), Err(SimulatorError::Finished { iteration: 1 }));
    }

    #[test]
    fn empty_data_is_rejected() {
        let data = StaticData::builder(true).build();
        let mut sim = Simulator::new(flooding(), Box::new(MaxIterations(1)));
        assert_eq!(sim.initialize(&data), Err(SimulatorError::EmptyData));
    }

    #[test]
    fn failed_step_commits_nothing() {
        let data = chain(3);
        let protocol = Protocol::new(
            Box::new(FailingSelection::new(1)),
            Box::new(AllNeighbours::new(EdgeOrientation::Out)),
            Box::new(AllSight),
            Box::new(InfiniteExpiration),
        );
        let mut sim = Simulator::new(protocol, Box::new(NoProgress::new(5)));
        sim.initialize(&data).unwrap();
        sim.step().unwrap();
        assert!(matches!(sim.step(), Err(SimulatorError::Step(_))));
        assert_eq!(sim.simulation().unwrap().len(), 1);
        assert_eq!(sim.state().unwrap().iteration(), 1);
        assert_eq!(sim.lifecycle(), Lifecycle::Running);
    }

    #[test]
    fn observer_sees_every_iteration_and_can_abort() {
        let data = chain(5);
        let mut sim = Simulator::new(flooding(), Box::new(NoProgress::new(1)));
        sim.initialize(&data).unwrap();
        let mut seen = Vec::new();
        let mut obs = |s: &Simulation,
                       p: &IterationProgress|
         -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            assert_eq!(s.len() as u32, p.number);
            seen.push(p.number);
            if p.number == 2 {
                return Err("enough".into());
            }
            Ok(())
        };
        let err = sim.run_observed(&mut obs).unwrap_err();
        assert_eq!(
            err,
            SimulatorError::Observer {
                iteration: 2,
                reason: "enough".into()
            }
        );
        assert_eq!(seen, vec![1, 2]);
    }
}
