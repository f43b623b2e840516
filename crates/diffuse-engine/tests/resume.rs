//! Resuming from a recorded prefix and cooperative cancellation.

use diffuse_core::Simulation;
use diffuse_engine::{
    IterationObserver, IterationProgress, Lifecycle, RunStatus, SimulationConfig, SimulatorError,
};
use diffuse_test_utils::{chain, random_graph};

/// Policies without cross-iteration memory, so a resumed run is
/// indistinguishable from an uninterrupted one.
fn memoryless(iterations: u32) -> SimulationConfig {
    let json = format!(
        r#"{{
            "seed": 21,
            "protocol": {{
                "selection": {{ "name": "count", "own": 1, "received": 2, "repropagate": 1 }},
                "propagation": {{ "name": "all_neighbours" }},
                "sight": {{ "name": "count", "count": 2 }},
                "expiration": {{ "name": "exponential_decay", "half_life": 2.0 }}
            }},
            "stop": {{ "name": "max_iterations", "iterations": {iterations} }}
        }}"#
    );
    SimulationConfig::from_json_str(&json).unwrap()
}

#[test]
fn resumed_run_matches_uninterrupted_run() {
    let data = random_graph(30, 0.15, 5);

    let mut full = memoryless(8).simulator().unwrap();
    full.initialize(&data).unwrap();
    full.run().unwrap();
    let full = full.into_simulation().unwrap();

    let mut first = memoryless(3).simulator().unwrap();
    first.initialize(&data).unwrap();
    first.run().unwrap();
    let prefix = first.into_simulation().unwrap();
    assert_eq!(prefix.len(), 3);

    let mut second = memoryless(8).simulator().unwrap();
    second.initialize_from(&data, prefix).unwrap();
    second.run().unwrap();
    let resumed = second.into_simulation().unwrap();

    assert_eq!(resumed.len(), 8);
    assert_eq!(resumed.iterations(), full.iterations());
    assert_eq!(resumed.final_state().unwrap(), full.final_state().unwrap());
}

#[test]
fn resume_from_a_log_prefix() {
    let data = random_graph(20, 0.2, 8);
    let mut sim = memoryless(6).simulator().unwrap();
    sim.initialize(&data).unwrap();
    sim.run().unwrap();
    let log = sim.into_simulation().unwrap();

    let mut again = memoryless(6).simulator().unwrap();
    again.initialize_from(&data, log.prefix(4).unwrap()).unwrap();
    again.run().unwrap();
    assert_eq!(again.simulation().unwrap().iterations(), log.iterations());
}

#[test]
fn resume_rejects_a_log_from_other_data() {
    let small = chain(3);
    let mut sim = memoryless(2).simulator().unwrap();
    sim.initialize(&small).unwrap();
    sim.run().unwrap();
    let log = sim.into_simulation().unwrap();

    let big = chain(5);
    let mut other = memoryless(4).simulator().unwrap();
    assert_eq!(
        other.initialize_from(&big, log),
        Err(SimulatorError::UserCountMismatch {
            expected: 5,
            found: 3
        })
    );
    assert_eq!(other.lifecycle(), Lifecycle::Uninitialized);
}

#[test]
fn cancelled_before_start_runs_nothing() {
    let data = chain(4);
    let mut sim = memoryless(10).simulator().unwrap();
    sim.initialize(&data).unwrap();
    let token = sim.cancel_token();
    token.cancel();
    assert_eq!(sim.run().unwrap(), RunStatus::Cancelled);
    assert!(sim.simulation().unwrap().is_empty());

    token.reset();
    assert_eq!(sim.run().unwrap(), RunStatus::Finished);
    assert_eq!(sim.simulation().unwrap().len(), 10);
}

struct CancelAt {
    at: u32,
    token: diffuse_engine::CancelToken,
}

impl IterationObserver for CancelAt {
    fn on_iteration(
        &mut self,
        _simulation: &Simulation,
        progress: &IterationProgress,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if progress.number == self.at {
            self.token.cancel();
        }
        Ok(())
    }
}

#[test]
fn cancellation_stops_at_an_iteration_boundary() {
    let data = random_graph(15, 0.2, 2);
    let mut sim = memoryless(10).simulator().unwrap();
    sim.initialize(&data).unwrap();
    let mut observer = CancelAt {
        at: 3,
        token: sim.cancel_token(),
    };
    assert_eq!(sim.run_observed(&mut observer).unwrap(), RunStatus::Cancelled);
    assert_eq!(sim.lifecycle(), Lifecycle::Running);
    let log = sim.simulation().unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(&log.final_state().unwrap(), sim.state().unwrap());

    // The run picks up where it stopped.
    sim.cancel_token().reset();
    let progress = sim.step().unwrap();
    assert_eq!(progress.number, 4);
}

#[test]
fn cancel_from_another_thread() {
    let data = chain(3);
    let config = SimulationConfig::from_json_str(
        r#"{
            "protocol": {
                "selection": { "name": "epidemic" },
                "propagation": { "name": "all_neighbours" },
                "sight": { "name": "all" },
                "expiration": { "name": "infinite" }
            },
            "stop": { "name": "never" }
        }"#,
    )
    .unwrap();
    let mut sim = config.simulator().unwrap();
    sim.initialize(&data).unwrap();
    let token = sim.cancel_token();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        token.cancel();
    });
    assert_eq!(sim.run().unwrap(), RunStatus::Cancelled);
    handle.join().unwrap();
    assert_eq!(sim.lifecycle(), Lifecycle::Running);
}
