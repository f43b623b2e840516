//! Per-iteration performance metrics for the simulation engine.
//!
//! [`IterationMetrics`] captures timing and volume data for a single
//! iteration. The simulator logs it at `debug` level and keeps the most
//! recent one for callers.

/// Timing and volume metrics collected during a single iteration.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IterationMetrics {
    /// Wall-clock time for the whole transition, in microseconds.
    pub total_us: u64,
    /// Time spent in the four `reset_selections` calls, in microseconds.
    pub reset_us: u64,
    /// Time spent selecting, in microseconds.
    pub selection_us: u64,
    /// Time spent computing targets and buffering deliveries, in microseconds.
    pub propagation_us: u64,
    /// Time spent merging deliveries into recipients, in microseconds.
    pub merge_us: u64,
    /// Time spent in sight, in microseconds.
    pub sight_us: u64,
    /// Time spent in expiration, in microseconds.
    pub expiration_us: u64,
    /// Users asked to select.
    pub selecting_users: usize,
    /// Individual deliveries produced (piece, target pairs).
    pub deliveries: usize,
    /// Deliveries the recipients accepted.
    pub accepted_deliveries: usize,
}
