//! Stop conditions evaluated after every committed iteration.

use diffuse_core::Iteration;

// ── IterationProgress ───────────────────────────────────────────

/// Summary of one committed iteration, as read by stop conditions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IterationProgress {
    /// Iteration number.
    pub number: u32,
    /// Timestamp the iteration ran at.
    pub timestamp: Option<i64>,
    /// Pieces sent to at least one target, summed over users.
    pub propagated: usize,
    /// Sent pieces that entered their sender's propagated pool for the
    /// first time.
    pub newly_propagated: usize,
    /// Users that sent something.
    pub propagating_users: usize,
    /// Accepted deliveries.
    pub received: usize,
    /// Pieces moved from an inbox to `seen`.
    pub newly_seen: usize,
    /// Pieces moved to `discarded`.
    pub discarded: usize,
    /// (user, piece) pairs in `propagated` after the iteration.
    pub total_propagated: usize,
    /// The data has a timeline and no timestamp remains after this one.
    pub timeline_exhausted: bool,
}

impl IterationProgress {
    /// Progress figures derivable from the iteration record alone.
    ///
    /// `newly_propagated`, `total_propagated` and `timeline_exhausted`
    /// need the surrounding states and are left for the caller.
    pub fn from_iteration(iteration: &Iteration) -> Self {
        Self {
            number: iteration.number,
            timestamp: iteration.timestamp,
            propagated: iteration.propagated_count(),
            propagating_users: iteration.propagating_users().count(),
            received: iteration.received_count(),
            newly_seen: iteration.seen_count(),
            discarded: iteration.discarded_count(),
            ..Self::default()
        }
    }

    /// Whether the iteration moved anything forward.
    pub fn made_progress(&self) -> bool {
        self.newly_propagated > 0 || self.newly_seen > 0
    }
}

// ── StopCondition ───────────────────────────────────────────────

/// Decides, after each iteration, whether the run is over.
///
/// Conditions may keep counters; [`reset`](StopCondition::reset) clears
/// them when a run (or resumed run) starts.
pub trait StopCondition: Send {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Clear internal counters.
    fn reset(&mut self) {}

    /// Whether to stop after the iteration summarised by `progress`.
    fn should_stop(&mut self, progress: &IterationProgress) -> bool;
}

/// Stop once iteration number `n` has completed.
///
/// Numbers continue across resumes, so a run resumed after iteration 3
/// with `MaxIterations(5)` executes two more iterations.
#[derive(Clone, Copy, Debug)]
pub struct MaxIterations(pub u32);

impl StopCondition for MaxIterations {
    fn name(&self) -> &str {
        "max_iterations"
    }

    fn should_stop(&mut self, progress: &IterationProgress) -> bool {
        progress.number >= self.0
    }
}

/// Stop after `patience` consecutive iterations in which nothing was
/// newly propagated and nothing was newly seen.
#[derive(Clone, Copy, Debug)]
pub struct NoProgress {
    patience: u32,
    idle: u32,
}

impl NoProgress {
    /// Stop after `patience` idle iterations in a row.
    pub fn new(patience: u32) -> Self {
        Self { patience, idle: 0 }
    }

    /// Idle iterations counted so far.
    pub fn idle(&self) -> u32 {
        self.idle
    }
}

impl StopCondition for NoProgress {
    fn name(&self) -> &str {
        "no_progress"
    }

    fn reset(&mut self) {
        self.idle = 0;
    }

    fn should_stop(&mut self, progress: &IterationProgress) -> bool {
        if progress.made_progress() {
            self.idle = 0;
        } else {
            self.idle += 1;
        }
        self.idle >= self.patience
    }
}

/// Stop once the iteration's timestamp exceeds the limit or the data's
/// timeline has run out.
#[derive(Clone, Copy, Debug)]
pub struct MaxTimestamp(pub i64);

impl StopCondition for MaxTimestamp {
    fn name(&self) -> &str {
        "max_timestamp"
    }

    fn should_stop(&mut self, progress: &IterationProgress) -> bool {
        progress.timeline_exhausted || progress.timestamp.is_some_and(|t| t > self.0)
    }
}

/// Stop once at least `n` (user, piece) pairs are propagated.
#[derive(Clone, Copy, Debug)]
pub struct TotalPropagated(pub usize);

impl StopCondition for TotalPropagated {
    fn name(&self) -> &str {
        "total_propagated"
    }

    fn should_stop(&mut self, progress: &IterationProgress) -> bool {
        progress.total_propagated >= self.0
    }
}

/// Stop when any inner condition says so.
///
/// Every inner condition sees every iteration, so counters stay in step.
pub struct AnyOf(pub Vec<Box<dyn StopCondition>>);

impl StopCondition for AnyOf {
    fn name(&self) -> &str {
        "any_of"
    }

    fn reset(&mut self) {
        self.0.iter_mut().for_each(|c| c.reset());
    }

    fn should_stop(&mut self, progress: &IterationProgress) -> bool {
        self.0
            .iter_mut()
            .fold(false, |stop, c| c.should_stop(progress) || stop)
    }
}

/// Never stops; the run ends only through cancellation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Never;

impl StopCondition for Never {
    fn name(&self) -> &str {
        "never"
    }

    fn should_stop(&mut self, _progress: &IterationProgress) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(number: u32) -> IterationProgress {
        IterationProgress {
            number,
            ..IterationProgress::default()
        }
    }

    #[test]
    fn max_iterations_counts_absolute_numbers() {
        let mut c = MaxIterations(3);
        assert!(!c.should_stop(&progress(2)));
        assert!(c.should_stop(&progress(3)));
    }

    #[test]
    fn no_progress_needs_consecutive_idle_iterations() {
        let mut c = NoProgress::new(2);
        let busy = IterationProgress {
            newly_seen: 1,
            ..progress(1)
        };
        assert!(!c.should_stop(&progress(1)));
        assert!(!c.should_stop(&busy));
        assert_eq!(c.idle(), 0);
        assert!(!c.should_stop(&progress(3)));
        assert!(c.should_stop(&progress(4)));
        c.reset();
        assert_eq!(c.idle(), 0);
    }

    #[test]
    fn repropagation_alone_is_not_progress() {
        let mut c = NoProgress::new(1);
        let repeat = IterationProgress {
            propagated: 4,
            ..progress(1)
        };
        assert!(c.should_stop(&repeat));
    }

    #[test]
    fn max_timestamp_fires_past_the_limit_or_at_timeline_end() {
        let mut c = MaxTimestamp(20);
        let at = |t| IterationProgress {
            timestamp: Some(t),
            ..progress(1)
        };
        assert!(!c.should_stop(&at(20)));
        assert!(c.should_stop(&at(21)));
        let exhausted = IterationProgress {
            timeline_exhausted: true,
            ..progress(1)
        };
        assert!(c.should_stop(&exhausted));
        assert!(!c.should_stop(&progress(1)));
    }

    #[test]
    fn any_of_feeds_every_condition() {
        let mut c = AnyOf(vec![Box::new(TotalPropagated(5)), Box::new(NoProgress::new(2))]);
        assert!(!c.should_stop(&progress(1)));
        // The idle counter advanced even though the first condition was
        // evaluated first.
        assert!(c.should_stop(&progress(2)));
        assert!(!Never.should_stop(&progress(100)));
    }
}
