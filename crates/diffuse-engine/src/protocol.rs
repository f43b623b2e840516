//! The per-iteration state transition.
//!
//! [`Protocol`] bundles one policy of each family plus the update rule for
//! re-arrivals, and turns the boundary
//! state of iteration `k - 1` into the [`Iteration`] record and boundary
//! state of iteration `k`:
//!
//! 1. reset every policy for iteration `k` (propagation, sight,
//!    selection, expiration);
//! 2. each selectable user, in ascending order, selects pieces;
//! 3. each selecting user's pieces get targets; deliveries are buffered;
//! 4. buffered deliveries are merged into the recipients' inboxes, in
//!    sender order, under the protocol's [`UpdateMechanism`];
//! 5. sight moves noticed inbox pieces to `seen`;
//! 6. expiration moves stale seen pieces to `discarded`, sparing pieces
//!    being sent;
//! 7. pieces that reached at least one target move to `propagated`.
//!
//! Policies read the previous boundary state through their
//! [`PolicyContext`]; sight and expiration additionally get the user's
//! working record, which already holds this iteration's deliveries.
//! Nothing is committed if any step fails.

use std::time::Instant;

use diffuse_core::{
    DiffusionData, Iteration, OlderUpdate, PieceId, PropagatedInformation, ReceiveOutcome,
    Reception, SimulationState, UpdateMechanism, UserDelta, UserId,
};
use diffuse_policy::{
    ExpirationMechanism, PolicyContext, PolicyError, PropagationMechanism, SelectionMechanism,
    SightMechanism,
};

use crate::error::StepError;
use crate::metrics::IterationMetrics;
use crate::stop::IterationProgress;

// ── Transition ──────────────────────────────────────────────────

/// Result of a successful [`Protocol::transition()`].
#[derive(Clone, Debug)]
pub struct Transition {
    /// The record to append to the simulation log.
    pub iteration: Iteration,
    /// Boundary state after the iteration.
    pub state: SimulationState,
    /// Summary read by stop conditions.
    pub progress: IterationProgress,
    /// Timing and volume figures.
    pub metrics: IterationMetrics,
}

// ── Protocol ────────────────────────────────────────────────────

/// One policy of each family and an update rule.
pub struct Protocol {
    selection: Box<dyn SelectionMechanism>,
    propagation: Box<dyn PropagationMechanism>,
    sight: Box<dyn SightMechanism>,
    expiration: Box<dyn ExpirationMechanism>,
    update: Box<dyn UpdateMechanism>,
}

impl Protocol {
    /// Bundle four policies under the default [`OlderUpdate`] rule.
    pub fn new(
        selection: Box<dyn SelectionMechanism>,
        propagation: Box<dyn PropagationMechanism>,
        sight: Box<dyn SightMechanism>,
        expiration: Box<dyn ExpirationMechanism>,
    ) -> Self {
        Self {
            selection,
            propagation,
            sight,
            expiration,
            update: Box::new(OlderUpdate),
        }
    }

    /// Replace the update rule.
    pub fn with_update(mut self, update: Box<dyn UpdateMechanism>) -> Self {
        self.update = update;
        self
    }

    /// The rule merging re-arrivals. Replays of this protocol's log must
    /// use the same one.
    pub fn update(&self) -> &dyn UpdateMechanism {
        self.update.as_ref()
    }

    /// Component names: selection, propagation, sight, expiration, update.
    pub fn names(&self) -> [&str; 5] {
        [
            self.selection.name(),
            self.propagation.name(),
            self.sight.name(),
            self.expiration.name(),
            self.update.name(),
        ]
    }

    /// Compute the iteration following `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] if a policy fails, a policy names a user or
    /// piece the data does not know, or a user selects a piece it cannot
    /// offer. `state` is never modified.
    pub fn transition(
        &mut self,
        data: &dyn DiffusionData,
        state: &SimulationState,
    ) -> Result<Transition, StepError> {
        let start = Instant::now();
        let number = state.iteration() + 1;
        let timestamp = timestamp_for(data, state);
        let n = state.user_count();
        if n != data.user_count() {
            return Err(StepError::UserCountMismatch {
                state: n,
                data: data.user_count(),
            });
        }
        let ctx = PolicyContext::new(data, state, number, timestamp);
        let mut metrics = IterationMetrics::default();

        // 1. Reset.
        let t = Instant::now();
        self.propagation
            .reset_selections(&ctx)
            .map_err(|e| policy_error("propagation", self.propagation.name(), number, e))?;
        self.sight
            .reset_selections(&ctx)
            .map_err(|e| policy_error("sight", self.sight.name(), number, e))?;
        self.selection
            .reset_selections(&ctx)
            .map_err(|e| policy_error("selection", self.selection.name(), number, e))?;
        self.expiration
            .reset_selections(&ctx)
            .map_err(|e| policy_error("expiration", self.expiration.name(), number, e))?;
        metrics.reset_us = t.elapsed().as_micros() as u64;

        // 2. Selection.
        let t = Instant::now();
        let selectable = self.selection.selectable_users(&ctx);
        metrics.selecting_users = selectable.len();
        let mut offers: Vec<(UserId, Vec<PropagatedInformation>)> =
            Vec::with_capacity(selectable.len());
        for u in selectable {
            let user = state.user(u)?;
            let selection = self
                .selection
                .select(user, &ctx)
                .map_err(|e| policy_error("selection", self.selection.name(), number, e))?;
            let mut pieces: Vec<PropagatedInformation> = Vec::with_capacity(selection.len());
            for info in selection.iter() {
                data.check_piece(info.piece)?;
                if !user.own().contains(info.piece)
                    && !user.seen().contains(info.piece)
                    && !user.propagated().contains(info.piece)
                {
                    return Err(StepError::UnknownSelection {
                        user: u,
                        piece: info.piece,
                        iteration: number,
                    });
                }
                if !pieces.iter().any(|p| p.piece == info.piece) {
                    pieces.push(PropagatedInformation::new(info.piece, number, u));
                }
            }
            if !pieces.is_empty() {
                offers.push((u, pieces));
            }
        }
        metrics.selection_us = t.elapsed().as_micros() as u64;

        // 3. Propagation, buffered per recipient.
        let t = Instant::now();
        let mut inbound: Vec<Vec<PropagatedInformation>> = vec![Vec::new(); n];
        let mut sending: Vec<Vec<PieceId>> = vec![Vec::new(); n];
        let per_piece = self.propagation.depends_on_piece();
        for (u, pieces) in &offers {
            let sender = state.user(*u)?;
            let mut shared: Option<Vec<UserId>> = None;
            for info in pieces {
                let targets = match (&shared, per_piece) {
                    (Some(cached), false) => cached.clone(),
                    _ => {
                        let raw = self.propagation.targets(sender, info, &ctx).map_err(|e| {
                            policy_error("propagation", self.propagation.name(), number, e)
                        })?;
                        let cleaned = clean_targets(data, *u, raw)?;
                        if !per_piece {
                            shared = Some(cleaned.clone());
                        }
                        cleaned
                    }
                };
                if targets.is_empty() {
                    continue;
                }
                for target in targets {
                    inbound[target.index()].push(*info);
                }
                sending[u.index()].push(info.piece);
            }
        }
        metrics.deliveries = inbound.iter().map(Vec::len).sum();
        metrics.propagation_us = t.elapsed().as_micros() as u64;

        // 4. Merge barrier.
        let t = Instant::now();
        let mut next = state.clone();
        let mut deltas: Vec<UserDelta> = vec![UserDelta::default(); n];
        for (idx, arrivals) in inbound.into_iter().enumerate() {
            let user = next.user_mut(UserId(idx as u32))?;
            let delta = &mut deltas[idx];
            for info in arrivals {
                let outcome = user.receive_with(info, info.origin, self.update.as_ref());
                if outcome.is_accepted() {
                    delta.received.push(Reception {
                        piece: info.piece,
                        sender: info.origin,
                    });
                }
                if outcome == ReceiveOutcome::Rereceived {
                    delta.rereceived.push(info.piece);
                }
            }
            metrics.accepted_deliveries += delta.received.len();
        }
        metrics.merge_us = t.elapsed().as_micros() as u64;

        // 5. Sight.
        let t = Instant::now();
        let mut newly_seen = 0usize;
        for idx in 0..n {
            let id = UserId(idx as u32);
            let working = next.user(id)?;
            if working.inbox().is_empty() {
                continue;
            }
            let noticed = self
                .sight
                .observe(working, &ctx)
                .map_err(|e| policy_error("sight", self.sight.name(), number, e))?;
            let user = next.user_mut(id)?;
            for piece in noticed {
                if user.see(piece) {
                    deltas[idx].seen.push(piece);
                    newly_seen += 1;
                }
            }
        }
        metrics.sight_us = t.elapsed().as_micros() as u64;

        // 6. Expiration.
        let t = Instant::now();
        for idx in 0..n {
            let id = UserId(idx as u32);
            let working = next.user(id)?;
            if working.seen().is_empty() {
                continue;
            }
            let expired = self
                .expiration
                .expire(working, &sending[idx], &ctx)
                .map_err(|e| policy_error("expiration", self.expiration.name(), number, e))?;
            let user = next.user_mut(id)?;
            for piece in expired {
                if user.discard(piece) {
                    deltas[idx].discarded.push(piece);
                }
            }
        }
        metrics.expiration_us = t.elapsed().as_micros() as u64;

        // 7. Commit sends.
        let mut newly_propagated = 0usize;
        for (idx, pieces) in sending.into_iter().enumerate() {
            if pieces.is_empty() {
                continue;
            }
            let user = next.user_mut(UserId(idx as u32))?;
            for piece in pieces {
                if user.mark_propagated(piece, number) {
                    newly_propagated += 1;
                }
                deltas[idx].propagated.push(piece);
            }
        }

        next.advance(number, timestamp);
        let iteration = Iteration::from_dense(number, timestamp, deltas);
        let progress = IterationProgress {
            newly_propagated,
            newly_seen,
            total_propagated: next.total_propagated(),
            timeline_exhausted: timeline_exhausted(data, timestamp),
            ..IterationProgress::from_iteration(&iteration)
        };
        metrics.total_us = start.elapsed().as_micros() as u64;

        Ok(Transition {
            iteration,
            state: next,
            progress,
            metrics,
        })
    }
}

impl std::fmt::Debug for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [selection, propagation, sight, expiration, update] = self.names();
        f.debug_struct("Protocol")
            .field("selection", &selection)
            .field("propagation", &propagation)
            .field("sight", &sight)
            .field("expiration", &expiration)
            .field("update", &update)
            .finish()
    }
}

// ── Helpers ─────────────────────────────────────────────────────

fn policy_error(
    family: &'static str,
    policy: &str,
    iteration: u32,
    source: PolicyError,
) -> StepError {
    StepError::Policy {
        family,
        policy: policy.to_string(),
        iteration,
        source,
    }
}

/// Drop the sender and duplicates, reject unknown users.
fn clean_targets(
    data: &dyn DiffusionData,
    sender: UserId,
    raw: Vec<UserId>,
) -> Result<Vec<UserId>, StepError> {
    let mut out = Vec::with_capacity(raw.len());
    for t in raw {
        data.check_user(t)?;
        if t != sender && !out.contains(&t) {
            out.push(t);
        }
    }
    Ok(out)
}

/// Timestamp of the iteration following `state`.
///
/// Without a timeline every iteration is untimed. Otherwise the first
/// iteration runs at the first timestamp and each later one at the next
/// timestamp; once the timeline is used up iterations are untimed.
pub fn timestamp_for(data: &dyn DiffusionData, state: &SimulationState) -> Option<i64> {
    if data.timestamps().is_empty() {
        return None;
    }
    match state.timestamp() {
        Some(t) => data.next_timestamp(Some(t)),
        None if state.iteration() == 0 => data.next_timestamp(None),
        None => None,
    }
}

fn timeline_exhausted(data: &dyn DiffusionData, timestamp: Option<i64>) -> bool {
    if data.timestamps().is_empty() {
        return false;
    }
    match timestamp {
        Some(t) => data.next_timestamp(Some(t)).is_none(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::EdgeOrientation;
    use diffuse_policies::{AllNeighbours, AllSight, CountSelection, InfiniteExpiration};
    use diffuse_test_utils::fixtures::{BlindSight, FailingSelection, FixedTargets};
    use diffuse_test_utils::{chain, timeline_data};

    fn flooding() -> Protocol {
        Protocol::new(
            Box::new(CountSelection::builder().build()),
            Box::new(AllNeighbours::new(EdgeOrientation::Out)),
            Box::new(AllSight),
            Box::new(InfiniteExpiration),
        )
    }

    #[test]
    fn first_iteration_moves_the_piece_one_hop() {
        let data = chain(3);
        let state = SimulationState::initialize(&data).unwrap();
        let mut p = flooding();
        let tr = p.transition(&data, &state).unwrap();
        assert_eq!(tr.iteration.number, 1);
        assert_eq!(tr.state.iteration(), 1);
        let d0 = tr.iteration.delta(UserId(0)).unwrap();
        assert_eq!(d0.propagated, vec![PieceId(0)]);
        let d1 = tr.iteration.delta(UserId(1)).unwrap();
        assert_eq!(d1.seen, vec![PieceId(0)]);
        assert!(tr.iteration.delta(UserId(2)).is_none());
        assert_eq!(tr.progress.newly_propagated, 1);
        assert_eq!(tr.progress.newly_seen, 1);
    }

    #[test]
    fn replaying_the_record_reproduces_the_state() {
        let data = chain(4);
        let mut state = SimulationState::initialize(&data).unwrap();
        let mut p = flooding();
        for _ in 0..4 {
            let tr = p.transition(&data, &state).unwrap();
            let mut replayed = state.clone();
            replayed.apply(&tr.iteration).unwrap();
            assert_eq!(replayed, tr.state);
            state = tr.state;
        }
    }

    #[test]
    fn piece_without_targets_stays_a_candidate() {
        // The last user of the chain has no follower.
        let data = chain(2);
        let mut state = SimulationState::initialize(&data).unwrap();
        let mut p = flooding();
        state = p.transition(&data, &state).unwrap().state;
        let tr = p.transition(&data, &state).unwrap();
        assert!(tr.iteration.delta(UserId(1)).is_none());
        assert!(tr.state.users()[1].seen().contains(PieceId(0)));
        assert!(tr.state.users()[1].propagated().is_empty());
    }

    #[test]
    fn unseen_pieces_stay_queued() {
        let data = chain(2);
        let state = SimulationState::initialize(&data).unwrap();
        let mut p = Protocol::new(
            Box::new(CountSelection::builder().build()),
            Box::new(AllNeighbours::new(EdgeOrientation::Out)),
            Box::new(BlindSight),
            Box::new(InfiniteExpiration),
        );
        let tr = p.transition(&data, &state).unwrap();
        let u1 = &tr.state.users()[1];
        assert!(u1.inbox().contains_key(&PieceId(0)));
        assert!(u1.seen().is_empty());
        assert_eq!(tr.progress.received, 1);
        assert_eq!(tr.progress.newly_seen, 0);
    }

    #[test]
    fn policy_failure_leaves_state_untouched() {
        let data = chain(3);
        let state = SimulationState::initialize(&data).unwrap();
        let before = state.clone();
        let mut p = Protocol::new(
            Box::new(FailingSelection::new(0)),
            Box::new(AllNeighbours::new(EdgeOrientation::Out)),
            Box::new(AllSight),
            Box::new(InfiniteExpiration),
        );
        let err = p.transition(&data, &state).unwrap_err();
        assert!(matches!(
            err,
            StepError::Policy {
                family: "selection",
                iteration: 1,
                ..
            }
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn unknown_target_is_a_data_error() {
        let data = chain(2);
        let state = SimulationState::initialize(&data).unwrap();
        let mut p = Protocol::new(
            Box::new(CountSelection::builder().build()),
            Box::new(FixedTargets::new(vec![UserId(9)])),
            Box::new(AllSight),
            Box::new(InfiniteExpiration),
        );
        assert!(matches!(
            p.transition(&data, &state),
            Err(StepError::Data(_))
        ));
    }

    #[test]
    fn self_and_duplicate_targets_are_dropped() {
        let data = chain(2);
        let state = SimulationState::initialize(&data).unwrap();
        let mut p = Protocol::new(
            Box::new(CountSelection::builder().build()),
            Box::new(FixedTargets::new(vec![UserId(0), UserId(1), UserId(1)])),
            Box::new(AllSight),
            Box::new(InfiniteExpiration),
        );
        let tr = p.transition(&data, &state).unwrap();
        assert_eq!(tr.metrics.deliveries, 1);
        assert_eq!(tr.progress.received, 1);
    }

    /// `a -> b`, `a -> c`, `c -> b`; `a` owns `p`. `b` sees `p` from `a`
    /// in iteration 1 and gets it again from `c` in iteration 2.
    fn late_copy() -> diffuse_graph::StaticData {
        let mut b = diffuse_graph::StaticData::builder(true);
        b.add_users(["a", "b", "c"]).unwrap();
        b.add_edge("a", "b", diffuse_core::Edge::organic()).unwrap();
        b.add_edge("a", "c", diffuse_core::Edge::organic()).unwrap();
        b.add_edge("c", "b", diffuse_core::Edge::organic()).unwrap();
        b.add_piece("p", &["a"], None).unwrap();
        b.build()
    }

    #[test]
    fn update_rule_decides_seen_provenance() {
        let data = late_copy();
        for (update, expected) in [
            (Box::new(OlderUpdate) as Box<dyn UpdateMechanism>, (1, UserId(0))),
            (Box::new(diffuse_core::NewestUpdate), (2, UserId(2))),
        ] {
            let mut p = flooding().with_update(update);
            let mut state = SimulationState::initialize(&data).unwrap();
            for _ in 0..2 {
                let tr = p.transition(&data, &state).unwrap();
                let mut replayed = state.clone();
                replayed.apply_with(&tr.iteration, p.update()).unwrap();
                assert_eq!(replayed, tr.state);
                state = tr.state;
            }
            let kept = state.users()[1].seen().get(PieceId(0)).copied();
            assert_eq!(kept.map(|i| (i.iteration, i.origin)), Some(expected), "{}", p.update().name());
            assert_eq!(state.users()[1].first_received(PieceId(0)), Some(1));
        }
    }

    #[test]
    fn names_include_the_update_rule() {
        let p = flooding().with_update(Box::new(diffuse_core::NoReentryUpdate));
        assert_eq!(p.names()[4], "no_reentry");
        assert!(format!("{p:?}").contains("no_reentry"));
    }

    #[test]
    fn timeline_drives_iteration_timestamps() {
        let data = timeline_data();
        let mut state = SimulationState::initialize(&data).unwrap();
        assert_eq!(timestamp_for(&data, &state), Some(10));
        let mut p = flooding();
        let first = p.transition(&data, &state).unwrap();
        assert_eq!(first.iteration.timestamp, Some(10));
        assert!(!first.progress.timeline_exhausted);
        state = first.state;
        let second = p.transition(&data, &state).unwrap();
        assert_eq!(second.iteration.timestamp, Some(20));
        assert!(second.progress.timeline_exhausted);
        state = second.state;
        assert_eq!(timestamp_for(&data, &state), None);
    }
}
