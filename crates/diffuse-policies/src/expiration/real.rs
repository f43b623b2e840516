//! Ground-truth driven expiration.

use diffuse_core::{PropagatedInformation, UserState};
use diffuse_policy::{ExpirationMechanism, PolicyContext, PolicyError};

/// Keeps only the pieces the user really re-propagated.
///
/// Without the cutoff a piece the user never really re-shared expires at
/// once and a really re-shared piece never does. With the cutoff, expiry
/// waits until the current timestamp has passed the piece's own timestamp
/// (not re-shared) or the recorded re-share timestamp (re-shared). Missing
/// timestamps disable the cutoff for that piece.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllNotRealPropagatedExpiration {
    timestamp_cutoff: bool,
}

impl AllNotRealPropagatedExpiration {
    /// Create the policy.
    pub fn new(timestamp_cutoff: bool) -> Self {
        Self { timestamp_cutoff }
    }
}

impl ExpirationMechanism for AllNotRealPropagatedExpiration {
    fn name(&self) -> &str {
        "all_not_real_propagated"
    }

    fn expired(
        &mut self,
        user: &UserState,
        info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        let data = ctx.data();
        let real = data.is_real_propagated(user.user(), info.piece);
        if !self.timestamp_cutoff {
            return Ok(!real);
        }
        let now = ctx.timestamp();
        if real {
            let shared_at = data.real_propagation_timestamp(user.user(), info.piece);
            Ok(matches!((now, shared_at), (Some(now), Some(at)) if now > at))
        } else {
            match (now, data.piece_timestamp(info.piece)) {
                (Some(now), Some(created)) => Ok(now > created),
                _ => Ok(true),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::{PieceId, SimulationState, UserId};
    use diffuse_test_utils::{deliver_and_see, timeline_data};

    /// u1 has seen p0 (really re-shared at t=20) and p1 (never re-shared,
    /// created at t=10).
    fn seen_both() -> (diffuse_graph::StaticData, SimulationState) {
        let data = timeline_data();
        let mut state = SimulationState::initialize(&data).unwrap();
        deliver_and_see(&mut state, UserId(1), PieceId(0), UserId(0), 1);
        deliver_and_see(&mut state, UserId(1), PieceId(1), UserId(2), 1);
        (data, state)
    }

    #[test]
    fn without_cutoff_only_real_pieces_survive() {
        let (data, state) = seen_both();
        let ctx = PolicyContext::new(&data, &state, 2, Some(10));
        let mut exp = AllNotRealPropagatedExpiration::new(false);
        assert_eq!(
            exp.expire(&state.users()[1], &[], &ctx).unwrap(),
            vec![PieceId(1)]
        );
    }

    #[test]
    fn cutoff_waits_for_the_timestamps() {
        let (data, state) = seen_both();
        let mut exp = AllNotRealPropagatedExpiration::new(true);
        let u1 = &state.users()[1];

        let at_10 = PolicyContext::new(&data, &state, 2, Some(10));
        assert!(exp.expire(u1, &[], &at_10).unwrap().is_empty());

        let at_20 = PolicyContext::new(&data, &state, 3, Some(20));
        assert_eq!(exp.expire(u1, &[], &at_20).unwrap(), vec![PieceId(1)]);

        let at_30 = PolicyContext::new(&data, &state, 4, Some(30));
        assert_eq!(
            exp.expire(u1, &[], &at_30).unwrap(),
            vec![PieceId(0), PieceId(1)]
        );
    }
}
