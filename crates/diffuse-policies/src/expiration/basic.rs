use diffuse_core::{PropagatedInformation, UserState};
use diffuse_policy::{ExpirationMechanism, PolicyContext, PolicyError};

/// Nothing ever expires.
#[derive(Clone, Copy, Debug, Default)]
pub struct InfiniteExpiration;

impl ExpirationMechanism for InfiniteExpiration {
    fn name(&self) -> &str {
        "infinite"
    }

    fn expired(
        &mut self,
        _user: &UserState,
        _info: &PropagatedInformation,
        _ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        Ok(false)
    }
}

/// A seen piece survives only the iteration it was sent in; from the next
/// iteration on it expires if the user has not propagated it.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllNotPropagatedExpiration;

impl ExpirationMechanism for AllNotPropagatedExpiration {
    fn name(&self) -> &str {
        "all_not_propagated"
    }

    fn expired(
        &mut self,
        _user: &UserState,
        info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError> {
        Ok(info.iteration < ctx.iteration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::{PieceId, SimulationState, UserId};
    use diffuse_test_utils::{deliver_and_see, owning_star};

    #[test]
    fn infinite_keeps_everything() {
        let data = owning_star(1, 2);
        let mut state = SimulationState::initialize(&data).unwrap();
        deliver_and_see(&mut state, UserId(0), PieceId(1), UserId(1), 1);
        let ctx = PolicyContext::new(&data, &state, 50, None);
        assert!(InfiniteExpiration
            .expire(&state.users()[0], &[], &ctx)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn all_not_propagated_drops_pieces_from_earlier_iterations() {
        let data = owning_star(1, 2);
        let mut state = SimulationState::initialize(&data).unwrap();
        deliver_and_see(&mut state, UserId(0), PieceId(1), UserId(1), 1);
        deliver_and_see(&mut state, UserId(0), PieceId(2), UserId(2), 2);
        let ctx = PolicyContext::new(&data, &state, 2, None);
        let mut exp = AllNotPropagatedExpiration;
        assert_eq!(
            exp.expire(&state.users()[0], &[], &ctx).unwrap(),
            vec![PieceId(1)]
        );
        // A piece being sent this iteration is spared.
        assert!(exp
            .expire(&state.users()[0], &[PieceId(1)], &ctx)
            .unwrap()
            .is_empty());
    }
}
