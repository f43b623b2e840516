//! Flooding propagation.

use diffuse_core::{EdgeOrientation, PropagatedInformation, UserId, UserState};
use diffuse_policy::{PolicyContext, PolicyError, PropagationMechanism};

/// Sends every piece to every neighbour along `orientation`.
#[derive(Clone, Copy, Debug)]
pub struct AllNeighbours {
    orientation: EdgeOrientation,
}

impl AllNeighbours {
    /// Flood along `orientation`.
    pub fn new(orientation: EdgeOrientation) -> Self {
        Self { orientation }
    }

    /// The followed orientation.
    pub fn orientation(&self) -> EdgeOrientation {
        self.orientation
    }
}

impl PropagationMechanism for AllNeighbours {
    fn name(&self) -> &str {
        "all_neighbours"
    }

    fn depends_on_piece(&self) -> bool {
        false
    }

    fn targets(
        &mut self,
        sender: &UserState,
        _info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<Vec<UserId>, PolicyError> {
        let me = sender.user();
        Ok(ctx
            .graph()
            .neighbours(me, self.orientation)
            .into_iter()
            .filter(|&v| v != me)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffuse_core::{PieceId, SimulationState};
    use diffuse_test_utils::owning_star;

    fn any_info() -> PropagatedInformation {
        PropagatedInformation::new(PieceId(0), 1, UserId(0))
    }

    #[test]
    fn hub_floods_its_leaves() {
        let data = owning_star(1, 3);
        let state = SimulationState::initialize(&data).unwrap();
        let ctx = PolicyContext::new(&data, &state, 1, None);
        let mut p = AllNeighbours::new(EdgeOrientation::Out);
        let targets = p.targets(&state.users()[0], &any_info(), &ctx).unwrap();
        assert_eq!(targets, vec![UserId(1), UserId(2), UserId(3)]);
    }

    #[test]
    fn leaf_has_no_outgoing_targets() {
        let data = owning_star(1, 3);
        let state = SimulationState::initialize(&data).unwrap();
        let ctx = PolicyContext::new(&data, &state, 1, None);
        let mut out = AllNeighbours::new(EdgeOrientation::Out);
        assert!(out.targets(&state.users()[2], &any_info(), &ctx).unwrap().is_empty());
        let mut inc = AllNeighbours::new(EdgeOrientation::In);
        assert_eq!(
            inc.targets(&state.users()[2], &any_info(), &ctx).unwrap(),
            vec![UserId(0)]
        );
    }
}
