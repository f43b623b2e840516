//! Independent cascade selection.

use diffuse_core::{EdgeOrientation, PropagatedInformation, UserState};
use diffuse_policy::{
    check_probability, iteration_rng, outgoing, sample, Count, PolicyContext, PolicyError,
    Selection, SelectionMechanism,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Activation probability of a cascade edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CascadeProbability {
    /// Same probability on every edge.
    Fixed(f64),
    /// The weight of the edge towards the piece's origin. `Und` tries the
    /// outgoing edge first and the incoming one second, each with its own
    /// draw.
    EdgeWeight(EdgeOrientation),
}

/// Each seen piece gets exactly one activation attempt, in the iteration
/// right after it was sent to the user.
///
/// Pairs with a sight policy that notices arrivals immediately; a piece
/// noticed late has missed its attempt. Own and already propagated pieces
/// are sampled with their counts.
#[derive(Debug)]
pub struct IndependentCascadeSelection {
    probability: CascadeProbability,
    own: Count,
    repropagate: Count,
    seed: u64,
    rng: ChaCha8Rng,
}

impl IndependentCascadeSelection {
    /// Create the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidParameter`] if a fixed probability is
    /// outside `[0, 1]`.
    pub fn new(
        probability: CascadeProbability,
        own: Count,
        repropagate: Count,
        seed: u64,
    ) -> Result<Self, PolicyError> {
        if let CascadeProbability::Fixed(p) = probability {
            check_probability("independent_cascade", "probability", p)?;
        }
        Ok(Self {
            probability,
            own,
            repropagate,
            seed,
            rng: iteration_rng(seed, 0),
        })
    }

    fn activates(&mut self, user: &UserState, info: &PropagatedInformation, ctx: &PolicyContext<'_>) -> bool {
        let graph = ctx.graph();
        let me = user.user();
        let weights = match self.probability {
            CascadeProbability::Fixed(p) => [Some(p), None],
            CascadeProbability::EdgeWeight(EdgeOrientation::Out) => {
                [graph.edge(me, info.origin).map(|e| e.weight), None]
            }
            CascadeProbability::EdgeWeight(EdgeOrientation::In) => {
                [graph.edge(info.origin, me).map(|e| e.weight), None]
            }
            CascadeProbability::EdgeWeight(EdgeOrientation::Und) => [
                graph.edge(me, info.origin).map(|e| e.weight),
                graph.edge(info.origin, me).map(|e| e.weight),
            ],
        };
        for p in weights.into_iter().flatten() {
            let r: f64 = self.rng.gen();
            if r < p {
                return true;
            }
        }
        false
    }
}

impl SelectionMechanism for IndependentCascadeSelection {
    fn name(&self) -> &str {
        "independent_cascade"
    }

    fn reset_selections(&mut self, ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        self.rng = iteration_rng(self.seed, ctx.iteration());
        Ok(())
    }

    fn select(
        &mut self,
        user: &UserState,
        ctx: &PolicyContext<'_>,
    ) -> Result<Selection, PolicyError> {
        let me = user.user();
        let it = ctx.iteration();

        let own_pool: Vec<PropagatedInformation> = user.own_pool().copied().collect();
        let own = sample(&own_pool, self.own, &mut self.rng);

        let mut received = Vec::new();
        for info in user.seen().iter() {
            if info.iteration + 1 == it && self.activates(user, info, ctx) {
                received.push(*info);
            }
        }

        let repr_pool: Vec<PropagatedInformation> = user.propagated().iter().copied().collect();
        let repropagated = sample(&repr_pool, self.repropagate, &mut self.rng);

        Ok(Selection {
            own: own.iter().map(|i| outgoing(i, it, me)).collect(),
            received: received.iter().map(|i| outgoing(i, it, me)).collect(),
            repropagated: repropagated.iter().map(|i| outgoing(i, it, me)).collect(),
        })
    }
}
