//! The [`SightMechanism`] trait.

use diffuse_core::{Arrival, PieceId, UserState};

use crate::context::PolicyContext;
use crate::error::PolicyError;

/// Decides which inbox pieces a user notices.
///
/// Noticed pieces move to `seen`; the rest stay in the inbox and are
/// offered again next iteration.
pub trait SightMechanism: Send {
    /// Human-readable name for error reporting and logs.
    fn name(&self) -> &str;

    /// Rebuild per-iteration memory (reseed generators).
    fn reset_selections(&mut self, _ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        Ok(())
    }

    /// Whether `user` notices `arrival`.
    fn sees(
        &mut self,
        user: &UserState,
        arrival: &Arrival,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError>;

    /// Pieces of `user`'s inbox noticed this iteration, in inbox order.
    ///
    /// `user` is the state after this iteration's deliveries. The default
    /// filters the inbox through [`sees`](SightMechanism::sees).
    fn observe(
        &mut self,
        user: &UserState,
        ctx: &PolicyContext<'_>,
    ) -> Result<Vec<PieceId>, PolicyError> {
        let mut out = Vec::new();
        for (&piece, arrival) in user.inbox() {
            if self.sees(user, arrival, ctx)? {
                out.push(piece);
            }
        }
        Ok(out)
    }
}
