//! The [`ExpirationMechanism`] trait.

use diffuse_core::{PieceId, PropagatedInformation, UserState};

use crate::context::PolicyContext;
use crate::error::PolicyError;

/// Decides which seen-but-unpropagated pieces a user drops.
pub trait ExpirationMechanism: Send {
    /// Human-readable name for error reporting and logs.
    fn name(&self) -> &str;

    /// Rebuild per-iteration memory (reseed generators).
    fn reset_selections(&mut self, _ctx: &PolicyContext<'_>) -> Result<(), PolicyError> {
        Ok(())
    }

    /// Whether `info`, seen by `user` and not propagated, expires now.
    fn expired(
        &mut self,
        user: &UserState,
        info: &PropagatedInformation,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, PolicyError>;

    /// Expired pieces among `user`'s seen pieces, skipping `sending`.
    ///
    /// `sending` holds the pieces the user delivers this iteration; they
    /// are about to become propagated and are never expired.
    fn expire(
        &mut self,
        user: &UserState,
        sending: &[PieceId],
        ctx: &PolicyContext<'_>,
    ) -> Result<Vec<PieceId>, PolicyError> {
        let mut out = Vec::new();
        for info in user.seen().iter() {
            if sending.contains(&info.piece) || user.propagated().contains(info.piece) {
                continue;
            }
            if self.expired(user, info, ctx)? {
                out.push(info.piece);
            }
        }
        Ok(out)
    }
}
