//! Expiration mechanisms.
//!
//! Ages are counted in iterations from the piece's first-received stamp,
//! falling back to the iteration it was sent in.

mod age;
mod basic;
mod real;

pub use age::{ExponentialDecayExpiration, TimedExpiration};
pub use basic::{AllNotPropagatedExpiration, InfiniteExpiration};
pub use real::AllNotRealPropagatedExpiration;

use diffuse_core::{PropagatedInformation, UserState};

/// Iterations elapsed since `user` first received `info`.
pub(crate) fn piece_age(user: &UserState, info: &PropagatedInformation, iteration: u32) -> u32 {
    let since = user.first_received(info.piece).unwrap_or(info.iteration);
    iteration.saturating_sub(since)
}
