//! Hashing utilities for state and configuration comparison.
//!
//! FNV-1a over a fixed little-endian walk of the data. Not
//! cryptographically secure; used for fast equality checks when a backup
//! is read back or a run is re-executed.

use diffuse_core::{InfoSet, SimulationState};
use diffuse_engine::SimulationConfig;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[derive(Clone, Copy)]
struct Fnv(u64);

impl Fnv {
    #[inline]
    fn byte(self, b: u8) -> Self {
        Self((self.0 ^ b as u64).wrapping_mul(FNV_PRIME))
    }

    #[inline]
    fn bytes(self, bs: &[u8]) -> Self {
        bs.iter().fold(self, |h, &b| h.byte(b))
    }

    #[inline]
    fn u32(self, v: u32) -> Self {
        self.bytes(&v.to_le_bytes())
    }

    #[inline]
    fn u64(self, v: u64) -> Self {
        self.bytes(&v.to_le_bytes())
    }

    fn set(self, set: &InfoSet) -> Self {
        set.iter().fold(self.u32(set.len() as u32), |h, info| {
            h.u32(info.piece.0).u32(info.iteration).u32(info.origin.0)
        })
    }
}

/// Hash of a full boundary state.
///
/// Covers the boundary markers and, per user in index order, every pool
/// in insertion order with provenance. Pools are length-prefixed so that
/// moving a piece between pools changes the hash.
pub fn state_hash(state: &SimulationState) -> u64 {
    let mut h = Fnv(FNV_OFFSET).u32(state.iteration());
    h = match state.timestamp() {
        Some(t) => h.byte(1).u64(t as u64),
        None => h.byte(0),
    };
    for user in state.users() {
        h = h.u32(user.user().0).set(user.own());
        h = h.u32(user.inbox().len() as u32);
        for arrival in user.inbox().values() {
            h = h
                .u32(arrival.info.piece.0)
                .u32(arrival.info.iteration)
                .u32(arrival.info.origin.0)
                .u32(arrival.senders.len() as u32);
            for s in &arrival.senders {
                h = h.u32(s.0);
            }
        }
        h = h.set(user.seen()).set(user.propagated()).set(user.discarded());
        h = h.u32(user.first_received_map().len() as u32);
        for (piece, it) in user.first_received_map() {
            h = h.u32(piece.0).u32(*it);
        }
    }
    h.0
}

/// Hash of a run configuration.
///
/// Hashes the canonical JSON rendering, so two configurations that
/// deserialize to the same value hash alike.
pub fn config_hash(config: &SimulationConfig) -> u64 {
    // Plain enums and numbers always serialize.
    let json = serde_json::to_vec(config).unwrap_or_default();
    Fnv(FNV_OFFSET).bytes(&json).0
}
