//! Sight mechanisms.
//!
//! A piece a sight policy does not notice stays in the inbox and is
//! offered again next iteration.

mod count;
mod edges;
mod pools;

pub use count::CountSight;
pub use edges::{OrganicSight, RecommendedSight};
pub use pools::{AllSight, NotDiscardedSight};
