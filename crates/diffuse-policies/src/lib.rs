//! Concrete policy implementations for Diffuse simulations.
//!
//! # Selection
//!
//! - [`CountSelection`]: count-bounded sampling of own, seen and
//!   propagated pools ([`CountSelection::epidemic`] takes everything).
//! - [`RealPropagatedSelection`]: seen pool narrowed by ground truth.
//! - [`RecommenderSelection`]: seen pool biased towards pieces that came
//!   through recommended edges.
//! - [`PureRecommenderSelection`]: seen pool restricted to those pieces.
//! - [`IndependentCascadeSelection`]: each newly seen piece is re-shared
//!   once with a fixed or edge-weight probability.
//!
//! # Propagation
//!
//! - [`AllNeighbours`]: flood every neighbour.
//! - [`Gossip`]: push-pull, push or pull rumour spreading with a revisit
//!   window.
//! - [`RecommenderGossip`]: push-pull gossip biased between recommended
//!   and organic neighbours.
//! - [`PureRecommenderGossip`]: push-pull gossip over recommended
//!   neighbours only.
//!
//! # Sight
//!
//! [`AllSight`], [`OrganicSight`], [`CountSight`], [`RecommendedSight`],
//! [`NotDiscardedSight`].
//!
//! # Expiration
//!
//! [`InfiniteExpiration`], [`AllNotPropagatedExpiration`],
//! [`TimedExpiration`], [`ExponentialDecayExpiration`],
//! [`AllNotRealPropagatedExpiration`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod expiration;
pub mod propagation;
pub mod selection;
pub mod sight;

pub use expiration::{
    AllNotPropagatedExpiration, AllNotRealPropagatedExpiration, ExponentialDecayExpiration,
    InfiniteExpiration, TimedExpiration,
};
pub use propagation::{
    AllNeighbours, Gossip, GossipMode, PureRecommenderGossip, RecommenderGossip, RevisitWindow,
};
pub use selection::{
    CascadeProbability, CountSelection, CountSelectionBuilder, IndependentCascadeSelection,
    PureRecommenderSelection, RealPropagatedSelection, RecommenderSelection,
};
pub use sight::{AllSight, CountSight, NotDiscardedSight, OrganicSight, RecommendedSight};
