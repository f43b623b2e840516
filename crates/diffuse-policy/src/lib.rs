//! Policy traits and shared machinery for Diffuse simulations.
//!
//! A protocol is one instance of each of four policy families:
//!
//! | Family | Decides |
//! |--------|---------|
//! | [`SelectionMechanism`] | which known pieces a user offers this iteration |
//! | [`PropagationMechanism`] | which neighbours receive an offered piece |
//! | [`SightMechanism`] | which inbox pieces a user notices |
//! | [`ExpirationMechanism`] | which seen pieces a user drops |
//!
//! Every family reads the previous boundary state through a
//! [`PolicyContext`] and may keep private memory that is rebuilt once per
//! iteration in `reset_selections`. Stochastic policies own a seeded
//! generator derived with [`iteration_rng`], so runs are reproducible and
//! resumable.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod expiration;
pub mod propagation;
pub mod rng;
pub mod sampling;
pub mod selection;
pub mod sight;

pub use context::PolicyContext;
pub use error::{check_probability, PolicyError};
pub use expiration::ExpirationMechanism;
pub use propagation::{PropagationMechanism, Readiness};
pub use rng::{derive_seed, iteration_rng};
pub use sampling::{sample, sample_indices, Count};
pub use selection::{default_selectable_users, outgoing, Selection, SelectionMechanism};
pub use sight::SightMechanism;
