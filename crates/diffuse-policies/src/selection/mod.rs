//! Selection mechanisms.

mod cascade;
mod count;
mod real;
mod recommender;

pub use cascade::{CascadeProbability, IndependentCascadeSelection};
pub use count::{CountSelection, CountSelectionBuilder};
pub use real::RealPropagatedSelection;
pub use recommender::{PureRecommenderSelection, RecommenderSelection};
