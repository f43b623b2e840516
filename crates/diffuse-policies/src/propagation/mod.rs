//! Propagation mechanisms.

mod all_neighbours;
mod gossip;
mod recommender;
mod window;

pub use all_neighbours::AllNeighbours;
pub use gossip::{Gossip, GossipMode};
pub use recommender::{PureRecommenderGossip, RecommenderGossip};
pub use window::RevisitWindow;
