//! In-memory implementations of the Diffuse collaborator traits.
//!
//! - [`AdjacencyGraph`]: directed or undirected weighted, typed graph.
//! - [`StaticData`]: users, pieces, creators, features and ground truth,
//!   assembled through [`StaticDataBuilder`].
//!
//! Both are plain owned structures with no I/O. Loading from files is the
//! caller's concern.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

#[cfg(test)]
pub(crate) mod compliance;
pub mod data;
pub mod error;
pub mod graph;

pub use data::{StaticData, StaticDataBuilder};
pub use error::GraphError;
pub use graph::AdjacencyGraph;
