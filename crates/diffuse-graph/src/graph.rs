//! Adjacency-list social graph.

use indexmap::IndexMap;

use diffuse_core::{Edge, EdgeOrientation, Neighbours, SocialGraph, UserId};

use crate::error::GraphError;

/// A weighted, typed social graph backed by per-user adjacency maps.
///
/// Neighbours are reported in edge insertion order. For undirected
/// graphs each edge is stored in both directions and every orientation
/// returns the same list.
#[derive(Clone, Debug)]
pub struct AdjacencyGraph {
    directed: bool,
    outgoing: Vec<IndexMap<UserId, Edge>>,
    incoming: Vec<IndexMap<UserId, Edge>>,
}

impl AdjacencyGraph {
    /// A graph with `user_count` isolated users.
    pub fn new(user_count: usize, directed: bool) -> Self {
        Self {
            directed,
            outgoing: vec![IndexMap::new(); user_count],
            incoming: vec![IndexMap::new(); user_count],
        }
    }

    /// Add an isolated user, returning its id.
    pub fn add_user(&mut self) -> UserId {
        self.outgoing.push(IndexMap::new());
        self.incoming.push(IndexMap::new());
        UserId(self.outgoing.len() as u32 - 1)
    }

    /// Add (or replace) the edge `from -> to`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] for out-of-range endpoints, self-loops, and
    /// weights that are negative or not finite.
    pub fn add_edge(&mut self, from: UserId, to: UserId, edge: Edge) -> Result<(), GraphError> {
        let n = self.outgoing.len();
        for endpoint in [from, to] {
            if endpoint.index() >= n {
                return Err(GraphError::DanglingEndpoint {
                    index: endpoint.0,
                    user_count: n,
                });
            }
        }
        if from == to {
            return Err(GraphError::SelfLoop { user: from.0 });
        }
        if !edge.weight.is_finite() || edge.weight < 0.0 {
            return Err(GraphError::InvalidWeight {
                weight: edge.weight,
            });
        }
        self.outgoing[from.index()].insert(to, edge);
        self.incoming[to.index()].insert(from, edge);
        if !self.directed {
            self.outgoing[to.index()].insert(from, edge);
            self.incoming[from.index()].insert(to, edge);
        }
        Ok(())
    }

    /// Number of stored directed arcs (undirected edges count twice).
    pub fn arc_count(&self) -> usize {
        self.outgoing.iter().map(IndexMap::len).sum()
    }
}

impl SocialGraph for AdjacencyGraph {
    fn user_count(&self) -> usize {
        self.outgoing.len()
    }

    fn is_directed(&self) -> bool {
        self.directed
    }

    fn neighbours(&self, user: UserId, orientation: EdgeOrientation) -> Neighbours {
        let idx = user.index();
        if idx >= self.outgoing.len() {
            return Neighbours::new();
        }
        match orientation {
            EdgeOrientation::Out => self.outgoing[idx].keys().copied().collect(),
            EdgeOrientation::In => self.incoming[idx].keys().copied().collect(),
            EdgeOrientation::Und => {
                let mut out: Neighbours = self.outgoing[idx].keys().copied().collect();
                for &v in self.incoming[idx].keys() {
                    if !self.outgoing[idx].contains_key(&v) {
                        out.push(v);
                    }
                }
                out
            }
        }
    }

    fn edge(&self, from: UserId, to: UserId) -> Option<Edge> {
        self.outgoing.get(from.index())?.get(&to).copied()
    }
}
