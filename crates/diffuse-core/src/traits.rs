//! Collaborator traits: the social graph and the static input data.
//!
//! The engine never owns graph storage or input parsing. It reads both
//! through these object-safe traits; `diffuse-graph` ships in-memory
//! implementations.

use smallvec::SmallVec;

use crate::error::DataError;
use crate::id::{PieceId, UserId};

/// Neighbour list returned by [`SocialGraph::neighbours`].
pub type Neighbours = SmallVec<[UserId; 8]>;

/// Which edges of a user are followed when collecting neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeOrientation {
    /// Edges pointing at the user (`v -> u`).
    In,
    /// Edges leaving the user (`u -> v`).
    Out,
    /// Both directions.
    Und,
}

/// How an edge entered the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Present in the original network.
    Organic,
    /// Added by a contact recommender.
    Recommended,
}

/// A weighted, typed edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// Edge weight (1.0 for unweighted networks).
    pub weight: f64,
    /// Edge provenance.
    pub kind: EdgeKind,
}

impl Edge {
    /// An organic edge with weight 1.
    pub fn organic() -> Self {
        Self {
            weight: 1.0,
            kind: EdgeKind::Organic,
        }
    }

    /// A recommended edge with weight 1.
    pub fn recommended() -> Self {
        Self {
            weight: 1.0,
            kind: EdgeKind::Recommended,
        }
    }

    /// Whether this edge was added by a recommender.
    pub fn is_recommended(&self) -> bool {
        self.kind == EdgeKind::Recommended
    }
}

/// Read-only view of the social network.
///
/// # Contract
///
/// - `neighbours(u, Out)` contains `v` iff `edge(u, v)` is `Some`.
/// - `neighbours(u, In)` contains `v` iff `edge(v, u)` is `Some`.
/// - `neighbours(u, Und)` is the duplicate-free union of both.
/// - Neighbour order is deterministic for a given graph.
///
/// For undirected graphs every edge is reported in both directions.
pub trait SocialGraph: Send + Sync {
    /// Number of users (nodes).
    fn user_count(&self) -> usize;

    /// Whether edges are directed.
    fn is_directed(&self) -> bool;

    /// Neighbours of `user` following `orientation`.
    fn neighbours(&self, user: UserId, orientation: EdgeOrientation) -> Neighbours;

    /// The edge `from -> to`, if present.
    fn edge(&self, from: UserId, to: UserId) -> Option<Edge>;

    /// The edge linking `user` with `neighbour` as seen through
    /// `orientation`.
    ///
    /// For `Und` the outgoing edge is preferred; when only the incoming
    /// one exists it is returned instead. A recommended edge in either
    /// direction wins over an organic one.
    fn edge_towards(
        &self,
        user: UserId,
        neighbour: UserId,
        orientation: EdgeOrientation,
    ) -> Option<Edge> {
        match orientation {
            EdgeOrientation::Out => self.edge(user, neighbour),
            EdgeOrientation::In => self.edge(neighbour, user),
            EdgeOrientation::Und => {
                let out = self.edge(user, neighbour);
                let inc = self.edge(neighbour, user);
                match (out, inc) {
                    (Some(o), _) if o.is_recommended() => Some(o),
                    (_, Some(i)) if i.is_recommended() => Some(i),
                    (Some(o), _) => Some(o),
                    (None, i) => i,
                }
            }
        }
    }
}

/// Static input data for a run: users, pieces, features and ground truth.
///
/// Object-safe; the engine stores it as `&dyn DiffusionData`.
pub trait DiffusionData: Send + Sync {
    /// The social graph.
    fn graph(&self) -> &dyn SocialGraph;

    /// Number of users.
    fn user_count(&self) -> usize;

    /// Number of information pieces.
    fn piece_count(&self) -> usize;

    /// External label of `user`.
    fn user_label(&self, user: UserId) -> Option<&str>;

    /// Dense index of the user labelled `label`.
    fn user_by_label(&self, label: &str) -> Option<UserId>;

    /// External label of `piece`.
    fn piece_label(&self, piece: PieceId) -> Option<&str>;

    /// Dense index of the piece labelled `label`.
    fn piece_by_label(&self, label: &str) -> Option<PieceId>;

    /// Creators of `piece` (at least one for well-formed data).
    fn creators(&self, piece: PieceId) -> &[UserId];

    /// Pieces created by `user`, in index order.
    fn own_pieces(&self, user: UserId) -> &[PieceId];

    /// Real-world creation timestamp of `piece`.
    fn piece_timestamp(&self, _piece: PieceId) -> Option<i64> {
        None
    }

    /// Values of the named user feature, as `(value, weight)` pairs.
    fn user_features(&self, _user: UserId, _feature: &str) -> &[(String, f64)] {
        &[]
    }

    /// Values of the named piece feature, as `(value, weight)` pairs.
    fn piece_features(&self, _piece: PieceId, _feature: &str) -> &[(String, f64)] {
        &[]
    }

    /// Ground truth: did `user` really re-propagate `piece`?
    fn is_real_propagated(&self, _user: UserId, _piece: PieceId) -> bool {
        false
    }

    /// Ground truth: when did `user` really re-propagate `piece`?
    fn real_propagation_timestamp(&self, _user: UserId, _piece: PieceId) -> Option<i64> {
        None
    }

    /// All distinct real-world timestamps, ascending. Empty when the data
    /// carries no timeline.
    fn timestamps(&self) -> &[i64] {
        &[]
    }

    /// Users recorded as really propagating something at `timestamp`, in
    /// ascending order without duplicates.
    fn real_propagators_at(&self, _timestamp: i64) -> &[UserId] {
        &[]
    }

    /// First timestamp strictly after `current`, or the first timestamp
    /// when `current` is `None`.
    fn next_timestamp(&self, current: Option<i64>) -> Option<i64> {
        let ts = self.timestamps();
        match current {
            None => ts.first().copied(),
            Some(t) => {
                let idx = ts.partition_point(|&x| x <= t);
                ts.get(idx).copied()
            }
        }
    }

    /// Check that `user` is a valid index.
    fn check_user(&self, user: UserId) -> Result<(), DataError> {
        if user.index() < self.user_count() {
            Ok(())
        } else {
            Err(DataError::UnknownUser {
                user,
                user_count: self.user_count(),
            })
        }
    }

    /// Check that `piece` is a valid index.
    fn check_piece(&self, piece: PieceId) -> Result<(), DataError> {
        if piece.index() < self.piece_count() {
            Ok(())
        } else {
            Err(DataError::UnknownPiece {
                piece,
                piece_count: self.piece_count(),
            })
        }
    }
}
