//! Owned, in-memory [`DiffusionData`] implementation.

use indexmap::{IndexMap, IndexSet};

use diffuse_core::{DiffusionData, Edge, PieceId, SocialGraph, UserId};

use crate::error::GraphError;
use crate::graph::AdjacencyGraph;

type FeatureTable = IndexMap<String, Vec<(String, f64)>>;

/// Static input data for a diffusion run.
///
/// Built with [`StaticData::builder`]; immutable afterwards.
#[derive(Clone, Debug)]
pub struct StaticData {
    graph: AdjacencyGraph,
    user_labels: IndexSet<String>,
    piece_labels: IndexSet<String>,
    creators: Vec<Vec<UserId>>,
    own: Vec<Vec<PieceId>>,
    piece_timestamps: Vec<Option<i64>>,
    user_features: Vec<FeatureTable>,
    piece_features: Vec<FeatureTable>,
    real: IndexMap<(UserId, PieceId), Option<i64>>,
    timestamps: Vec<i64>,
    propagators_at: IndexMap<i64, Vec<UserId>>,
}

impl StaticData {
    /// Start building a data set over a directed or undirected graph.
    pub fn builder(directed: bool) -> StaticDataBuilder {
        StaticDataBuilder {
            graph: AdjacencyGraph::new(0, directed),
            user_labels: IndexSet::new(),
            piece_labels: IndexSet::new(),
            creators: Vec::new(),
            piece_timestamps: Vec::new(),
            user_features: Vec::new(),
            piece_features: Vec::new(),
            real: IndexMap::new(),
        }
    }

    /// The concrete graph.
    pub fn adjacency(&self) -> &AdjacencyGraph {
        &self.graph
    }

    /// Number of ground-truth (user, piece) re-propagations.
    pub fn real_propagation_count(&self) -> usize {
        self.real.len()
    }
}

impl DiffusionData for StaticData {
    fn graph(&self) -> &dyn SocialGraph {
        &self.graph
    }

    fn user_count(&self) -> usize {
        self.user_labels.len()
    }

    fn piece_count(&self) -> usize {
        self.piece_labels.len()
    }

    fn user_label(&self, user: UserId) -> Option<&str> {
        self.user_labels.get_index(user.index()).map(String::as_str)
    }

    fn user_by_label(&self, label: &str) -> Option<UserId> {
        self.user_labels
            .get_index_of(label)
            .map(|i| UserId(i as u32))
    }

    fn piece_label(&self, piece: PieceId) -> Option<&str> {
        self.piece_labels.get_index(piece.index()).map(String::as_str)
    }

    fn piece_by_label(&self, label: &str) -> Option<PieceId> {
        self.piece_labels
            .get_index_of(label)
            .map(|i| PieceId(i as u32))
    }

    fn creators(&self, piece: PieceId) -> &[UserId] {
        self.creators.get(piece.index()).map_or(&[], Vec::as_slice)
    }

    fn own_pieces(&self, user: UserId) -> &[PieceId] {
        self.own.get(user.index()).map_or(&[], Vec::as_slice)
    }

    fn piece_timestamp(&self, piece: PieceId) -> Option<i64> {
        self.piece_timestamps.get(piece.index()).copied().flatten()
    }

    fn user_features(&self, user: UserId, feature: &str) -> &[(String, f64)] {
        self.user_features
            .get(user.index())
            .and_then(|t| t.get(feature))
            .map_or(&[], Vec::as_slice)
    }

    fn piece_features(&self, piece: PieceId, feature: &str) -> &[(String, f64)] {
        self.piece_features
            .get(piece.index())
            .and_then(|t| t.get(feature))
            .map_or(&[], Vec::as_slice)
    }

    fn is_real_propagated(&self, user: UserId, piece: PieceId) -> bool {
        self.real.contains_key(&(user, piece))
    }

    fn real_propagation_timestamp(&self, user: UserId, piece: PieceId) -> Option<i64> {
        self.real.get(&(user, piece)).copied().flatten()
    }

    fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    fn real_propagators_at(&self, timestamp: i64) -> &[UserId] {
        self.propagators_at
            .get(&timestamp)
            .map_or(&[], Vec::as_slice)
    }
}

// ── Builder ─────────────────────────────────────────────────────

/// Builder for [`StaticData`].
///
/// Users and pieces are addressed by label; indices are assigned in
/// registration order.
pub struct StaticDataBuilder {
    graph: AdjacencyGraph,
    user_labels: IndexSet<String>,
    piece_labels: IndexSet<String>,
    creators: Vec<Vec<UserId>>,
    piece_timestamps: Vec<Option<i64>>,
    user_features: Vec<FeatureTable>,
    piece_features: Vec<FeatureTable>,
    real: IndexMap<(UserId, PieceId), Option<i64>>,
}

impl StaticDataBuilder {
    fn user_id(&self, label: &str) -> Result<UserId, GraphError> {
        self.user_labels
            .get_index_of(label)
            .map(|i| UserId(i as u32))
            .ok_or_else(|| GraphError::UnknownLabel {
                kind: "user",
                label: label.to_string(),
            })
    }

    fn piece_id(&self, label: &str) -> Result<PieceId, GraphError> {
        self.piece_labels
            .get_index_of(label)
            .map(|i| PieceId(i as u32))
            .ok_or_else(|| GraphError::UnknownLabel {
                kind: "piece",
                label: label.to_string(),
            })
    }

    /// Register a user.
    pub fn add_user(&mut self, label: impl Into<String>) -> Result<UserId, GraphError> {
        let label = label.into();
        if self.user_labels.contains(&label) {
            return Err(GraphError::DuplicateLabel { kind: "user", label });
        }
        self.user_labels.insert(label);
        self.user_features.push(FeatureTable::new());
        Ok(self.graph.add_user())
    }

    /// Register every label in `labels` as a user.
    pub fn add_users<I, S>(&mut self, labels: I) -> Result<Vec<UserId>, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        labels.into_iter().map(|l| self.add_user(l)).collect()
    }

    /// Add the edge `from -> to` between registered users.
    pub fn add_edge(&mut self, from: &str, to: &str, edge: Edge) -> Result<(), GraphError> {
        let from = self.user_id(from)?;
        let to = self.user_id(to)?;
        self.graph.add_edge(from, to, edge)
    }

    /// Register a piece created by `creators`.
    pub fn add_piece(
        &mut self,
        label: impl Into<String>,
        creators: &[&str],
        timestamp: Option<i64>,
    ) -> Result<PieceId, GraphError> {
        let label = label.into();
        if self.piece_labels.contains(&label) {
            return Err(GraphError::DuplicateLabel {
                kind: "piece",
                label,
            });
        }
        if creators.is_empty() {
            return Err(GraphError::NoCreator { label });
        }
        let mut ids = Vec::with_capacity(creators.len());
        for c in creators {
            let id = self.user_id(c)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.piece_labels.insert(label);
        self.creators.push(ids);
        self.piece_timestamps.push(timestamp);
        self.piece_features.push(FeatureTable::new());
        Ok(PieceId(self.piece_labels.len() as u32 - 1))
    }

    /// Record that `user` really re-propagated `piece`, optionally at
    /// `timestamp`.
    pub fn add_real_propagation(
        &mut self,
        user: &str,
        piece: &str,
        timestamp: Option<i64>,
    ) -> Result<(), GraphError> {
        let user = self.user_id(user)?;
        let piece = self.piece_id(piece)?;
        self.real.insert((user, piece), timestamp);
        Ok(())
    }

    /// Append a `(value, weight)` pair to a user feature.
    pub fn add_user_feature(
        &mut self,
        user: &str,
        feature: &str,
        value: impl Into<String>,
        weight: f64,
    ) -> Result<(), GraphError> {
        let user = self.user_id(user)?;
        self.user_features[user.index()]
            .entry(feature.to_string())
            .or_default()
            .push((value.into(), weight));
        Ok(())
    }

    /// Append a `(value, weight)` pair to a piece feature.
    pub fn add_piece_feature(
        &mut self,
        piece: &str,
        feature: &str,
        value: impl Into<String>,
        weight: f64,
    ) -> Result<(), GraphError> {
        let piece = self.piece_id(piece)?;
        self.piece_features[piece.index()]
            .entry(feature.to_string())
            .or_default()
            .push((value.into(), weight));
        Ok(())
    }

    /// Finish building.
    ///
    /// Derives each user's own pieces, the sorted timeline, and the
    /// per-timestamp index of real propagators.
    pub fn build(self) -> StaticData {
        let mut own = vec![Vec::new(); self.user_labels.len()];
        for (piece, creators) in self.creators.iter().enumerate() {
            for c in creators {
                own[c.index()].push(PieceId(piece as u32));
            }
        }

        let mut timestamps: Vec<i64> = self
            .piece_timestamps
            .iter()
            .flatten()
            .copied()
            .chain(self.real.values().flatten().copied())
            .collect();
        timestamps.sort_unstable();
        timestamps.dedup();

        let mut propagators_at: IndexMap<i64, Vec<UserId>> = IndexMap::new();
        for (&(user, _), ts) in &self.real {
            if let Some(ts) = ts {
                let users = propagators_at.entry(*ts).or_default();
                if !users.contains(&user) {
                    users.push(user);
                }
            }
        }
        for users in propagators_at.values_mut() {
            users.sort_unstable();
        }

        StaticData {
            graph: self.graph,
            user_labels: self.user_labels,
            piece_labels: self.piece_labels,
            creators: self.creators,
            own,
            piece_timestamps: self.piece_timestamps,
            user_features: self.user_features,
            piece_features: self.piece_features,
            real: self.real,
            timestamps,
            propagators_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StaticData {
        let mut b = StaticData::builder(true);
        b.add_users(["alice", "bob", "carol"]).unwrap();
        b.add_edge("alice", "bob", Edge::organic()).unwrap();
        b.add_edge("bob", "carol", Edge::recommended()).unwrap();
        b.add_piece("p0", &["alice"], Some(100)).unwrap();
        b.add_piece("p1", &["bob", "carol"], None).unwrap();
        b.add_real_propagation("bob", "p0", Some(150)).unwrap();
        b.add_real_propagation("carol", "p0", Some(150)).unwrap();
        b.add_real_propagation("carol", "p1", None).unwrap();
        b.add_user_feature("alice", "topic", "sports", 0.5).unwrap();
        b.build()
    }

    #[test]
    fn labels_map_both_ways() {
        let d = sample();
        let bob = d.user_by_label("bob").unwrap();
        assert_eq!(bob, UserId(1));
        assert_eq!(d.user_label(bob), Some("bob"));
        assert_eq!(d.piece_by_label("p1"), Some(PieceId(1)));
        assert_eq!(d.piece_label(PieceId(0)), Some("p0"));
        assert_eq!(d.user_by_label("nobody"), None);
    }

    #[test]
    fn own_pieces_follow_creators() {
        let d = sample();
        assert_eq!(d.own_pieces(UserId(0)), &[PieceId(0)]);
        assert_eq!(d.own_pieces(UserId(1)), &[PieceId(1)]);
        assert_eq!(d.own_pieces(UserId(2)), &[PieceId(1)]);
        assert_eq!(d.creators(PieceId(1)), &[UserId(1), UserId(2)]);
    }

    #[test]
    fn timeline_and_ground_truth() {
        let d = sample();
        assert_eq!(d.timestamps(), &[100, 150]);
        assert_eq!(d.next_timestamp(None), Some(100));
        assert_eq!(d.next_timestamp(Some(100)), Some(150));
        assert_eq!(d.next_timestamp(Some(150)), None);
        assert_eq!(d.real_propagators_at(150), &[UserId(1), UserId(2)]);
        assert!(d.is_real_propagated(UserId(2), PieceId(1)));
        assert!(!d.is_real_propagated(UserId(0), PieceId(1)));
        assert_eq!(d.real_propagation_timestamp(UserId(1), PieceId(0)), Some(150));
    }

    #[test]
    fn features_are_looked_up_by_name() {
        let d = sample();
        assert_eq!(
            d.user_features(UserId(0), "topic"),
            &[("sports".to_string(), 0.5)]
        );
        assert!(d.user_features(UserId(1), "topic").is_empty());
        assert!(d.piece_features(PieceId(0), "topic").is_empty());
    }

    #[test]
    fn builder_rejects_inconsistent_input() {
        let mut b = StaticData::builder(false);
        b.add_user("u").unwrap();
        assert!(matches!(
            b.add_user("u"),
            Err(GraphError::DuplicateLabel { kind: "user", .. })
        ));
        assert!(matches!(
            b.add_piece("p", &[], None),
            Err(GraphError::NoCreator { .. })
        ));
        assert!(matches!(
            b.add_piece("p", &["ghost"], None),
            Err(GraphError::UnknownLabel { kind: "user", .. })
        ));
        assert!(b.add_edge("u", "ghost", Edge::organic()).is_err());
    }
}
