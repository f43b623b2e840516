//! Declarative simulation configuration, validation, and error types.
//!
//! Every policy family has a spec enum tagged by `name`, with the
//! policy's parameters alongside the tag:
//!
//! ```json
//! {
//!   "seed": 7,
//!   "protocol": {
//!     "selection":   { "name": "count", "own": 1, "received": "all" },
//!     "propagation": { "name": "push_pull_gossip", "wait_time": 2 },
//!     "sight":       { "name": "all" },
//!     "expiration":  { "name": "timed", "max_age": 3 },
//!     "update":      { "name": "older" }
//!   },
//!   "stop": { "name": "no_progress", "patience": 2 }
//! }
//! ```
//!
//! [`validate()`](SimulationConfig::validate) checks every parameter before
//! anything is built, so configuration errors surface before a simulator
//! touches any data. Unknown keys are rejected at every level. Stochastic policies without an explicit `seed` get one
//! derived from the master seed and their family.

use diffuse_core::{EdgeOrientation, NewestUpdate, NoReentryUpdate, OlderUpdate, UpdateMechanism};
use diffuse_policy::{
    check_probability, derive_seed, Count, ExpirationMechanism, PolicyError,
    PropagationMechanism, SelectionMechanism, SightMechanism,
};
use diffuse_policies::{
    AllNeighbours, AllNotPropagatedExpiration, AllNotRealPropagatedExpiration, AllSight,
    CascadeProbability, CountSelection, CountSight, ExponentialDecayExpiration, Gossip,
    IndependentCascadeSelection, InfiniteExpiration, NotDiscardedSight,
    OrganicSight, PureRecommenderGossip, PureRecommenderSelection, RealPropagatedSelection,
    RecommendedSight, RecommenderGossip, RecommenderSelection, TimedExpiration,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::Protocol;
use crate::simulator::Simulator;
use crate::stop::{AnyOf, MaxIterations, MaxTimestamp, Never, NoProgress, StopCondition, TotalPropagated};

// ── ConfigError ─────────────────────────────────────────────────

/// Errors detected while parsing, validating or building a configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A parameter is out of range.
    #[error("{family} '{name}': {reason}")]
    Invalid {
        /// Policy family, or `stop`.
        family: &'static str,
        /// Spec name.
        name: &'static str,
        /// What is wrong.
        reason: String,
    },
    /// A policy constructor rejected its parameters.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// `any_of` with no inner condition would never stop.
    #[error("stop condition 'any_of' needs at least one condition")]
    EmptyAnyOf,
    /// The input is not valid configuration JSON.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

fn invalid(family: &'static str, name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        family,
        name,
        reason: reason.into(),
    }
}

// ── Parameter types ─────────────────────────────────────────────

/// Edge orientation as written in configuration files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationSpec {
    /// Incoming edges.
    In,
    /// Outgoing edges.
    #[default]
    Out,
    /// Both directions.
    Und,
}

impl From<OrientationSpec> for EdgeOrientation {
    fn from(spec: OrientationSpec) -> Self {
        match spec {
            OrientationSpec::In => Self::In,
            OrientationSpec::Out => Self::Out,
            OrientationSpec::Und => Self::Und,
        }
    }
}

/// Keyword form of a [`CountSpec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountKeyword {
    /// Take the whole pool.
    All,
    /// Take nothing.
    None,
}

/// A pool count: `"all"`, `"none"` or a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountSpec {
    /// `"all"` or `"none"`.
    Keyword(CountKeyword),
    /// Up to this many elements.
    Exactly(usize),
}

impl From<CountSpec> for Count {
    fn from(spec: CountSpec) -> Self {
        match spec {
            CountSpec::Keyword(CountKeyword::All) => Count::All,
            CountSpec::Keyword(CountKeyword::None) => Count::None,
            CountSpec::Exactly(n) => Count::Exactly(n),
        }
    }
}

fn one() -> CountSpec {
    CountSpec::Exactly(1)
}

fn all() -> CountSpec {
    CountSpec::Keyword(CountKeyword::All)
}

fn none() -> CountSpec {
    CountSpec::Keyword(CountKeyword::None)
}

fn patience_one() -> u32 {
    1
}

fn seed_for(explicit: Option<u64>, master: u64, family: &str) -> u64 {
    explicit.unwrap_or_else(|| derive_seed(master, family))
}

// ── SelectionSpec ───────────────────────────────────────────────

/// Configuration of a selection policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
pub enum SelectionSpec {
    /// [`CountSelection`].
    Count {
        /// Own pieces per iteration.
        #[serde(default = "one")]
        own: CountSpec,
        /// Seen pieces per iteration.
        #[serde(default = "all")]
        received: CountSpec,
        /// Already propagated pieces per iteration.
        #[serde(default = "none")]
        repropagate: CountSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`CountSelection::epidemic`].
    Epidemic,
    /// [`RealPropagatedSelection`].
    RealPropagated {
        /// Own pieces per iteration.
        #[serde(default = "one")]
        own: CountSpec,
        /// Seen, really propagated pieces per iteration.
        #[serde(default = "all")]
        received: CountSpec,
        /// Already propagated pieces per iteration.
        #[serde(default = "none")]
        repropagate: CountSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`RecommenderSelection`].
    Recommender {
        /// Own pieces per iteration.
        #[serde(default = "one")]
        own: CountSpec,
        /// Seen pieces per iteration.
        #[serde(default = "all")]
        received: CountSpec,
        /// Already propagated pieces per iteration.
        #[serde(default = "none")]
        repropagate: CountSpec,
        /// Chance of drawing from recommended pieces first.
        recommended_probability: f64,
        /// Orientation of the edge towards a piece's origin.
        #[serde(default)]
        edge_orientation: OrientationSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`PureRecommenderSelection`].
    PureRecommender {
        /// Own pieces per iteration.
        #[serde(default = "one")]
        own: CountSpec,
        /// Seen pieces received over recommended edges per iteration.
        #[serde(default = "all")]
        received: CountSpec,
        /// Already propagated pieces per iteration.
        #[serde(default = "none")]
        repropagate: CountSpec,
        /// Orientation of the edge towards a piece's origin.
        #[serde(default)]
        edge_orientation: OrientationSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`IndependentCascadeSelection`].
    ///
    /// A fixed `probability` wins; without one the edge weight towards the
    /// piece's origin is used.
    IndependentCascade {
        /// Fixed activation probability.
        #[serde(default)]
        probability: Option<f64>,
        /// Orientation of the weighted edge.
        #[serde(default)]
        edge_orientation: Option<OrientationSpec>,
        /// Own pieces per iteration.
        #[serde(default = "one")]
        own: CountSpec,
        /// Already propagated pieces per iteration.
        #[serde(default = "none")]
        repropagate: CountSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl SelectionSpec {
    /// Name of the configured policy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Count { .. } => "count",
            Self::Epidemic => "epidemic",
            Self::RealPropagated { .. } => "real_propagated",
            Self::Recommender { .. } => "recommender",
            Self::PureRecommender { .. } => "pure_recommender",
            Self::IndependentCascade { .. } => "independent_cascade",
        }
    }

    /// Check parameters without building.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Recommender {
                recommended_probability,
                ..
            } => check_probability(self.name(), "recommended_probability", *recommended_probability)?,
            Self::IndependentCascade {
                probability: Some(p),
                edge_orientation,
                ..
            } => {
                if edge_orientation.is_some() {
                    return Err(invalid(
                        "selection",
                        self.name(),
                        "give either a fixed probability or an edge orientation",
                    ));
                }
                check_probability(self.name(), "probability", *p)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Build the policy.
    pub fn build(&self, master_seed: u64) -> Result<Box<dyn SelectionMechanism>, ConfigError> {
        self.validate()?;
        let policy: Box<dyn SelectionMechanism> = match *self {
            Self::Count {
                own,
                received,
                repropagate,
                seed,
            } => Box::new(
                CountSelection::builder()
                    .own(own.into())
                    .received(received.into())
                    .repropagate(repropagate.into())
                    .seed(seed_for(seed, master_seed, "selection"))
                    .build(),
            ),
            Self::Epidemic => Box::new(CountSelection::epidemic()),
            Self::RealPropagated {
                own,
                received,
                repropagate,
                seed,
            } => Box::new(RealPropagatedSelection::new(
                own.into(),
                received.into(),
                repropagate.into(),
                seed_for(seed, master_seed, "selection"),
            )),
            Self::Recommender {
                own,
                received,
                repropagate,
                recommended_probability,
                edge_orientation,
                seed,
            } => Box::new(RecommenderSelection::new(
                own.into(),
                received.into(),
                repropagate.into(),
                recommended_probability,
                edge_orientation.into(),
                seed_for(seed, master_seed, "selection"),
            )?),
            Self::PureRecommender {
                own,
                received,
                repropagate,
                edge_orientation,
                seed,
            } => Box::new(PureRecommenderSelection::new(
                own.into(),
                received.into(),
                repropagate.into(),
                edge_orientation.into(),
                seed_for(seed, master_seed, "selection"),
            )),
            Self::IndependentCascade {
                probability,
                edge_orientation,
                own,
                repropagate,
                seed,
            } => {
                let probability = match probability {
                    Some(p) => CascadeProbability::Fixed(p),
                    None => CascadeProbability::EdgeWeight(
                        edge_orientation.unwrap_or_default().into(),
                    ),
                };
                Box::new(IndependentCascadeSelection::new(
                    probability,
                    own.into(),
                    repropagate.into(),
                    seed_for(seed, master_seed, "selection"),
                )?)
            }
        };
        Ok(policy)
    }
}

// ── PropagationSpec ─────────────────────────────────────────────

/// Configuration of a propagation policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
pub enum PropagationSpec {
    /// [`AllNeighbours`].
    AllNeighbours {
        /// Which neighbours count.
        #[serde(default)]
        edge_orientation: OrientationSpec,
    },
    /// [`Gossip::push_pull`].
    PushPullGossip {
        /// Revisit window length in iterations.
        #[serde(default)]
        wait_time: usize,
        /// Which neighbours count.
        #[serde(default)]
        edge_orientation: OrientationSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`Gossip::push`].
    PushGossip {
        /// Revisit window length in iterations.
        #[serde(default)]
        wait_time: usize,
        /// Which neighbours count.
        #[serde(default)]
        edge_orientation: OrientationSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`Gossip::pull`].
    PullGossip {
        /// Revisit window length in iterations.
        #[serde(default)]
        wait_time: usize,
        /// Which neighbours count.
        #[serde(default)]
        edge_orientation: OrientationSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`RecommenderGossip`].
    RecommenderGossip {
        /// Chance of picking a partner among recommended neighbours.
        recommended_probability: f64,
        /// Revisit window length in iterations.
        #[serde(default)]
        wait_time: usize,
        /// Which neighbours count.
        #[serde(default)]
        edge_orientation: OrientationSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`PureRecommenderGossip`].
    PureRecommenderGossip {
        /// Revisit window length in iterations.
        #[serde(default)]
        wait_time: usize,
        /// Which neighbours count.
        #[serde(default)]
        edge_orientation: OrientationSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl PropagationSpec {
    /// Name of the configured policy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllNeighbours { .. } => "all_neighbours",
            Self::PushPullGossip { .. } => "push_pull_gossip",
            Self::PushGossip { .. } => "push_gossip",
            Self::PullGossip { .. } => "pull_gossip",
            Self::RecommenderGossip { .. } => "recommender_gossip",
            Self::PureRecommenderGossip { .. } => "pure_recommender_gossip",
        }
    }

    /// Check parameters without building.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Self::RecommenderGossip {
            recommended_probability,
            ..
        } = self
        {
            check_probability(self.name(), "recommended_probability", *recommended_probability)?;
        }
        Ok(())
    }

    /// Build the policy.
    pub fn build(&self, master_seed: u64) -> Result<Box<dyn PropagationMechanism>, ConfigError> {
        self.validate()?;
        let policy: Box<dyn PropagationMechanism> = match *self {
            Self::AllNeighbours { edge_orientation } => {
                Box::new(AllNeighbours::new(edge_orientation.into()))
            }
            Self::PushPullGossip {
                wait_time,
                edge_orientation,
                seed,
            } => Box::new(Gossip::push_pull(
                wait_time,
                edge_orientation.into(),
                seed_for(seed, master_seed, "propagation"),
            )),
            Self::PushGossip {
                wait_time,
                edge_orientation,
                seed,
            } => Box::new(Gossip::push(
                wait_time,
                edge_orientation.into(),
                seed_for(seed, master_seed, "propagation"),
            )),
            Self::PullGossip {
                wait_time,
                edge_orientation,
                seed,
            } => Box::new(Gossip::pull(
                wait_time,
                edge_orientation.into(),
                seed_for(seed, master_seed, "propagation"),
            )),
            Self::RecommenderGossip {
                recommended_probability,
                wait_time,
                edge_orientation,
                seed,
            } => Box::new(RecommenderGossip::new(
                recommended_probability,
                wait_time,
                edge_orientation.into(),
                seed_for(seed, master_seed, "propagation"),
            )?),
            Self::PureRecommenderGossip {
                wait_time,
                edge_orientation,
                seed,
            } => Box::new(PureRecommenderGossip::new(
                wait_time,
                edge_orientation.into(),
                seed_for(seed, master_seed, "propagation"),
            )),
        };
        Ok(policy)
    }
}

// ── SightSpec ───────────────────────────────────────────────────

/// Configuration of a sight policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
pub enum SightSpec {
    /// [`AllSight`].
    All,
    /// [`OrganicSight`].
    Organic {
        /// Orientation of the edge towards the sender.
        #[serde(default)]
        edge_orientation: OrientationSpec,
    },
    /// [`CountSight`].
    Count {
        /// Inbox entries noticed per iteration.
        #[serde(default = "all")]
        count: CountSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`RecommendedSight`].
    Recommended {
        /// Chance of noticing a piece sent over a recommended edge.
        recommended_probability: f64,
        /// Chance of noticing a piece sent over an organic edge.
        organic_probability: f64,
        /// Orientation of the edge towards the sender.
        #[serde(default)]
        edge_orientation: OrientationSpec,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`NotDiscardedSight`].
    NotDiscarded,
}

impl SightSpec {
    /// Name of the configured policy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Organic { .. } => "organic",
            Self::Count { .. } => "count",
            Self::Recommended { .. } => "recommended",
            Self::NotDiscarded => "not_discarded",
        }
    }

    /// Check parameters without building.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Self::Recommended {
            recommended_probability,
            organic_probability,
            ..
        } = self
        {
            check_probability(self.name(), "recommended_probability", *recommended_probability)?;
            check_probability(self.name(), "organic_probability", *organic_probability)?;
        }
        Ok(())
    }

    /// Build the policy.
    pub fn build(&self, master_seed: u64) -> Result<Box<dyn SightMechanism>, ConfigError> {
        self.validate()?;
        let policy: Box<dyn SightMechanism> = match *self {
            Self::All => Box::new(AllSight),
            Self::Organic { edge_orientation } => {
                Box::new(OrganicSight::new(edge_orientation.into()))
            }
            Self::Count { count, seed } => Box::new(CountSight::new(
                count.into(),
                seed_for(seed, master_seed, "sight"),
            )),
            Self::Recommended {
                recommended_probability,
                organic_probability,
                edge_orientation,
                seed,
            } => Box::new(RecommendedSight::new(
                recommended_probability,
                organic_probability,
                edge_orientation.into(),
                seed_for(seed, master_seed, "sight"),
            )?),
            Self::NotDiscarded => Box::new(NotDiscardedSight),
        };
        Ok(policy)
    }
}

// ── ExpirationSpec ──────────────────────────────────────────────

/// Configuration of an expiration policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
pub enum ExpirationSpec {
    /// [`InfiniteExpiration`].
    Infinite,
    /// [`AllNotPropagatedExpiration`].
    AllNotPropagated,
    /// [`TimedExpiration`].
    Timed {
        /// Iterations a seen piece survives.
        max_age: u32,
    },
    /// [`ExponentialDecayExpiration`].
    ExponentialDecay {
        /// Age, in iterations, at which half the pieces have expired.
        half_life: f64,
        /// Explicit generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// [`AllNotRealPropagatedExpiration`].
    AllNotRealPropagated {
        /// Keep a really propagated piece only until its real timestamp.
        #[serde(default)]
        timestamp_cutoff: bool,
    },
}

impl ExpirationSpec {
    /// Name of the configured policy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Infinite => "infinite",
            Self::AllNotPropagated => "all_not_propagated",
            Self::Timed { .. } => "timed",
            Self::ExponentialDecay { .. } => "exponential_decay",
            Self::AllNotRealPropagated { .. } => "all_not_real_propagated",
        }
    }

    /// Check parameters without building.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Timed { max_age: 0 } => {
                Err(invalid("expiration", self.name(), "max_age must be at least 1"))
            }
            Self::ExponentialDecay { half_life, .. }
                if !(half_life.is_finite() && half_life > 0.0) =>
            {
                Err(invalid(
                    "expiration",
                    self.name(),
                    format!("half_life must be finite and positive, got {half_life}"),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Build the policy.
    pub fn build(&self, master_seed: u64) -> Result<Box<dyn ExpirationMechanism>, ConfigError> {
        self.validate()?;
        let policy: Box<dyn ExpirationMechanism> = match *self {
            Self::Infinite => Box::new(InfiniteExpiration),
            Self::AllNotPropagated => Box::new(AllNotPropagatedExpiration),
            Self::Timed { max_age } => Box::new(TimedExpiration::new(max_age)?),
            Self::ExponentialDecay { half_life, seed } => Box::new(
                ExponentialDecayExpiration::new(half_life, seed_for(seed, master_seed, "expiration"))?,
            ),
            Self::AllNotRealPropagated { timestamp_cutoff } => {
                Box::new(AllNotRealPropagatedExpiration::new(timestamp_cutoff))
            }
        };
        Ok(policy)
    }
}

// ── StopSpec ────────────────────────────────────────────────────

/// Configuration of a stop condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
pub enum StopSpec {
    /// [`MaxIterations`].
    MaxIterations {
        /// Last iteration number to execute.
        iterations: u32,
    },
    /// [`NoProgress`].
    NoProgress {
        /// Idle iterations in a row before stopping.
        #[serde(default = "patience_one")]
        patience: u32,
    },
    /// [`MaxTimestamp`].
    MaxTimestamp {
        /// Latest timestamp to simulate.
        timestamp: i64,
    },
    /// [`TotalPropagated`].
    TotalPropagated {
        /// Propagated (user, piece) pairs to reach.
        count: usize,
    },
    /// [`AnyOf`].
    AnyOf {
        /// Inner conditions.
        conditions: Vec<StopSpec>,
    },
    /// [`Never`].
    Never,
}

impl StopSpec {
    /// Name of the configured condition.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MaxIterations { .. } => "max_iterations",
            Self::NoProgress { .. } => "no_progress",
            Self::MaxTimestamp { .. } => "max_timestamp",
            Self::TotalPropagated { .. } => "total_propagated",
            Self::AnyOf { .. } => "any_of",
            Self::Never => "never",
        }
    }

    /// Check parameters without building.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::MaxIterations { iterations: 0 } => {
                Err(invalid("stop", self.name(), "iterations must be at least 1"))
            }
            Self::NoProgress { patience: 0 } => {
                Err(invalid("stop", self.name(), "patience must be at least 1"))
            }
            Self::AnyOf { conditions } if conditions.is_empty() => Err(ConfigError::EmptyAnyOf),
            Self::AnyOf { conditions } => conditions.iter().try_for_each(StopSpec::validate),
            _ => Ok(()),
        }
    }

    /// Build the condition.
    pub fn build(&self) -> Result<Box<dyn StopCondition>, ConfigError> {
        self.validate()?;
        let condition: Box<dyn StopCondition> = match self {
            Self::MaxIterations { iterations } => Box::new(MaxIterations(*iterations)),
            Self::NoProgress { patience } => Box::new(NoProgress::new(*patience)),
            Self::MaxTimestamp { timestamp } => Box::new(MaxTimestamp(*timestamp)),
            Self::TotalPropagated { count } => Box::new(TotalPropagated(*count)),
            Self::AnyOf { conditions } => Box::new(AnyOf(
                conditions
                    .iter()
                    .map(StopSpec::build)
                    .collect::<Result<_, _>>()?,
            )),
            Self::Never => Box::new(Never),
        };
        Ok(condition)
    }
}

// ── UpdateSpec ──────────────────────────────────────────────────

/// Configuration of the update rule for re-arrivals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
pub enum UpdateSpec {
    /// [`OlderUpdate`].
    #[default]
    Older,
    /// [`NewestUpdate`].
    Newest,
    /// [`NoReentryUpdate`].
    NoReentry,
}

impl UpdateSpec {
    /// Name of the configured rule.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Older => "older",
            Self::Newest => "newest",
            Self::NoReentry => "no_reentry",
        }
    }

    /// Build the rule.
    pub fn build(&self) -> Box<dyn UpdateMechanism> {
        match self {
            Self::Older => Box::new(OlderUpdate),
            Self::Newest => Box::new(NewestUpdate),
            Self::NoReentry => Box::new(NoReentryUpdate),
        }
    }
}

// ── ProtocolConfig / SimulationConfig ───────────────────────────

/// One spec per policy family, plus the update rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Selection policy.
    pub selection: SelectionSpec,
    /// Propagation policy.
    pub propagation: PropagationSpec,
    /// Sight policy.
    pub sight: SightSpec,
    /// Expiration policy.
    pub expiration: ExpirationSpec,
    /// Update rule. Default: `older`.
    #[serde(default)]
    pub update: UpdateSpec,
}

impl ProtocolConfig {
    /// Check every family.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selection.validate()?;
        self.propagation.validate()?;
        self.sight.validate()?;
        self.expiration.validate()
    }

    /// Build a [`Protocol`], seeding stochastic policies from `master_seed`.
    pub fn build(&self, master_seed: u64) -> Result<Protocol, ConfigError> {
        self.validate()?;
        Ok(Protocol::new(
            self.selection.build(master_seed)?,
            self.propagation.build(master_seed)?,
            self.sight.build(master_seed)?,
            self.expiration.build(master_seed)?,
        )
        .with_update(self.update.build()))
    }
}

/// A complete, reproducible simulation setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// The four policies and the update rule.
    pub protocol: ProtocolConfig,
    /// When to stop.
    pub stop: StopSpec,
    /// Master seed. Default: 0.
    #[serde(default)]
    pub seed: u64,
}

impl SimulationConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed JSON, unknown policy names or
    /// unknown keys, or any validation error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.protocol.validate()?;
        self.stop.validate()
    }

    /// Build the protocol and stop condition.
    pub fn build(&self) -> Result<(Protocol, Box<dyn StopCondition>), ConfigError> {
        let protocol = self.protocol.build(self.seed)?;
        let stop = self.stop.build()?;
        Ok((protocol, stop))
    }

    /// Build an uninitialized [`Simulator`].
    pub fn simulator<'d>(&self) -> Result<Simulator<'d>, ConfigError> {
        let (protocol, stop) = self.build()?;
        Ok(Simulator::new(protocol, stop))
    }
}
