//! Benchmark networks and configurations for the Diffuse engine.
//!
//! - [`scale_free_network`]: preferential-attachment follower graph
//! - [`flood_profile`]: deterministic flooding, every seen piece forwarded
//! - [`gossip_profile`]: push-pull gossip with count-limited sight

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use diffuse_core::Edge;
use diffuse_engine::{
    CountKeyword, CountSpec, ExpirationSpec, OrientationSpec, PropagationSpec, ProtocolConfig,
    SelectionSpec, SightSpec, SimulationConfig, StopSpec, UpdateSpec,
};
use diffuse_graph::{GraphError, StaticData};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Build a directed follower network of `users` users.
///
/// Each new user follows `links` earlier users, picked with probability
/// proportional to their current follower count plus one. One edge in
/// ten is recommended. Every user owns one piece.
pub fn scale_free_network(users: usize, links: usize, seed: u64) -> Result<StaticData, GraphError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = StaticData::builder(true);
    let labels: Vec<String> = (0..users).map(|i| format!("u{i}")).collect();
    b.add_users(labels.iter().cloned())?;

    // One entry per follower plus one per user: sampling an entry is
    // preferential attachment.
    let mut urn: Vec<usize> = Vec::with_capacity(users * (links + 1));
    for new in 0..users {
        let mut followed = Vec::with_capacity(links);
        if new > 0 {
            for _ in 0..links.min(new) {
                let target = urn[rng.gen_range(0..urn.len())];
                if !followed.contains(&target) {
                    followed.push(target);
                }
            }
        }
        for &target in &followed {
            let edge = if rng.gen_range(0..10) == 0 {
                Edge::recommended()
            } else {
                Edge::organic()
            };
            // Followers receive from the followed user.
            b.add_edge(&labels[target], &labels[new], edge)?;
            urn.push(target);
        }
        urn.push(new);
    }

    for (i, label) in labels.iter().enumerate() {
        b.add_piece(format!("p{i}"), &[label.as_str()], None)?;
    }
    Ok(b.build())
}

/// Flooding: every user forwards its own piece and everything it has
/// seen to all out-neighbours, sees its whole inbox and never forgets.
pub fn flood_profile(seed: u64, iterations: u32) -> SimulationConfig {
    SimulationConfig {
        protocol: ProtocolConfig {
            selection: SelectionSpec::Count {
                own: CountSpec::Exactly(1),
                received: CountSpec::Keyword(CountKeyword::All),
                repropagate: CountSpec::Keyword(CountKeyword::None),
                seed: None,
            },
            propagation: PropagationSpec::AllNeighbours {
                edge_orientation: OrientationSpec::Out,
            },
            sight: SightSpec::All,
            expiration: ExpirationSpec::Infinite,
            update: UpdateSpec::Older,
        },
        stop: StopSpec::MaxIterations { iterations },
        seed,
    }
}

/// Push-pull gossip with a revisit window, two inbox entries noticed per
/// iteration, exponential forgetting and newest-copy updates.
pub fn gossip_profile(seed: u64, iterations: u32) -> SimulationConfig {
    SimulationConfig {
        protocol: ProtocolConfig {
            selection: SelectionSpec::Count {
                own: CountSpec::Exactly(1),
                received: CountSpec::Exactly(2),
                repropagate: CountSpec::Exactly(1),
                seed: None,
            },
            propagation: PropagationSpec::PushPullGossip {
                wait_time: 3,
                edge_orientation: OrientationSpec::Und,
                seed: None,
            },
            sight: SightSpec::Count {
                count: CountSpec::Exactly(2),
                seed: None,
            },
            expiration: ExpirationSpec::ExponentialDecay {
                half_life: 4.0,
                seed: None,
            },
            update: UpdateSpec::Newest,
        },
        stop: StopSpec::MaxIterations { iterations },
        seed,
    }
}
