#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Foe decision system that routes patrolling and pursuing enemies.
//!
//! The system reacts to clock ticks, inspects read-only world views, and
//! emits [`Command::RouteFoe`] batches. The world validates every route, so
//! the system never mutates anything directly.

use std::collections::{HashMap, VecDeque};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wire_tracer_core::{Command, EdgeId, EntityId, EntityKind, Event, FoeKind, NodeId};
use wire_tracer_world::{
    query::{self, EntitySnapshot},
    World,
};

/// Ticks a tracking foe spends thinking after a sleep roll.
const SLEEP_TICKS: u32 = 60;
/// A tracking foe rolls a 1-in-6 chance of sleeping per idle check.
const SLEEP_DIE_SIDES: u32 = 6;

/// Configuration parameters required to construct the foe system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided decision seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that deterministically plans foe movement.
#[derive(Debug)]
pub struct Foes {
    rng: ChaCha8Rng,
    trackers: HashMap<EntityId, TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    route: VecDeque<EdgeId>,
    target: Option<NodeId>,
    sleep_ticks: u32,
}

impl Foes {
    /// Creates a new foe system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            trackers: HashMap::new(),
        }
    }

    /// Consumes events and read-only views to emit routing commands.
    pub fn handle(&mut self, events: &[Event], world: &World, out: &mut Vec<Command>) {
        for event in events {
            if let Event::RouteRejected { foe, .. } = event {
                if let Some(state) = self.trackers.get_mut(foe) {
                    state.route.clear();
                    state.target = None;
                }
            }
        }

        if !events
            .iter()
            .any(|event| matches!(event, Event::TickAdvanced { .. }))
        {
            return;
        }

        let player = query::player(world);
        for foe in query::entity_view(world).iter() {
            if foe.dead {
                continue;
            }
            match foe.kind {
                EntityKind::Foe(FoeKind::Simple) => self.plan_simple(foe, world, out),
                EntityKind::Foe(FoeKind::Tracking) => {
                    self.plan_tracking(foe, player.as_ref(), world, out);
                }
                EntityKind::Player => {}
            }
        }
    }

    /// Picks a random exit, nudging the pick off the arrival edge.
    ///
    /// When the draw lands on the edge the foe just arrived through, the
    /// next index (wrapping) is used instead. With a single exit the foe may
    /// still reverse; the bias is deliberately soft.
    fn plan_simple(&mut self, foe: &EntitySnapshot, world: &World, out: &mut Vec<Command>) {
        if foe.moving {
            return;
        }
        let exits = query::outgoing_edges(world, foe.current_node);
        if exits.is_empty() {
            return;
        }

        let index = self.rng.gen_range(0..exits.len());
        let mut pick = exits[index];
        if Some(pick) == foe.last_edge {
            pick = if index >= exits.len() - 1 {
                exits[0]
            } else {
                exits[index + 1]
            };
        }
        out.push(Command::RouteFoe {
            foe: foe.id,
            edge: pick,
        });
    }

    /// Pursues the player along cached shortest paths.
    ///
    /// The cached route stays valid while the player's current or target
    /// node equals the node the route was computed for, so the path is not
    /// recomputed every tick. A fresh computation never moves the foe on the
    /// same tick; consumption starts on the next idle check.
    fn plan_tracking(
        &mut self,
        foe: &EntitySnapshot,
        player: Option<&EntitySnapshot>,
        world: &World,
        out: &mut Vec<Command>,
    ) {
        let state = self.trackers.entry(foe.id).or_default();
        if state.sleep_ticks > 0 {
            state.sleep_ticks -= 1;
            return;
        }
        if foe.moving {
            return;
        }
        let Some(player) = player else {
            return;
        };

        let route_holds = state
            .target
            .is_some_and(|target| {
                player.target_node == Some(target) || player.current_node == target
            });
        if !state.route.is_empty() && route_holds {
            if let Some(edge) = state.route.pop_front() {
                out.push(Command::RouteFoe { foe: foe.id, edge });
            }
            return;
        }

        if self.rng.gen_range(0..SLEEP_DIE_SIDES) == 0 {
            state.sleep_ticks = SLEEP_TICKS;
            return;
        }

        if player.current_node != foe.current_node
            || foe.target_node != Some(player.current_node)
        {
            let pursuit = if player.moving {
                query::final_target_node(world, player.id).unwrap_or(player.current_node)
            } else {
                player.current_node
            };
            if pursuit != foe.current_node {
                state.route = query::shortest_path(world, foe.current_node, pursuit)
                    .map(VecDeque::from)
                    .unwrap_or_default();
                state.target = Some(pursuit);
            }
        }
    }
}
