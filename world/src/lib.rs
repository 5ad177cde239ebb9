#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Wire Tracer.
//!
//! The world owns the circuit graph and every entity travelling it. All
//! mutations flow through [`apply`], which executes a single [`Command`] and
//! reports what happened as [`Event`] values; adapters and systems observe
//! state exclusively through the read-only [`query`] module.

mod entities;
mod graph;
mod pathfinding;

use tracing::warn;
use wire_tracer_core::{
    Command, EdgeId, EntityId, EntityKind, Event, FoeKind, NodeId, RouteError, SpawnError,
    WELCOME_BANNER,
};

use crate::entities::Mover;
use crate::graph::Graph;

/// Pixels the player advances per tick.
const PLAYER_SPEED: i32 = 2;
/// Pixels a foe advances per tick.
const FOE_SPEED: i32 = 1;

/// Represents the authoritative Wire Tracer world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    graph: Graph,
    start_node: Option<NodeId>,
    movers: Vec<Mover>,
    next_entity_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates a new, empty world ready for level construction.
    ///
    /// Node, edge, and entity id counters are scoped to the world, so
    /// multiple worlds can coexist in one process without leaking state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            graph: Graph::new(),
            start_node: None,
            movers: Vec::new(),
            next_entity_id: 0,
            tick_index: 0,
        }
    }

    fn allocate_entity_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    fn player_index(&self) -> Option<usize> {
        self.movers
            .iter()
            .position(|mover| mover.kind == EntityKind::Player)
    }

    fn mover_index(&self, id: EntityId) -> Option<usize> {
        self.movers.iter().position(|mover| mover.id == id)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AddNode { pos, kind } => {
            let created = world.graph.create_node(pos, kind);
            out_events.push(Event::NodeAdded {
                node: created.id,
                pos: created.pos,
                kind: created.kind,
            });
        }
        Command::ConnectNodes {
            from,
            to,
            reverse_corner,
            one_way,
        } => match world.graph.connect_with_joint(from, to, reverse_corner, one_way) {
            Ok(outcome) => {
                if let Some(joint) = outcome.joint {
                    out_events.push(Event::NodeAdded {
                        node: joint.id,
                        pos: joint.pos,
                        kind: joint.kind,
                    });
                }
                for edge_id in outcome.edges {
                    if let Some(edge) = world.graph.edge(edge_id) {
                        out_events.push(Event::EdgeAdded {
                            edge: edge.id,
                            source: edge.source,
                            destination: edge.destination,
                            one_way: edge.one_way,
                            length: edge.length,
                        });
                    }
                }
            }
            Err(reason) => {
                warn!(
                    from = from.get(),
                    to = to.get(),
                    ?reason,
                    "connection rejected"
                );
                out_events.push(Event::ConnectRejected { from, to, reason });
            }
        },
        Command::RemoveNode { node } => match world.graph.remove_node(node) {
            Some(removed_edges) => {
                for edge in removed_edges {
                    out_events.push(Event::EdgeRemoved { edge });
                }
                if world.start_node == Some(node) {
                    world.start_node = None;
                }
                out_events.push(Event::NodeRemoved { node });
            }
            None => warn!(node = node.get(), "unknown node in removal request"),
        },
        Command::RemoveEdge { edge } => {
            if world.graph.remove_edge(edge) {
                out_events.push(Event::EdgeRemoved { edge });
            } else {
                warn!(edge = edge.get(), "unknown edge in removal request");
            }
        }
        Command::ReverseEdge { edge } => {
            if world.graph.reverse_edge(edge) {
                out_events.push(Event::EdgeReversed { edge });
            } else {
                warn!(edge = edge.get(), "unknown edge in reversal request");
            }
        }
        Command::ToggleEdgeOneWay { edge } => match world.graph.toggle_one_way(edge) {
            Some(one_way) => out_events.push(Event::EdgeOneWayToggled { edge, one_way }),
            None => warn!(edge = edge.get(), "unknown edge in toggle request"),
        },
        Command::ToggleNodeKind { node } => match world.graph.toggle_node_kind(node) {
            Some(kind) => out_events.push(Event::NodeKindToggled { node, kind }),
            None => warn!(node = node.get(), "unknown node in toggle request"),
        },
        Command::SetStartNode { node } => {
            if world.graph.node(node).is_some() {
                world.start_node = Some(node);
                out_events.push(Event::StartNodeSet { node });
            } else {
                warn!(node = node.get(), "unknown node in start node request");
            }
        }
        Command::SpawnPlayer { node } => {
            if world.player_index().is_some() {
                warn!("player already present, ignoring spawn request");
                out_events.push(Event::SpawnRejected {
                    node,
                    reason: SpawnError::PlayerAlreadyPresent,
                });
                return;
            }
            let Some(pos) = world.graph.node(node).map(|found| found.pos) else {
                warn!(node = node.get(), "missing start node for player");
                out_events.push(Event::SpawnRejected {
                    node,
                    reason: SpawnError::MissingNode,
                });
                return;
            };
            let entity = world.allocate_entity_id();
            world.movers.push(Mover::spawned_at(
                entity,
                EntityKind::Player,
                node,
                pos,
                PLAYER_SPEED,
            ));
            out_events.push(Event::PlayerSpawned { entity, node });
        }
        Command::SpawnFoe { kind, node } => {
            let Some(pos) = world.graph.node(node).map(|found| found.pos) else {
                warn!(node = node.get(), ?kind, "missing start node for foe");
                out_events.push(Event::SpawnRejected {
                    node,
                    reason: SpawnError::MissingNode,
                });
                return;
            };
            let entity = world.allocate_entity_id();
            world.movers.push(Mover::spawned_at(
                entity,
                EntityKind::Foe(kind),
                node,
                pos,
                FOE_SPEED,
            ));
            out_events.push(Event::FoeSpawned { entity, kind, node });
        }
        Command::SteerPlayer { direction } => {
            let World { graph, movers, .. } = world;
            let Some(player) = movers
                .iter_mut()
                .find(|mover| mover.kind == EntityKind::Player)
            else {
                return;
            };
            if player.dead || player.moving {
                return;
            }
            // A blocked direction is a normal branch: nothing happens.
            let Some(edge) = graph.edge_by_direction(player.current_node, direction) else {
                return;
            };
            if let Some(target) = entities::begin_traversal(player, graph, edge) {
                out_events.push(Event::TraversalStarted {
                    entity: player.id,
                    edge,
                    target,
                });
            }
        }
        Command::RouteFoe { foe, edge } => {
            if let Err(reason) = route_foe(world, foe, edge, out_events) {
                warn!(foe = foe.get(), edge = edge.get(), ?reason, "route rejected");
                out_events.push(Event::RouteRejected { foe, edge, reason });
            }
        }
        Command::CatchPlayer { foe } => {
            let Some(index) = world.player_index() else {
                return;
            };
            let player = &mut world.movers[index];
            if player.dead {
                return;
            }
            player.dead = true;
            out_events.push(Event::PlayerCaught { foe });
        }
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TickAdvanced {
                tick: world.tick_index,
            });
            let World {
                graph,
                movers,
                tick_index,
                ..
            } = world;
            for mover in movers.iter_mut() {
                entities::advance(mover, graph, *tick_index, out_events);
            }
        }
    }
}

fn route_foe(
    world: &mut World,
    foe: EntityId,
    edge: EdgeId,
    out_events: &mut Vec<Event>,
) -> Result<(), RouteError> {
    let index = world.mover_index(foe).ok_or(RouteError::MissingFoe)?;
    {
        let mover = &world.movers[index];
        if !matches!(mover.kind, EntityKind::Foe(_)) {
            return Err(RouteError::MissingFoe);
        }
        if mover.dead || mover.moving {
            return Err(RouteError::NotIdle);
        }
        let found = world.graph.edge(edge).ok_or(RouteError::MissingEdge)?;
        if found.source != mover.current_node && found.destination != mover.current_node {
            return Err(RouteError::NotConnected);
        }
        if !found.is_outgoing_from(mover.current_node) {
            return Err(RouteError::OneWayBlocked);
        }
    }

    let World { graph, movers, .. } = world;
    let mover = &mut movers[index];
    if let Some(target) = entities::begin_traversal(mover, graph, edge) {
        out_events.push(Event::TraversalStarted {
            entity: mover.id,
            edge,
            target,
        });
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{pathfinding, World};
    use wire_tracer_core::{Direction, EdgeId, EntityId, EntityKind, NodeId, NodeKind, Vec2i};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current tick index of the simulation clock.
    #[must_use]
    pub fn tick(world: &World) -> u64 {
        world.tick_index
    }

    /// Node the player spawns on, if a level declared one.
    #[must_use]
    pub fn start_node(world: &World) -> Option<NodeId> {
        world.start_node
    }

    /// Number of edges marked so far.
    #[must_use]
    pub fn marked_edge_count(world: &World) -> usize {
        world.graph.marked_edges()
    }

    /// Win condition: every edge of the level is marked.
    #[must_use]
    pub fn has_all_edges_marked(world: &World) -> bool {
        world.graph.has_all_edges_marked()
    }

    /// Captures a read-only view of every node in insertion order.
    #[must_use]
    pub fn node_view(world: &World) -> NodeView {
        NodeView {
            snapshots: world
                .graph
                .nodes()
                .iter()
                .map(|node| NodeSnapshot {
                    id: node.id,
                    pos: node.pos,
                    kind: node.kind,
                    marked: node.marked,
                    edges: node.edges.clone(),
                })
                .collect(),
        }
    }

    /// Captures a read-only view of every edge in insertion order.
    #[must_use]
    pub fn edge_view(world: &World) -> EdgeView {
        EdgeView {
            snapshots: world
                .graph
                .edges()
                .iter()
                .map(|edge| EdgeSnapshot {
                    id: edge.id,
                    source: edge.source,
                    destination: edge.destination,
                    one_way: edge.one_way,
                    length: edge.length,
                    marked: edge.marked,
                    marked_length: edge.marked_length,
                })
                .collect(),
        }
    }

    /// Captures a read-only view of every entity in registration order.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView {
            snapshots: world.movers.iter().map(snapshot_of).collect(),
        }
    }

    /// Snapshot of the player entity, if one was spawned.
    #[must_use]
    pub fn player(world: &World) -> Option<EntitySnapshot> {
        world
            .movers
            .iter()
            .find(|mover| mover.kind == EntityKind::Player)
            .map(snapshot_of)
    }

    /// First node whose bounding box of `margin` pixels contains the point.
    #[must_use]
    pub fn node_at(world: &World, pos: Vec2i, margin: i32) -> Option<NodeId> {
        world.graph.node_at(pos, margin)
    }

    /// First edge whose perpendicular band of `margin` pixels contains the
    /// point strictly between its endpoints.
    #[must_use]
    pub fn edge_at(world: &World, pos: Vec2i, margin: i32) -> Option<EdgeId> {
        world.graph.edge_at(pos, margin)
    }

    /// Edges usable for traversal starting at the provided node.
    ///
    /// One-way edges pointing into the node are excluded.
    #[must_use]
    pub fn outgoing_edges(world: &World, node: NodeId) -> Vec<EdgeId> {
        world.graph.outgoing_edges(node)
    }

    /// Outgoing edge leaving the node exactly in the provided direction.
    #[must_use]
    pub fn edge_by_direction(world: &World, node: NodeId, direction: Direction) -> Option<EdgeId> {
        world.graph.edge_by_direction(node, direction)
    }

    /// Square node eventually reached by following the edge through any
    /// intervening joint chain.
    #[must_use]
    pub fn next_square_node(world: &World, from: NodeId, along: EdgeId) -> Option<NodeId> {
        world.graph.next_square_node(from, along)
    }

    /// Square node a moving entity is really heading toward, resolving any
    /// joint chain in front of it. Idle entities have no final target.
    #[must_use]
    pub fn final_target_node(world: &World, entity: EntityId) -> Option<NodeId> {
        let mover = world.movers.iter().find(|mover| mover.id == entity)?;
        if !mover.moving {
            return None;
        }
        let target = mover.target_node?;
        let target_kind = world.graph.node(target)?.kind;
        if target_kind == NodeKind::Joint {
            world
                .graph
                .next_square_node(mover.current_node, mover.current_edge?)
        } else {
            Some(target)
        }
    }

    /// Cheapest edge sequence between two nodes, honoring one-way edges.
    ///
    /// Returns `None` when the goal is unreachable; an empty path means the
    /// start already is the goal.
    #[must_use]
    pub fn shortest_path(world: &World, start: NodeId, goal: NodeId) -> Option<Vec<EdgeId>> {
        pathfinding::shortest_path(&world.graph, start, goal)
    }

    fn snapshot_of(mover: &super::Mover) -> EntitySnapshot {
        EntitySnapshot {
            id: mover.id,
            kind: mover.kind,
            pos: mover.pos,
            current_node: mover.current_node,
            current_edge: mover.current_edge,
            target_node: mover.target_node,
            moving: mover.moving,
            dead: mover.dead,
            speed: mover.speed,
            last_edge: mover.last_edge,
        }
    }

    /// Read-only snapshot describing all nodes within the world.
    #[derive(Clone, Debug)]
    pub struct NodeView {
        snapshots: Vec<NodeSnapshot>,
    }

    impl NodeView {
        /// Iterator over the captured node snapshots in insertion order.
        pub fn iter(&self) -> impl Iterator<Item = &NodeSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<NodeSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single node's state used for queries.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct NodeSnapshot {
        /// Unique identifier assigned to the node.
        pub id: NodeId,
        /// Pixel position occupied by the node.
        pub pos: Vec2i,
        /// Role the node plays in the graph.
        pub kind: NodeKind,
        /// Whether every incident edge is marked (display flag).
        pub marked: bool,
        /// Incident edges in insertion order.
        pub edges: Vec<EdgeId>,
    }

    /// Read-only snapshot describing all edges within the world.
    #[derive(Clone, Debug)]
    pub struct EdgeView {
        snapshots: Vec<EdgeSnapshot>,
    }

    impl EdgeView {
        /// Iterator over the captured edge snapshots in insertion order.
        pub fn iter(&self) -> impl Iterator<Item = &EdgeSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<EdgeSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single edge's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EdgeSnapshot {
        /// Unique identifier assigned to the edge.
        pub id: EdgeId,
        /// Node the edge departs from.
        pub source: NodeId,
        /// Node the edge arrives at.
        pub destination: NodeId,
        /// Whether traversal is restricted to the recorded direction.
        pub one_way: bool,
        /// Manhattan length of the edge along its single axis.
        pub length: u32,
        /// Whether the edge has been marked by the player.
        pub marked: bool,
        /// Partial traversal progress accumulated for presentation.
        pub marked_length: u32,
    }

    /// Read-only snapshot describing all entities within the world.
    #[derive(Clone, Debug)]
    pub struct EntityView {
        snapshots: Vec<EntitySnapshot>,
    }

    impl EntityView {
        /// Iterator over the captured entity snapshots in registration order.
        pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<EntitySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single entity's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EntitySnapshot {
        /// Unique identifier assigned to the entity.
        pub id: EntityId,
        /// Role the entity plays in the simulation.
        pub kind: EntityKind,
        /// Continuous pixel position, integer-aligned at rest.
        pub pos: Vec2i,
        /// Node the entity rests on or most recently departed.
        pub current_node: NodeId,
        /// Edge currently being traversed, if any.
        pub current_edge: Option<EdgeId>,
        /// Node the entity is heading toward, if any.
        pub target_node: Option<NodeId>,
        /// Whether the entity is mid-traversal.
        pub moving: bool,
        /// Whether the entity has been removed from play.
        pub dead: bool,
        /// Pixels the entity advances per tick.
        pub speed: i32,
        /// Most recently completed edge.
        pub last_edge: Option<EdgeId>,
    }
}
