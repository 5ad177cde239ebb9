#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wire Tracer engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Wire Tracer.";

/// Integer 2D vector used for pixel positions and movement deltas.
///
/// The vertical axis grows downward, matching screen coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Vec2i {
    x: i32,
    y: i32,
}

impl Vec2i {
    /// The zero vector.
    pub const ZERO: Vec2i = Vec2i::new(0, 0);

    /// Creates a new vector from explicit components.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the vector.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component of the vector.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Vector pointing from `self` toward `other`.
    #[must_use]
    pub const fn offset_to(self, other: Vec2i) -> Vec2i {
        Vec2i::new(other.x - self.x, other.y - self.y)
    }

    /// Translates the vector by the provided offset.
    #[must_use]
    pub const fn translated(self, offset: Vec2i) -> Vec2i {
        Vec2i::new(self.x + offset.x, self.y + offset.y)
    }

    /// Axis-aligned unit vector of the dominant component.
    ///
    /// The horizontal axis takes priority when both components are non-zero;
    /// the zero vector maps to itself.
    #[must_use]
    pub const fn unit(self) -> Vec2i {
        if self.x != 0 {
            Vec2i::new(if self.x > 0 { 1 } else { -1 }, 0)
        } else if self.y != 0 {
            Vec2i::new(0, if self.y > 0 { 1 } else { -1 })
        } else {
            Vec2i::ZERO
        }
    }

    /// Scales both components by the provided factor.
    #[must_use]
    pub const fn scaled(self, factor: i32) -> Vec2i {
        Vec2i::new(self.x * factor, self.y * factor)
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: Vec2i) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Reports whether both components are zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Reports whether two positions share a horizontal or vertical axis.
    #[must_use]
    pub const fn shares_axis_with(self, other: Vec2i) -> bool {
        self.x == other.x || self.y == other.y
    }
}

/// Cardinal steering directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing vertical coordinates.
    Up,
    /// Movement toward increasing vertical coordinates.
    Down,
    /// Movement toward decreasing horizontal coordinates.
    Left,
    /// Movement toward increasing horizontal coordinates.
    Right,
}

impl Direction {
    /// Unit vector corresponding to the direction.
    #[must_use]
    pub const fn unit_vector(self) -> Vec2i {
        match self {
            Self::Up => Vec2i::new(0, -1),
            Self::Down => Vec2i::new(0, 1),
            Self::Left => Vec2i::new(-1, 0),
            Self::Right => Vec2i::new(1, 0),
        }
    }
}

/// Unique identifier assigned to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new node identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Creates a new edge identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Role a node plays within the circuit graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A visible waypoint the player can rest on.
    Square,
    /// A synthetic two-edge bend point, transparent to movement and paths.
    Joint,
}

/// Behavior assigned to a foe entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoeKind {
    /// Wanders the graph with a mild anti-backtracking bias.
    Simple,
    /// Pursues the player along recomputed shortest paths.
    Tracking,
}

/// Closed set of entity roles participating in the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// The player-controlled tracer.
    Player,
    /// A patrolling or pursuing enemy.
    Foe(FoeKind),
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests creation of a node at the provided position.
    AddNode {
        /// Pixel position of the requested node.
        pos: Vec2i,
        /// Role the node should play in the graph.
        kind: NodeKind,
    },
    /// Requests a connection between two nodes, synthesizing a joint when the
    /// nodes do not share an axis.
    ConnectNodes {
        /// Node the connection departs from.
        from: NodeId,
        /// Node the connection arrives at.
        to: NodeId,
        /// Selects the alternate corner (and source order when aligned).
        reverse_corner: bool,
        /// Restricts traversal to the source-to-destination direction.
        one_way: bool,
    },
    /// Requests removal of a node and every edge incident to it.
    RemoveNode {
        /// Identifier of the node targeted for removal.
        node: NodeId,
    },
    /// Requests removal of a single edge.
    RemoveEdge {
        /// Identifier of the edge targeted for removal.
        edge: EdgeId,
    },
    /// Swaps an edge's source and destination.
    ReverseEdge {
        /// Identifier of the edge to reverse.
        edge: EdgeId,
    },
    /// Flips an edge's one-way restriction.
    ToggleEdgeOneWay {
        /// Identifier of the edge to toggle.
        edge: EdgeId,
    },
    /// Flips a node between the square and joint roles.
    ToggleNodeKind {
        /// Identifier of the node to toggle.
        node: NodeId,
    },
    /// Declares the node the player spawns on.
    SetStartNode {
        /// Identifier of the designated start node.
        node: NodeId,
    },
    /// Spawns the player entity at the provided node.
    SpawnPlayer {
        /// Node the player should rest on initially.
        node: NodeId,
    },
    /// Spawns a foe entity at the provided node.
    SpawnFoe {
        /// Behavior the foe should follow.
        kind: FoeKind,
        /// Node the foe should rest on initially.
        node: NodeId,
    },
    /// Requests that the idle player begin traversal in a direction.
    SteerPlayer {
        /// Cardinal direction of the requested move.
        direction: Direction,
    },
    /// Requests that an idle foe begin traversal along an outgoing edge.
    RouteFoe {
        /// Identifier of the foe attempting to move.
        foe: EntityId,
        /// Edge the foe should travel along.
        edge: EdgeId,
    },
    /// Reports that a foe caught the player.
    CatchPlayer {
        /// Identifier of the foe credited with the capture.
        foe: EntityId,
    },
    /// Advances the simulation clock by one fixed step.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a node exists at the requested position.
    ///
    /// A request for an occupied position reports the existing node's
    /// identifier and actual kind; node count does not grow.
    NodeAdded {
        /// Identifier of the created or pre-existing node.
        node: NodeId,
        /// Pixel position occupied by the node.
        pos: Vec2i,
        /// Role the node plays in the graph.
        kind: NodeKind,
    },
    /// Confirms that a node and its incident edges were removed.
    NodeRemoved {
        /// Identifier of the removed node.
        node: NodeId,
    },
    /// Confirms that a node switched between the square and joint roles.
    NodeKindToggled {
        /// Identifier of the toggled node.
        node: NodeId,
        /// Role the node plays after the toggle.
        kind: NodeKind,
    },
    /// Confirms that an edge was created between two nodes.
    EdgeAdded {
        /// Identifier assigned to the edge.
        edge: EdgeId,
        /// Node the edge departs from.
        source: NodeId,
        /// Node the edge arrives at.
        destination: NodeId,
        /// Whether traversal is restricted to the recorded direction.
        one_way: bool,
        /// Manhattan length of the edge along its single axis.
        length: u32,
    },
    /// Confirms that an edge was removed.
    EdgeRemoved {
        /// Identifier of the removed edge.
        edge: EdgeId,
    },
    /// Confirms that an edge's endpoints were swapped.
    EdgeReversed {
        /// Identifier of the reversed edge.
        edge: EdgeId,
    },
    /// Confirms that an edge's one-way restriction was flipped.
    EdgeOneWayToggled {
        /// Identifier of the toggled edge.
        edge: EdgeId,
        /// Whether the edge is one-way after the toggle.
        one_way: bool,
    },
    /// Reports that a connection request was rejected.
    ConnectRejected {
        /// Node the connection would have departed from.
        from: NodeId,
        /// Node the connection would have arrived at.
        to: NodeId,
        /// Specific reason the connection failed.
        reason: ConnectError,
    },
    /// Confirms the node the player spawns on.
    StartNodeSet {
        /// Identifier of the designated start node.
        node: NodeId,
    },
    /// Confirms that the player entity was created.
    PlayerSpawned {
        /// Identifier assigned to the player.
        entity: EntityId,
        /// Node the player rests on.
        node: NodeId,
    },
    /// Confirms that a foe entity was created.
    FoeSpawned {
        /// Identifier assigned to the foe.
        entity: EntityId,
        /// Behavior the foe follows.
        kind: FoeKind,
        /// Node the foe rests on.
        node: NodeId,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Node referenced by the rejected request.
        node: NodeId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that an entity began traversing an edge.
    TraversalStarted {
        /// Identifier of the moving entity.
        entity: EntityId,
        /// Edge the entity travels along.
        edge: EdgeId,
        /// Node the entity is heading toward.
        target: NodeId,
    },
    /// Reports that a foe routing request was rejected.
    RouteRejected {
        /// Identifier of the foe that requested the move.
        foe: EntityId,
        /// Edge referenced by the rejected request.
        edge: EdgeId,
        /// Specific reason the routing failed.
        reason: RouteError,
    },
    /// Indicates that the simulation clock advanced.
    TickAdvanced {
        /// Tick index after the advance.
        tick: u64,
    },
    /// Confirms that an entity finished traversing an edge.
    ///
    /// Fires at joints as well as squares; joints are passed through without
    /// an idle frame.
    EdgeTraversed {
        /// Identifier of the entity that completed the edge.
        entity: EntityId,
        /// Edge that was completed.
        edge: EdgeId,
        /// Node the entity arrived at.
        node: NodeId,
    },
    /// Confirms that an edge was marked for the first time.
    EdgeMarked {
        /// Identifier of the newly marked edge.
        edge: EdgeId,
    },
    /// Confirms that every edge incident to a square node is marked.
    NodeCleared {
        /// Identifier of the cleared node.
        node: NodeId,
    },
    /// Confirms that an entity came to rest on a square node.
    EntityStopped {
        /// Identifier of the resting entity.
        entity: EntityId,
        /// Node the entity rests on.
        node: NodeId,
    },
    /// Announces that the final unmarked edge was marked.
    AllEdgesMarked {
        /// Tick on which the level was completed.
        tick: u64,
    },
    /// Announces that a foe caught the player.
    PlayerCaught {
        /// Identifier of the foe credited with the capture.
        foe: EntityId,
    },
}

/// Reasons a connection request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectError {
    /// One of the referenced nodes does not exist.
    MissingNode,
    /// The request would connect a node to itself.
    SelfConnection,
    /// An edge already joins the two nodes in either direction.
    DuplicateEdge,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnError {
    /// The referenced start node does not exist.
    MissingNode,
    /// A player entity already inhabits the world.
    PlayerAlreadyPresent,
}

/// Reasons a foe routing request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteError {
    /// The referenced entity does not exist or is not a foe.
    MissingFoe,
    /// The referenced edge does not exist.
    MissingEdge,
    /// The foe is mid-traversal or dead and cannot accept a route.
    NotIdle,
    /// The edge is not incident to the foe's current node.
    NotConnected,
    /// The edge is one-way and points into the foe's current node.
    OneWayBlocked,
}
