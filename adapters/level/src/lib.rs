#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level file adapter that builds worlds from JSON and exports them back.
//!
//! The schema mirrors the authoring format: a list of nodes with external
//! ids, a list of edges referencing those ids, and the entity placements.
//! Building replays the level through the world's command surface, so the
//! loader exercises exactly the same mutation path as the editor.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use wire_tracer_core::{Command, EntityKind, Event, FoeKind, NodeId, NodeKind, Vec2i};
use wire_tracer_world::{apply, query, World};

/// Serializable description of a complete level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Headline shown when the level starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Secondary line shown under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Text shown when the level is completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endtext: Option<String>,
    /// Nodes composing the circuit, keyed by external id.
    pub nodes: Vec<NodeRecord>,
    /// Connections between the nodes.
    pub edges: Vec<EdgeRecord>,
    /// Player and foe placements.
    pub entities: Vec<EntityRecord>,
}

/// A node entry within a level file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// External id used by edge and entity records.
    pub id: u32,
    /// Role of the node.
    #[serde(rename = "type")]
    pub kind: NodeRecordKind,
    /// Horizontal pixel coordinate.
    pub x: i32,
    /// Vertical pixel coordinate.
    pub y: i32,
}

/// Node roles expressible in a level file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRecordKind {
    /// A visible square waypoint.
    #[serde(rename = "node")]
    Square,
    /// A synthetic bend point.
    #[serde(rename = "joint")]
    Joint,
}

impl From<NodeRecordKind> for NodeKind {
    fn from(kind: NodeRecordKind) -> Self {
        match kind {
            NodeRecordKind::Square => NodeKind::Square,
            NodeRecordKind::Joint => NodeKind::Joint,
        }
    }
}

/// An edge entry within a level file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// External id of the node the edge departs from.
    pub source: u32,
    /// External id of the node the edge arrives at.
    pub dest: u32,
    /// Selects the alternate corner when a joint must be synthesized.
    #[serde(default, skip_serializing_if = "is_false")]
    pub reverse: bool,
    /// Restricts traversal to the source-to-destination direction.
    #[serde(default, skip_serializing_if = "is_false")]
    pub oneway: bool,
}

/// An entity placement within a level file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntityRecord {
    /// Declares the node the player spawns on.
    #[serde(rename = "player")]
    Player {
        /// External id of the start node.
        node: u32,
    },
    /// Places a foe at a node.
    #[serde(rename = "foe")]
    Foe {
        /// Behavior the foe follows.
        #[serde(rename = "foeType")]
        foe_type: FoeRecordKind,
        /// External id of the foe's start node.
        node: u32,
    },
}

/// Foe behaviors expressible in a level file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoeRecordKind {
    /// Wanders the graph randomly.
    Simple,
    /// Pursues the player.
    Tracking,
}

impl From<FoeRecordKind> for FoeKind {
    fn from(kind: FoeRecordKind) -> Self {
        match kind {
            FoeRecordKind::Simple => FoeKind::Simple,
            FoeRecordKind::Tracking => FoeKind::Tracking,
        }
    }
}

/// Errors that can occur while loading or exporting a level.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level file could not be read or written.
    #[error("could not access level file: {0}")]
    Io(#[from] std::io::Error),
    /// The level payload was not valid JSON for the schema.
    #[error("could not parse level payload: {0}")]
    Format(#[from] serde_json::Error),
    /// The level declares no player start node.
    #[error("level declares no player start node")]
    MissingPlayer,
    /// A joint ended up with a degree other than two.
    #[error("joint node {node} has {degree} edges, expected exactly 2")]
    MalformedJoint {
        /// Identifier of the offending node.
        node: u32,
        /// Number of edges incident to the node.
        degree: usize,
    },
}

/// Parses a level payload into its serializable description.
pub fn parse(text: &str) -> Result<LevelSpec, LevelError> {
    Ok(serde_json::from_str(text)?)
}

/// Serializes a level description into a pretty JSON payload.
pub fn to_json(spec: &LevelSpec) -> Result<String, LevelError> {
    Ok(serde_json::to_string_pretty(spec)?)
}

/// Builds a fresh world by replaying the level through the command surface.
///
/// Edge and entity records referencing unknown node ids are skipped with a
/// warning, matching the tolerance of the authoring tools. Structural
/// invariants are validated after the build so broken level data fails here
/// rather than at movement time.
pub fn build(spec: &LevelSpec) -> Result<World, LevelError> {
    let mut world = World::new();
    let mut events = Vec::new();
    let mut ids: HashMap<u32, NodeId> = HashMap::new();

    for record in &spec.nodes {
        events.clear();
        apply(
            &mut world,
            Command::AddNode {
                pos: Vec2i::new(record.x, record.y),
                kind: record.kind.into(),
            },
            &mut events,
        );
        if let Some(Event::NodeAdded { node, .. }) = events.last() {
            if record.id != 0 {
                let _ = ids.insert(record.id, *node);
            }
        }
    }

    for record in &spec.edges {
        let Some(from) = ids.get(&record.source).copied() else {
            warn!(source = record.source, "source node not found");
            continue;
        };
        let Some(to) = ids.get(&record.dest).copied() else {
            warn!(dest = record.dest, "dest node not found");
            continue;
        };
        events.clear();
        apply(
            &mut world,
            Command::ConnectNodes {
                from,
                to,
                reverse_corner: record.reverse,
                one_way: record.oneway,
            },
            &mut events,
        );
    }

    for record in &spec.entities {
        match record {
            EntityRecord::Player { node } => {
                let Some(start) = ids.get(node).copied() else {
                    warn!(node, "player start node not found");
                    continue;
                };
                events.clear();
                apply(&mut world, Command::SetStartNode { node: start }, &mut events);
            }
            EntityRecord::Foe { foe_type, node } => {
                let Some(start) = ids.get(node).copied() else {
                    warn!(node, "foe start node not found");
                    continue;
                };
                events.clear();
                apply(
                    &mut world,
                    Command::SpawnFoe {
                        kind: (*foe_type).into(),
                        node: start,
                    },
                    &mut events,
                );
            }
        }
    }

    validate(&world)?;
    Ok(world)
}

/// Checks the structural invariants a playable level must satisfy.
pub fn validate(world: &World) -> Result<(), LevelError> {
    for node in query::node_view(world).iter() {
        if node.kind == NodeKind::Joint && node.edges.len() != 2 {
            return Err(LevelError::MalformedJoint {
                node: node.id.get(),
                degree: node.edges.len(),
            });
        }
    }
    if query::start_node(world).is_none() {
        return Err(LevelError::MissingPlayer);
    }
    Ok(())
}

/// Exports a world back into a level description.
///
/// Nodes are renumbered from 1 in insertion order and orphaned joints are
/// dropped. The title fields are left empty for the caller to fill in.
pub fn snapshot(world: &World) -> Result<LevelSpec, LevelError> {
    let mut ids: HashMap<NodeId, u32> = HashMap::new();
    let mut nodes = Vec::new();
    let mut next_id = 1;

    for node in query::node_view(world).iter() {
        if node.kind == NodeKind::Joint && node.edges.is_empty() {
            continue;
        }
        let kind = match node.kind {
            NodeKind::Square => NodeRecordKind::Square,
            NodeKind::Joint => NodeRecordKind::Joint,
        };
        nodes.push(NodeRecord {
            id: next_id,
            kind,
            x: node.pos.x(),
            y: node.pos.y(),
        });
        let _ = ids.insert(node.id, next_id);
        next_id += 1;
    }

    let mut edges = Vec::new();
    for edge in query::edge_view(world).iter() {
        let (Some(source), Some(dest)) = (ids.get(&edge.source), ids.get(&edge.destination))
        else {
            continue;
        };
        edges.push(EdgeRecord {
            source: *source,
            dest: *dest,
            reverse: false,
            oneway: edge.one_way,
        });
    }

    let start = query::start_node(world).ok_or(LevelError::MissingPlayer)?;
    let start = ids.get(&start).copied().ok_or(LevelError::MissingPlayer)?;
    let mut entities = vec![EntityRecord::Player { node: start }];
    for entity in query::entity_view(world).iter() {
        let foe_type = match entity.kind {
            EntityKind::Foe(FoeKind::Simple) => FoeRecordKind::Simple,
            EntityKind::Foe(FoeKind::Tracking) => FoeRecordKind::Tracking,
            EntityKind::Player => continue,
        };
        let Some(node) = ids.get(&entity.current_node).copied() else {
            continue;
        };
        entities.push(EntityRecord::Foe { foe_type, node });
    }

    Ok(LevelSpec {
        title: None,
        subtitle: None,
        endtext: None,
        nodes,
        edges,
        entities,
    })
}

/// Reads and builds a level file from disk.
pub fn load_file(path: &Path) -> Result<(LevelSpec, World), LevelError> {
    let text = fs::read_to_string(path)?;
    let spec = parse(&text)?;
    let world = build(&spec)?;
    Ok((spec, world))
}

/// Writes a level description to disk as pretty JSON.
pub fn save_file(path: &Path, spec: &LevelSpec) -> Result<(), LevelError> {
    fs::write(path, to_json(spec)?)?;
    Ok(())
}

fn is_false(value: &bool) -> bool {
    !*value
}
