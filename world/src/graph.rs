//! Node and edge storage backing the authoritative world.

use tracing::warn;
use wire_tracer_core::{ConnectError, Direction, EdgeId, NodeId, NodeKind, Vec2i};

/// A waypoint within the circuit graph.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) id: NodeId,
    pub(crate) pos: Vec2i,
    pub(crate) kind: NodeKind,
    /// Incident edges in insertion order, never sorted by direction.
    pub(crate) edges: Vec<EdgeId>,
    pub(crate) marked: bool,
}

/// An axis-aligned connection between two nodes.
#[derive(Clone, Debug)]
pub(crate) struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) source: NodeId,
    pub(crate) destination: NodeId,
    pub(crate) one_way: bool,
    pub(crate) length: u32,
    pub(crate) marked: bool,
    pub(crate) marked_length: u32,
}

impl Edge {
    /// Opposite endpoint of the edge relative to the provided node.
    pub(crate) fn other(&self, node: NodeId) -> NodeId {
        if node == self.source {
            self.destination
        } else {
            self.source
        }
    }

    /// Whether the edge can be traversed starting at the provided node.
    pub(crate) fn is_outgoing_from(&self, node: NodeId) -> bool {
        !self.one_way || self.source == node
    }
}

/// Outcome of a node creation request.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CreatedNode {
    pub(crate) id: NodeId,
    pub(crate) pos: Vec2i,
    pub(crate) kind: NodeKind,
}

/// Outcome of a connection request, listing everything that was created.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConnectOutcome {
    /// Joint node synthesized for the connection, if a fresh one was needed.
    pub(crate) joint: Option<CreatedNode>,
    /// Edges created by the connection, in traversal order.
    pub(crate) edges: Vec<EdgeId>,
}

/// Outcome of marking an edge.
#[derive(Clone, Debug)]
pub(crate) struct MarkOutcome {
    /// Whether this call marked the edge for the first time.
    pub(crate) first: bool,
    /// Square nodes whose incident edges all became marked.
    pub(crate) cleared_nodes: Vec<NodeId>,
    /// Whether the marking completed the level.
    pub(crate) all_marked: bool,
}

/// Insertion-ordered node and edge storage with per-graph id counters.
#[derive(Clone, Debug)]
pub(crate) struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    next_node_id: u32,
    next_edge_id: u32,
    marked_edges: usize,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            next_node_id: 1,
            next_edge_id: 1,
            marked_edges: 0,
        }
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub(crate) fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|edge| edge.id == id)
    }

    pub(crate) fn marked_edges(&self) -> usize {
        self.marked_edges
    }

    pub(crate) fn has_all_edges_marked(&self) -> bool {
        self.marked_edges == self.edges.len()
    }

    /// Creates a node at the provided position, reusing any existing node
    /// already occupying it.
    pub(crate) fn create_node(&mut self, pos: Vec2i, kind: NodeKind) -> CreatedNode {
        if let Some(existing) = self.nodes.iter().find(|node| node.pos == pos) {
            warn!(
                node = existing.id.get(),
                x = pos.x(),
                y = pos.y(),
                "node overlap, reusing existing node"
            );
            return CreatedNode {
                id: existing.id,
                pos: existing.pos,
                kind: existing.kind,
            };
        }

        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.push(Node {
            id,
            pos,
            kind,
            edges: Vec::new(),
            marked: false,
        });
        CreatedNode { id, pos, kind }
    }

    /// Connects two nodes directly with a single axis-aligned edge.
    pub(crate) fn connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        one_way: bool,
    ) -> Result<EdgeId, ConnectError> {
        self.check_leg(from, to)?;

        let source = self.node(from).ok_or(ConnectError::MissingNode)?;
        let destination = self.node(to).ok_or(ConnectError::MissingNode)?;
        debug_assert!(
            source.pos.shares_axis_with(destination.pos),
            "edges must stay axis aligned"
        );
        let length = source.pos.manhattan_distance(destination.pos);

        let id = EdgeId::new(self.next_edge_id);
        self.next_edge_id += 1;
        self.edges.push(Edge {
            id,
            source: from,
            destination: to,
            one_way,
            length,
            marked: false,
            marked_length: 0,
        });
        if let Some(node) = self.node_mut(from) {
            node.edges.push(id);
        }
        if let Some(node) = self.node_mut(to) {
            node.edges.push(id);
        }
        Ok(id)
    }

    /// Connects two nodes, synthesizing a joint at the corner when they do
    /// not share an axis.
    ///
    /// The operation is atomic: both legs are validated before anything is
    /// created, so a rejection never leaves a half-connected joint behind.
    pub(crate) fn connect_with_joint(
        &mut self,
        from: NodeId,
        to: NodeId,
        reverse_corner: bool,
        one_way: bool,
    ) -> Result<ConnectOutcome, ConnectError> {
        let from_pos = self.node(from).ok_or(ConnectError::MissingNode)?.pos;
        let to_pos = self.node(to).ok_or(ConnectError::MissingNode)?.pos;

        if from_pos.shares_axis_with(to_pos) {
            let (source, destination) = if reverse_corner {
                (to, from)
            } else {
                (from, to)
            };
            let edge = self.connect(source, destination, one_way)?;
            return Ok(ConnectOutcome {
                joint: None,
                edges: vec![edge],
            });
        }

        let corner = if reverse_corner {
            Vec2i::new(from_pos.x(), to_pos.y())
        } else {
            Vec2i::new(to_pos.x(), from_pos.y())
        };

        match self.nodes.iter().find(|node| node.pos == corner) {
            Some(existing) => {
                let joint = existing.id;
                self.check_leg(from, joint)?;
                self.check_leg(joint, to)?;
                warn!(
                    node = joint.get(),
                    x = corner.x(),
                    y = corner.y(),
                    "node overlap, reusing existing node as corner"
                );
                let first = self.connect(from, joint, one_way)?;
                let second = self.connect(joint, to, one_way)?;
                Ok(ConnectOutcome {
                    joint: None,
                    edges: vec![first, second],
                })
            }
            None => {
                let joint = self.create_node(corner, NodeKind::Joint);
                let first = self.connect(from, joint.id, one_way)?;
                let second = self.connect(joint.id, to, one_way)?;
                Ok(ConnectOutcome {
                    joint: Some(joint),
                    edges: vec![first, second],
                })
            }
        }
    }

    /// Validates one prospective edge against the self-connection and
    /// duplicate guards without creating anything.
    fn check_leg(&self, from: NodeId, to: NodeId) -> Result<(), ConnectError> {
        if self.node(from).is_none() || self.node(to).is_none() {
            return Err(ConnectError::MissingNode);
        }
        if from == to {
            return Err(ConnectError::SelfConnection);
        }
        let duplicate = self.edges.iter().any(|edge| {
            (edge.source == from && edge.destination == to)
                || (edge.source == to && edge.destination == from)
        });
        if duplicate {
            return Err(ConnectError::DuplicateEdge);
        }
        Ok(())
    }

    /// Removes an edge, detaching it from both endpoint edge lists.
    pub(crate) fn remove_edge(&mut self, id: EdgeId) -> bool {
        let Some(index) = self.edges.iter().position(|edge| edge.id == id) else {
            return false;
        };
        let edge = self.edges.remove(index);
        if edge.marked {
            self.marked_edges -= 1;
        }
        if let Some(node) = self.node_mut(edge.source) {
            node.edges.retain(|incident| *incident != id);
        }
        if let Some(node) = self.node_mut(edge.destination) {
            node.edges.retain(|incident| *incident != id);
        }
        true
    }

    /// Removes a node, cascading removal to its incident edges.
    ///
    /// Returns the removed edges in incidence order.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<Vec<EdgeId>> {
        let incident = self.node(id)?.edges.clone();
        for edge in &incident {
            let _ = self.remove_edge(*edge);
        }
        self.nodes.retain(|node| node.id != id);
        Some(incident)
    }

    pub(crate) fn reverse_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.edge_mut(id) else {
            return false;
        };
        std::mem::swap(&mut edge.source, &mut edge.destination);
        true
    }

    pub(crate) fn toggle_one_way(&mut self, id: EdgeId) -> Option<bool> {
        let edge = self.edge_mut(id)?;
        edge.one_way = !edge.one_way;
        Some(edge.one_way)
    }

    pub(crate) fn toggle_node_kind(&mut self, id: NodeId) -> Option<NodeKind> {
        let node = self.node_mut(id)?;
        node.kind = match node.kind {
            NodeKind::Square => NodeKind::Joint,
            NodeKind::Joint => NodeKind::Square,
        };
        Some(node.kind)
    }

    /// Marks an edge, reporting cleared endpoint nodes and level completion.
    ///
    /// Marking is idempotent and monotonic.
    pub(crate) fn mark_edge(&mut self, id: EdgeId) -> Option<MarkOutcome> {
        let edge = self.edge_mut(id)?;
        if edge.marked {
            return Some(MarkOutcome {
                first: false,
                cleared_nodes: Vec::new(),
                all_marked: false,
            });
        }
        edge.marked = true;
        edge.marked_length = edge.length;
        self.marked_edges += 1;

        let endpoints = {
            let edge = self.edge(id)?;
            [edge.source, edge.destination]
        };
        let mut cleared_nodes = Vec::new();
        for endpoint in endpoints {
            let all_marked = {
                let Some(node) = self.node(endpoint) else {
                    continue;
                };
                if node.kind != NodeKind::Square || node.marked {
                    continue;
                }
                node.edges
                    .iter()
                    .all(|incident| self.edge(*incident).is_some_and(|edge| edge.marked))
            };
            if all_marked {
                if let Some(node) = self.node_mut(endpoint) {
                    node.marked = true;
                    cleared_nodes.push(endpoint);
                }
            }
        }

        Some(MarkOutcome {
            first: true,
            cleared_nodes,
            all_marked: self.has_all_edges_marked(),
        })
    }

    /// Accumulates partial traversal progress on an unmarked edge.
    pub(crate) fn accumulate_marked_length(&mut self, id: EdgeId, delta: u32) {
        if let Some(edge) = self.edge_mut(id) {
            if !edge.marked {
                edge.marked_length = edge.marked_length.saturating_add(delta).min(edge.length);
            }
        }
    }

    /// First node whose bounding box of `margin` pixels contains the point.
    pub(crate) fn node_at(&self, pos: Vec2i, margin: i32) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| {
                let gap = node.pos.offset_to(pos);
                gap.x().abs() <= margin && gap.y().abs() <= margin
            })
            .map(|node| node.id)
    }

    /// First edge whose perpendicular band of `margin` pixels contains the
    /// point, with the point strictly between the endpoints along the axis.
    pub(crate) fn edge_at(&self, pos: Vec2i, margin: i32) -> Option<EdgeId> {
        self.edges
            .iter()
            .find(|edge| {
                let Some(source) = self.node(edge.source) else {
                    return false;
                };
                let Some(destination) = self.node(edge.destination) else {
                    return false;
                };
                if source.pos.y() == destination.pos.y() {
                    (pos.y() - source.pos.y()).abs() < margin
                        && between(pos.x(), source.pos.x(), destination.pos.x())
                } else {
                    (pos.x() - source.pos.x()).abs() < margin
                        && between(pos.y(), source.pos.y(), destination.pos.y())
                }
            })
            .map(|edge| edge.id)
    }

    /// Edges usable for traversal starting at the provided node.
    pub(crate) fn outgoing_edges(&self, node: NodeId) -> Vec<EdgeId> {
        let Some(node) = self.node(node) else {
            return Vec::new();
        };
        node.edges
            .iter()
            .copied()
            .filter(|id| {
                self.edge(*id)
                    .is_some_and(|edge| edge.is_outgoing_from(node.id))
            })
            .collect()
    }

    /// Outgoing edge leaving the node exactly in the provided direction.
    pub(crate) fn edge_by_direction(&self, node: NodeId, direction: Direction) -> Option<EdgeId> {
        let origin = self.node(node)?;
        origin
            .edges
            .iter()
            .copied()
            .find(|id| {
                let Some(edge) = self.edge(*id) else {
                    return false;
                };
                if !edge.is_outgoing_from(node) {
                    return false;
                }
                let Some(neighbor) = self.node(edge.other(node)) else {
                    return false;
                };
                origin.pos.offset_to(neighbor.pos).unit() == direction.unit_vector()
            })
    }

    /// First incident edge of the node other than the provided one.
    pub(crate) fn other_edge(&self, node: NodeId, not_this: EdgeId) -> Option<EdgeId> {
        self.node(node)?
            .edges
            .iter()
            .copied()
            .find(|id| *id != not_this)
    }

    /// Walks forward through joint nodes until reaching a square node.
    ///
    /// The walk is an explicit loop bounded by the edge count, so malformed
    /// cyclic joint data terminates instead of recursing forever.
    pub(crate) fn next_square_node(&self, from: NodeId, along: EdgeId) -> Option<NodeId> {
        let mut edge = self.edge(along)?;
        let mut node = edge.other(from);
        let mut hops = 0;
        while let Some(current) = self.node(node) {
            if current.kind == NodeKind::Square || node == from || hops > self.edges.len() {
                break;
            }
            let Some(next) = self.other_edge(node, edge.id) else {
                break;
            };
            edge = self.edge(next)?;
            node = edge.other(node);
            hops += 1;
        }
        Some(node)
    }
}

fn between(value: i32, range_start: i32, range_end: i32) -> bool {
    let (low, high) = if range_start > range_end {
        (range_end, range_start)
    } else {
        (range_start, range_end)
    };
    low < value && value < high
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(graph: &mut Graph, x: i32, y: i32) -> NodeId {
        graph.create_node(Vec2i::new(x, y), NodeKind::Square).id
    }

    #[test]
    fn create_node_reuses_occupied_position() {
        let mut graph = Graph::new();
        let first = square(&mut graph, 40, 40);
        let second = graph.create_node(Vec2i::new(40, 40), NodeKind::Joint);

        assert_eq!(second.id, first);
        assert_eq!(second.kind, NodeKind::Square);
        assert_eq!(graph.nodes().len(), 1);
    }

    #[test]
    fn duplicate_edges_are_rejected_in_either_direction() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);

        assert!(graph.connect(a, b, false).is_ok());
        assert_eq!(graph.connect(a, b, false), Err(ConnectError::DuplicateEdge));
        assert_eq!(graph.connect(b, a, true), Err(ConnectError::DuplicateEdge));
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn self_connection_is_rejected() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        assert_eq!(graph.connect(a, a, false), Err(ConnectError::SelfConnection));
    }

    #[test]
    fn aligned_connection_creates_no_joint() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);

        let outcome = graph.connect_with_joint(a, b, false, false).expect("connect");
        assert!(outcome.joint.is_none());
        assert_eq!(outcome.edges.len(), 1);
        let edge = graph.edge(outcome.edges[0]).expect("edge");
        assert_eq!(edge.length, 100);
        assert_eq!((edge.source, edge.destination), (a, b));
    }

    #[test]
    fn aligned_reverse_swaps_source_and_destination() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 0, 80);

        let outcome = graph.connect_with_joint(a, b, true, true).expect("connect");
        let edge = graph.edge(outcome.edges[0]).expect("edge");
        assert_eq!((edge.source, edge.destination), (b, a));
        assert!(edge.one_way);
    }

    #[test]
    fn corner_joint_is_synthesized_for_unaligned_nodes() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 100);

        let outcome = graph.connect_with_joint(a, b, false, false).expect("connect");
        let joint = outcome.joint.expect("fresh joint");
        assert_eq!(joint.pos, Vec2i::new(100, 0));
        assert_eq!(joint.kind, NodeKind::Joint);
        assert_eq!(outcome.edges.len(), 2);
        assert_eq!(graph.node(joint.id).expect("joint node").edges.len(), 2);
    }

    #[test]
    fn reverse_corner_selects_the_other_bend() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 100);

        let outcome = graph.connect_with_joint(a, b, true, false).expect("connect");
        let joint = outcome.joint.expect("fresh joint");
        assert_eq!(joint.pos, Vec2i::new(0, 100));
    }

    #[test]
    fn rejected_joint_connection_creates_nothing() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 100);
        let corner = graph.create_node(Vec2i::new(100, 0), NodeKind::Joint).id;
        assert!(graph.connect(corner, b, false).is_ok());
        assert!(graph.connect(a, corner, false).is_ok());

        let nodes_before = graph.nodes().len();
        let edges_before = graph.edges().len();
        assert_eq!(
            graph
                .connect_with_joint(a, b, false, false)
                .expect_err("duplicate legs"),
            ConnectError::DuplicateEdge
        );
        assert_eq!(graph.nodes().len(), nodes_before);
        assert_eq!(graph.edges().len(), edges_before);
    }

    #[test]
    fn removing_a_node_cascades_to_incident_edges() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);
        let c = square(&mut graph, 100, 100);
        let ab = graph.connect(a, b, false).expect("connect");
        let bc = graph.connect(b, c, false).expect("connect");

        let removed = graph.remove_node(b).expect("node removed");
        assert_eq!(removed, vec![ab, bc]);
        assert!(graph.edges().is_empty());
        assert!(graph.node(a).expect("node a").edges.is_empty());
        assert!(graph.node(c).expect("node c").edges.is_empty());
    }

    #[test]
    fn removing_a_marked_edge_updates_the_counter() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);
        let ab = graph.connect(a, b, false).expect("connect");

        assert!(graph.mark_edge(ab).expect("mark").first);
        assert_eq!(graph.marked_edges(), 1);
        assert!(graph.remove_edge(ab));
        assert_eq!(graph.marked_edges(), 0);
        assert!(graph.has_all_edges_marked());
    }

    #[test]
    fn marking_is_idempotent_and_clears_saturated_nodes() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);
        let c = square(&mut graph, 200, 0);
        let ab = graph.connect(a, b, false).expect("connect");
        let bc = graph.connect(b, c, false).expect("connect");

        let first = graph.mark_edge(ab).expect("mark");
        assert!(first.first);
        assert_eq!(first.cleared_nodes, vec![a]);
        assert!(!first.all_marked);

        let again = graph.mark_edge(ab).expect("mark");
        assert!(!again.first);
        assert!(again.cleared_nodes.is_empty());
        assert_eq!(graph.marked_edges(), 1);

        let second = graph.mark_edge(bc).expect("mark");
        assert!(second.first);
        assert_eq!(second.cleared_nodes, vec![b, c]);
        assert!(second.all_marked);
    }

    #[test]
    fn one_way_edges_are_excluded_from_reverse_traversal() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);
        let c = square(&mut graph, 100, 100);
        let ab = graph.connect(a, b, true).expect("connect");
        let bc = graph.connect(b, c, false).expect("connect");

        assert_eq!(graph.outgoing_edges(a), vec![ab]);
        assert_eq!(graph.outgoing_edges(b), vec![bc]);
        assert_eq!(graph.edge_by_direction(b, Direction::Left), None);
        assert_eq!(graph.edge_by_direction(b, Direction::Down), Some(bc));
        assert_eq!(graph.edge_by_direction(a, Direction::Right), Some(ab));
    }

    #[test]
    fn hit_tests_match_the_editor_margins() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);
        let ab = graph.connect(a, b, false).expect("connect");

        assert_eq!(graph.node_at(Vec2i::new(4, -3), 5), Some(a));
        assert_eq!(graph.node_at(Vec2i::new(8, 0), 5), None);
        assert_eq!(graph.edge_at(Vec2i::new(50, 3), 5), Some(ab));
        assert_eq!(graph.edge_at(Vec2i::new(50, 5), 5), None);
        assert_eq!(graph.edge_at(Vec2i::new(0, 0), 5), None, "endpoints excluded");
    }

    #[test]
    fn joint_walk_resolves_the_far_square_node() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let j1 = graph.create_node(Vec2i::new(100, 0), NodeKind::Joint).id;
        let j2 = graph.create_node(Vec2i::new(100, 100), NodeKind::Joint).id;
        let d = square(&mut graph, 0, 100);
        let first = graph.connect(a, j1, false).expect("connect");
        let _ = graph.connect(j1, j2, false).expect("connect");
        let _ = graph.connect(j2, d, false).expect("connect");

        assert_eq!(graph.next_square_node(a, first), Some(d));
    }

    #[test]
    fn joint_walk_terminates_on_a_joint_cycle() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let j1 = graph.create_node(Vec2i::new(100, 0), NodeKind::Joint).id;
        let j2 = graph.create_node(Vec2i::new(100, 100), NodeKind::Joint).id;
        let j3 = graph.create_node(Vec2i::new(0, 100), NodeKind::Joint).id;
        let entry = graph.connect(a, j1, false).expect("connect");
        let _ = graph.connect(j1, j2, false).expect("connect");
        let _ = graph.connect(j2, j3, false).expect("connect");
        let _ = graph.connect(j3, j1, false).expect("connect");

        // The walk must come back with *some* node instead of hanging.
        assert!(graph.next_square_node(a, entry).is_some());
    }
}
