//! Tick-driven movement state machine for player and foe entities.

use tracing::warn;
use wire_tracer_core::{EdgeId, EntityId, EntityKind, Event, NodeId, NodeKind, Vec2i};

use crate::graph::Graph;

/// A player or foe travelling the circuit graph.
///
/// A mover is either idle, resting exactly on `current_node`, or traversing
/// `current_edge` toward `target_node` at `speed` pixels per tick.
#[derive(Clone, Debug)]
pub(crate) struct Mover {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) pos: Vec2i,
    pub(crate) current_node: NodeId,
    pub(crate) current_edge: Option<EdgeId>,
    pub(crate) target_node: Option<NodeId>,
    pub(crate) movement: Vec2i,
    pub(crate) destination: Vec2i,
    pub(crate) speed: i32,
    pub(crate) moving: bool,
    pub(crate) dead: bool,
    pub(crate) last_edge: Option<EdgeId>,
}

impl Mover {
    pub(crate) fn spawned_at(id: EntityId, kind: EntityKind, node: NodeId, pos: Vec2i, speed: i32) -> Self {
        Self {
            id,
            kind,
            pos,
            current_node: node,
            current_edge: None,
            target_node: None,
            movement: Vec2i::ZERO,
            destination: Vec2i::ZERO,
            speed,
            moving: false,
            dead: false,
            last_edge: None,
        }
    }

    fn stop(&mut self) {
        self.moving = false;
        self.movement = Vec2i::ZERO;
        self.target_node = None;
        self.current_edge = None;
    }
}

/// Puts the mover into the traversing state along the provided edge.
///
/// The caller is responsible for validating that the edge is outgoing from
/// the mover's current node.
pub(crate) fn begin_traversal(mover: &mut Mover, graph: &Graph, edge: EdgeId) -> Option<NodeId> {
    let target = graph.edge(edge)?.other(mover.current_node);
    let destination = graph.node(target)?.pos;
    mover.current_edge = Some(edge);
    mover.target_node = Some(target);
    mover.destination = destination;
    mover.movement = mover.pos.offset_to(destination).unit();
    mover.moving = !mover.movement.is_zero();
    Some(target)
}

/// Advances a mover by one tick.
///
/// Movement happens along a single axis, so the arrival test only compares
/// the non-zero component of the remaining distance against the speed. On
/// arrival the position snaps exactly to the target node; arriving on a
/// joint immediately re-enters traversal along the joint's other edge with
/// no idle frame in between.
pub(crate) fn advance(mover: &mut Mover, graph: &mut Graph, tick: u64, out: &mut Vec<Event>) {
    if mover.dead || !mover.moving {
        return;
    }

    mover.pos = mover.pos.translated(mover.movement.scaled(mover.speed));
    if mover.kind == EntityKind::Player {
        if let Some(edge) = mover.current_edge {
            let delta = u32::try_from(mover.speed).unwrap_or(0);
            graph.accumulate_marked_length(edge, delta);
        }
    }

    let Some(target) = mover.target_node else {
        return;
    };
    let remaining = mover.pos.offset_to(mover.destination);
    let arrived = (mover.movement.x() != 0 && remaining.x().abs() < mover.speed)
        || (mover.movement.y() != 0 && remaining.y().abs() < mover.speed);
    if !arrived {
        return;
    }

    mover.pos = mover.destination;
    mover.current_node = target;
    let Some(completed) = mover.current_edge else {
        return;
    };
    mover.last_edge = Some(completed);

    if mover.kind == EntityKind::Player {
        if let Some(outcome) = graph.mark_edge(completed) {
            if outcome.first {
                out.push(Event::EdgeMarked { edge: completed });
                for node in outcome.cleared_nodes {
                    out.push(Event::NodeCleared { node });
                }
                if outcome.all_marked {
                    out.push(Event::AllEdgesMarked { tick });
                }
            }
        }
    }

    out.push(Event::EdgeTraversed {
        entity: mover.id,
        edge: completed,
        node: target,
    });

    let kind = graph.node(target).map(|node| node.kind);
    match kind {
        Some(NodeKind::Joint) => {
            let next = graph.other_edge(target, completed);
            let started = next.and_then(|edge| begin_traversal(mover, graph, edge));
            if started.is_none() {
                warn!(
                    node = target.get(),
                    "joint without a continuation edge, stopping entity"
                );
                mover.stop();
                out.push(Event::EntityStopped {
                    entity: mover.id,
                    node: target,
                });
            }
        }
        _ => {
            mover.stop();
            out.push(Event::EntityStopped {
                entity: mover.id,
                node: target,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire_tracer_core::{EntityId, EntityKind, FoeKind, NodeKind};

    fn graph_with_edge() -> (Graph, NodeId, NodeId, EdgeId) {
        let mut graph = Graph::new();
        let a = graph.create_node(Vec2i::new(0, 0), NodeKind::Square).id;
        let b = graph.create_node(Vec2i::new(10, 0), NodeKind::Square).id;
        let edge = graph.connect(a, b, false).expect("connect");
        (graph, a, b, edge)
    }

    #[test]
    fn traversal_snaps_to_the_target_node() {
        let (mut graph, a, b, edge) = graph_with_edge();
        let mut mover = Mover::spawned_at(
            EntityId::new(0),
            EntityKind::Player,
            a,
            Vec2i::new(0, 0),
            2,
        );
        assert_eq!(begin_traversal(&mut mover, &graph, edge), Some(b));
        assert!(mover.moving);

        let mut events = Vec::new();
        for tick in 0..5 {
            advance(&mut mover, &mut graph, tick, &mut events);
        }

        assert!(!mover.moving);
        assert_eq!(mover.pos, Vec2i::new(10, 0));
        assert_eq!(mover.current_node, b);
        assert_eq!(mover.last_edge, Some(edge));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::EntityStopped { node, .. } if *node == b
        )));
    }

    #[test]
    fn player_arrival_marks_the_edge() {
        let (mut graph, a, _, edge) = graph_with_edge();
        let mut mover = Mover::spawned_at(
            EntityId::new(0),
            EntityKind::Player,
            a,
            Vec2i::new(0, 0),
            2,
        );
        let _ = begin_traversal(&mut mover, &graph, edge);

        let mut events = Vec::new();
        for tick in 0..5 {
            advance(&mut mover, &mut graph, tick, &mut events);
        }

        assert!(graph.edge(edge).expect("edge").marked);
        assert!(events.iter().any(|event| matches!(event, Event::EdgeMarked { .. })));
        assert!(events.iter().any(|event| matches!(event, Event::AllEdgesMarked { .. })));
    }

    #[test]
    fn foe_arrival_leaves_the_edge_unmarked() {
        let (mut graph, a, _, edge) = graph_with_edge();
        let mut mover = Mover::spawned_at(
            EntityId::new(1),
            EntityKind::Foe(FoeKind::Simple),
            a,
            Vec2i::new(0, 0),
            1,
        );
        let _ = begin_traversal(&mut mover, &graph, edge);

        let mut events = Vec::new();
        for tick in 0..12 {
            advance(&mut mover, &mut graph, tick, &mut events);
        }

        assert!(!mover.moving);
        assert!(!graph.edge(edge).expect("edge").marked);
        assert_eq!(mover.last_edge, Some(edge));
    }

    #[test]
    fn dead_entities_do_not_move() {
        let (mut graph, a, _, edge) = graph_with_edge();
        let mut mover = Mover::spawned_at(
            EntityId::new(0),
            EntityKind::Player,
            a,
            Vec2i::new(0, 0),
            2,
        );
        let _ = begin_traversal(&mut mover, &graph, edge);
        mover.dead = true;

        let mut events = Vec::new();
        advance(&mut mover, &mut graph, 1, &mut events);
        assert_eq!(mover.pos, Vec2i::new(0, 0));
        assert!(events.is_empty());
    }
}
