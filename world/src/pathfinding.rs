//! Shortest-path search over the circuit graph used by pursuing foes.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use wire_tracer_core::{EdgeId, NodeId, NodeKind};

use crate::graph::Graph;

/// Finds the cheapest edge sequence from `start` to `goal` with A*.
///
/// Expansion honors one-way edges, costs are edge lengths, and the heuristic
/// is the Manhattan distance between node positions, which never exceeds the
/// true cost on an axis-aligned graph. Equal f-scores break toward the
/// lowest node id so results are reproducible regardless of insertion order.
///
/// The reported path contains only edges departing square nodes; the legs of
/// a joint chain are collapsed because movement passes through joints
/// implicitly. An unreachable goal yields `None`, while `start == goal`
/// yields an empty path.
pub(crate) fn shortest_path(graph: &Graph, start: NodeId, goal: NodeId) -> Option<Vec<EdgeId>> {
    let goal_pos = graph.node(goal)?.pos;
    let start_pos = graph.node(start)?.pos;

    let mut open: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();
    let mut g_score: HashMap<NodeId, u32> = HashMap::new();
    let mut came_from: HashMap<NodeId, EdgeId> = HashMap::new();
    let mut closed: HashSet<NodeId> = HashSet::new();

    let _ = g_score.insert(start, 0);
    open.push(Reverse((start_pos.manhattan_distance(goal_pos), start)));

    while let Some(Reverse((_, current))) = open.pop() {
        if !closed.insert(current) {
            continue;
        }
        if current == goal {
            return Some(reconstruct(graph, &came_from, start, goal));
        }

        let Some(current_cost) = g_score.get(&current).copied() else {
            continue;
        };

        for edge_id in graph.outgoing_edges(current) {
            let Some(edge) = graph.edge(edge_id) else {
                continue;
            };
            let neighbor = edge.other(current);
            if closed.contains(&neighbor) {
                continue;
            }
            let Some(neighbor_pos) = graph.node(neighbor).map(|node| node.pos) else {
                continue;
            };

            let tentative = current_cost.saturating_add(edge.length);
            let improves = g_score
                .get(&neighbor)
                .map_or(true, |known| tentative < *known);
            if improves {
                let _ = came_from.insert(neighbor, edge_id);
                let _ = g_score.insert(neighbor, tentative);
                let estimate = tentative.saturating_add(neighbor_pos.manhattan_distance(goal_pos));
                open.push(Reverse((estimate, neighbor)));
            }
        }
    }

    None
}

fn reconstruct(
    graph: &Graph,
    came_from: &HashMap<NodeId, EdgeId>,
    start: NodeId,
    goal: NodeId,
) -> Vec<EdgeId> {
    let mut path = Vec::new();
    let mut node = goal;
    while node != start {
        let Some(edge_id) = came_from.get(&node).copied() else {
            break;
        };
        path.push(edge_id);
        let Some(edge) = graph.edge(edge_id) else {
            break;
        };
        node = edge.other(node);
    }
    path.reverse();

    // Keep only edges departing square nodes; movement crosses joints on
    // its own.
    let mut kept = Vec::with_capacity(path.len());
    let mut node = start;
    for edge_id in path {
        let departs_square = graph
            .node(node)
            .is_some_and(|current| current.kind == NodeKind::Square);
        if departs_square {
            kept.push(edge_id);
        }
        if let Some(edge) = graph.edge(edge_id) {
            node = edge.other(node);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire_tracer_core::Vec2i;

    fn square(graph: &mut Graph, x: i32, y: i32) -> NodeId {
        graph.create_node(Vec2i::new(x, y), NodeKind::Square).id
    }

    #[test]
    fn finds_the_cheapest_route() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);
        let c = square(&mut graph, 100, 100);
        let d = square(&mut graph, 0, 100);
        let ab = graph.connect(a, b, false).expect("connect");
        let bc = graph.connect(b, c, false).expect("connect");
        let _ad = graph.connect(a, d, false).expect("connect");
        // Long way round through an extra detour node.
        let e = square(&mut graph, 0, 300);
        let _de = graph.connect(d, e, false).expect("connect");

        let path = shortest_path(&graph, a, c).expect("path exists");
        assert_eq!(path, vec![ab, bc]);
    }

    #[test]
    fn one_way_edges_block_reverse_expansion() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 0);
        let ab = graph.connect(a, b, true).expect("connect");

        assert_eq!(shortest_path(&graph, a, b), Some(vec![ab]));
        assert_eq!(shortest_path(&graph, b, a), None);
    }

    #[test]
    fn start_equals_goal_yields_an_empty_path() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let path = shortest_path(&graph, a, a).expect("trivially reachable");
        assert!(path.is_empty());
    }

    #[test]
    fn unknown_nodes_yield_no_path() {
        let graph = Graph::new();
        assert_eq!(
            shortest_path(&graph, NodeId::new(1), NodeId::new(2)),
            None
        );
    }

    #[test]
    fn joint_legs_are_collapsed_in_the_report() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 100, 100);
        let outcome = graph
            .connect_with_joint(a, b, false, false)
            .expect("connect");
        assert_eq!(outcome.edges.len(), 2);

        let path = shortest_path(&graph, a, b).expect("path exists");
        assert_eq!(path, vec![outcome.edges[0]]);
    }

    #[test]
    fn equal_cost_routes_break_toward_the_lowest_node_id() {
        // Two symmetric L-shaped routes of identical length; the route
        // through the earlier-created corner must win every time.
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let upper = square(&mut graph, 100, 0);
        let lower = square(&mut graph, 0, 100);
        let b = square(&mut graph, 100, 100);
        let a_upper = graph.connect(a, upper, false).expect("connect");
        let _a_lower = graph.connect(a, lower, false).expect("connect");
        let upper_b = graph.connect(upper, b, false).expect("connect");
        let _lower_b = graph.connect(lower, b, false).expect("connect");

        for _ in 0..8 {
            let path = shortest_path(&graph, a, b).expect("path exists");
            assert_eq!(path, vec![a_upper, upper_b]);
        }
    }

    #[test]
    fn path_cost_equals_the_manhattan_optimum() {
        let mut graph = Graph::new();
        let a = square(&mut graph, 0, 0);
        let b = square(&mut graph, 60, 0);
        let c = square(&mut graph, 60, 80);
        let ab = graph.connect(a, b, false).expect("connect");
        let bc = graph.connect(b, c, false).expect("connect");

        let path = shortest_path(&graph, a, c).expect("path exists");
        let cost: u32 = path
            .iter()
            .map(|id| graph.edge(*id).expect("edge").length)
            .sum();
        assert_eq!(path, vec![ab, bc]);
        assert_eq!(cost, 140);
    }
}
