//! Breadth-first shortest path from the graph root to an arbitrary node.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::net::ids::{EdgeId, NodeId};
use crate::rgraph::ReachabilityGraph;

/// Shortest-path reconstruction (by edge count) over the reachability
/// graph, used to prefix a witness path that does not start at the root.
pub struct PathFinder<'a> {
    graph: &'a ReachabilityGraph,
}

impl<'a> PathFinder<'a> {
    pub fn new(graph: &'a ReachabilityGraph) -> Self {
        Self { graph }
    }

    /// Edges of a shortest path from the root to `target`; empty when the
    /// target is the root itself, `None` when the target is unreached
    /// (which cannot happen for nodes discovered through firings).
    pub fn run(&self, target: NodeId) -> Option<Vec<EdgeId>> {
        let root = self.graph.initial_node()?;

        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        // first-discovery edges; one inbound tree edge per reached node
        let mut spanning_tree: Vec<EdgeId> = Vec::new();
        visited.insert(root);
        queue.push_back(root);

        let mut found = false;
        while let Some(node) = queue.pop_front() {
            if node == target {
                found = true;
                break;
            }
            for &edge in self.graph.outbound_edges(node) {
                let next = self.graph.edge_target(edge);
                if visited.insert(next) {
                    queue.push_back(next);
                    spanning_tree.push(edge);
                }
            }
        }
        if !found {
            return None;
        }
        Some(self.edge_path(spanning_tree, root, target))
    }

    /// Walks the spanning tree backward from target to root; consumed edges
    /// leave the candidate set so parallel inbound edges cannot be picked
    /// twice.
    fn edge_path(&self, mut spanning_tree: Vec<EdgeId>, root: NodeId, target: NodeId) -> Vec<EdgeId> {
        let mut path = Vec::new();
        let mut current = target;
        while current != root {
            let position = spanning_tree
                .iter()
                .position(|&edge| self.graph.edge_target(edge) == current)
                .expect("every discovered node has a spanning tree edge");
            let edge = spanning_tree.remove(position);
            path.push(edge);
            current = self.graph.edge_source(edge);
        }
        path.reverse();
        path
    }
}
