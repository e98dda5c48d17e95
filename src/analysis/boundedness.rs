//! Petri网无界性判定
//!
//! 从新发现的标识 m' 出发沿入边回溯，检查是否存在祖先标识 m 满足：
//! 1. m' 给每个库所分配的标记数都不少于 m；
//! 2. m' 至少给一个库所分配了更多的标记.
//!
//! 两个条件同时成立（即分量偏序下 m < m'）时，从 m 到 m' 的发生序列可以
//! 无限重复并使标记数无限增长，网因此无界.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::net::ids::{EdgeId, NodeId};
use crate::rgraph::ReachabilityGraph;

/// Decision procedure for one node of the reachability graph.
///
/// A `Some` result is a proof of unboundedness; `None` only says that no
/// ancestor of the examined node is dominated by it, nothing about the rest
/// of the net.
pub struct BoundednessAnalyzer<'a> {
    graph: &'a ReachabilityGraph,
}

impl<'a> BoundednessAnalyzer<'a> {
    pub fn new(graph: &'a ReachabilityGraph) -> Self {
        Self { graph }
    }

    /// Searches backward from `target` (the marking m') for a dominated
    /// ancestor and returns the edges from that ancestor to `target` in
    /// forward order.
    ///
    /// Depth-first over inbound edges in their stored order, each node
    /// visited at most once; the first dominated ancestor ends the search.
    /// An explicit stack keeps arbitrarily deep graphs from exhausting call
    /// frames.
    pub fn run(&self, target: NodeId) -> Option<Vec<EdgeId>> {
        let target_marking = self.graph.node_marking(target);
        log::debug!(
            "starting unboundedness analysis at m' = {}",
            self.graph.node_label(target)
        );

        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        visited.insert(target);
        // edge through which each ancestor was discovered, pointing towards
        // the target; the witness path is read off this chain
        let mut discovery: FxHashMap<NodeId, EdgeId> = FxHashMap::default();
        let mut stack: Vec<(NodeId, usize)> = vec![(target, 0)];

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let inbound = self.graph.inbound_edges(node);
            if next >= inbound.len() {
                log::trace!("no further inbound edges at {}", self.graph.node_label(node));
                stack.pop();
                continue;
            }
            frame.1 += 1;

            let edge = inbound[next];
            let ancestor = self.graph.edge_source(edge);
            if !visited.insert(ancestor) {
                continue;
            }
            discovery.insert(ancestor, edge);
            log::trace!("visiting ancestor m = {}", self.graph.node_label(ancestor));

            if self.graph.node_marking(ancestor) < target_marking {
                log::debug!(
                    "unboundedness detected: {} is dominated by {}",
                    self.graph.node_label(ancestor),
                    self.graph.node_label(target)
                );
                return Some(self.chain_to_target(&discovery, ancestor));
            }
            stack.push((ancestor, 0));
        }

        log::debug!("no dominated ancestor of {}", self.graph.node_label(target));
        None
    }

    /// Walks the discovery chain from the dominated ancestor back to the
    /// analysis target, yielding the edge path in firing order.
    fn chain_to_target(&self, discovery: &FxHashMap<NodeId, EdgeId>, from: NodeId) -> Vec<EdgeId> {
        let mut path = Vec::new();
        let mut current = from;
        while let Some(&edge) = discovery.get(&current) {
            path.push(edge);
            current = self.graph.edge_target(edge);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ids::TransitionId;
    use crate::net::index_vec::IndexVec;
    use crate::net::structure::{Marking, Weight};

    fn marking(tokens: &[Weight]) -> Marking {
        Marking::new(IndexVec::from(tokens.to_vec()))
    }

    fn t(raw: u32) -> TransitionId {
        TransitionId::new(raw)
    }

    /// (1|0) --t0--> (1|1) 的生成网可达图片段.
    fn growing_graph() -> ReachabilityGraph {
        let mut graph = ReachabilityGraph::new();
        graph.add_initial_marking(marking(&[1, 0]), &[t(0)]);
        graph.record_firing(t(0), "t0", &marking(&[1, 0]), &marking(&[1, 1]), &[t(0)], false);
        graph
    }

    #[test]
    fn dominated_ancestor_yields_a_forward_path() {
        let graph = growing_graph();
        let top = graph.node_for_marking(&marking(&[1, 1])).unwrap();

        let path = BoundednessAnalyzer::new(&graph).run(top).unwrap();

        assert_eq!(path.len(), 1);
        assert_eq!(graph.edge_source(path[0]), graph.initial_node().unwrap());
        assert_eq!(graph.edge_target(path[0]), top);
    }

    #[test]
    fn path_spans_multiple_firings_in_order() {
        let mut graph = growing_graph();
        graph.record_firing(t(0), "t0", &marking(&[1, 1]), &marking(&[1, 2]), &[t(0)], false);
        let top = graph.node_for_marking(&marking(&[1, 2])).unwrap();

        let path = BoundednessAnalyzer::new(&graph).run(top).unwrap();

        // the deepest dominated ancestor found first is (1|1); its path to
        // the target is the single last firing
        assert_eq!(path.len(), 1);
        assert_eq!(
            graph.node_label(graph.edge_source(path[0])),
            "(1|1)"
        );
    }

    #[test]
    fn incomparable_ancestors_are_not_witnesses() {
        let mut graph = ReachabilityGraph::new();
        graph.add_initial_marking(marking(&[1, 0]), &[t(0)]);
        graph.record_firing(t(0), "t0", &marking(&[1, 0]), &marking(&[0, 1]), &[], false);
        let target = graph.node_for_marking(&marking(&[0, 1])).unwrap();

        assert_eq!(BoundednessAnalyzer::new(&graph).run(target), None);
    }

    #[test]
    fn self_loop_terminates_without_witness() {
        let mut graph = ReachabilityGraph::new();
        graph.add_initial_marking(marking(&[1]), &[t(0)]);
        graph.record_firing(t(0), "t0", &marking(&[1]), &marking(&[1]), &[t(0)], false);
        let root = graph.initial_node().unwrap();

        assert_eq!(BoundednessAnalyzer::new(&graph).run(root), None);
    }

    #[test]
    fn cycle_below_the_target_is_searched_once() {
        let mut graph = ReachabilityGraph::new();
        graph.add_initial_marking(marking(&[1, 0, 0]), &[t(0)]);
        // (1|0|0) <-> (0|1|0), then escape to a dominating (1|1|0)
        graph.record_firing(t(0), "t0", &marking(&[1, 0, 0]), &marking(&[0, 1, 0]), &[t(1)], false);
        graph.record_firing(t(1), "t1", &marking(&[0, 1, 0]), &marking(&[1, 0, 0]), &[t(0)], false);
        graph.record_firing(t(2), "t2", &marking(&[0, 1, 0]), &marking(&[1, 1, 0]), &[], false);
        let top = graph.node_for_marking(&marking(&[1, 1, 0])).unwrap();

        let path = BoundednessAnalyzer::new(&graph).run(top).unwrap();

        let start = graph.edge_source(path[0]);
        assert!(graph.node_marking(start) < graph.node_marking(top));
        assert_eq!(graph.edge_target(*path.last().unwrap()), top);
    }
}
