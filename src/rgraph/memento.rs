//! Snapshot and restore for the reachability graph.
//!
//! The arenas are append-only between snapshots, so the structural
//! difference between the live graph and a memento is always a suffix of
//! each table. The exception: the net's initial marking changed while the
//! graph held only its root, in which case that root is swapped out first.

use rustc_hash::FxHashMap;

use crate::events::RGraphEvent;
use crate::net::ids::{EdgeId, NodeId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::Marking;
use crate::rgraph::{RGraphEdge, RGraphNode, ReachabilityGraph};

/// Deep value copy of the full node and edge collections. Opaque to
/// callers; see [`ReachabilityGraph::restore_state`].
#[derive(Debug, Clone)]
pub struct RGraphMemento {
    nodes: IndexVec<NodeId, RGraphNode>,
    edges: IndexVec<EdgeId, RGraphEdge>,
    node_by_marking: FxHashMap<Marking, NodeId>,
    edge_by_key: FxHashMap<(TransitionId, NodeId, NodeId), EdgeId>,
}

impl ReachabilityGraph {
    pub fn save_state(&self) -> RGraphMemento {
        RGraphMemento {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            node_by_marking: self.node_by_marking.clone(),
            edge_by_key: self.edge_by_key.clone(),
        }
    }

    /// Rolls the graph back to a previously saved state.
    ///
    /// Structural differences are reconciled first: elements added since
    /// the snapshot are deleted, elements removed since are recreated, with
    /// the matching events. Afterwards every surviving element is overwritten
    /// with its snapshotted value, highlight flags included.
    pub fn restore_state(&mut self, saved: &RGraphMemento) {
        let mut live_nodes = self.nodes.len();

        // A lone root whose label differs from the snapshot's root means the
        // initial marking changed in between; the current root goes away and
        // the snapshot's nodes are recreated below.
        if live_nodes == 1 && !saved.nodes.is_empty() {
            let root = NodeId::from_usize(0);
            if self.nodes[root].label() != saved.nodes[root].label() {
                self.emit(RGraphEvent::NodeRemoved {
                    node: root,
                    label: self.nodes[root].label().to_owned(),
                });
                live_nodes = 0;
            }
        }

        for idx in saved.edges.len()..self.edges.len() {
            self.emit(RGraphEvent::EdgeRemoved {
                edge: EdgeId::from_usize(idx),
            });
        }
        for idx in saved.nodes.len()..live_nodes {
            let node = NodeId::from_usize(idx);
            self.emit(RGraphEvent::NodeRemoved {
                node,
                label: self.nodes[node].label().to_owned(),
            });
        }
        for idx in live_nodes..saved.nodes.len() {
            self.emit(RGraphEvent::NodeAdded {
                node: NodeId::from_usize(idx),
            });
        }
        for idx in self.edges.len()..saved.edges.len() {
            self.emit(RGraphEvent::EdgeAdded {
                edge: EdgeId::from_usize(idx),
            });
        }

        self.nodes = saved.nodes.clone();
        self.edges = saved.edges.clone();
        self.node_by_marking = saved.node_by_marking.clone();
        self.edge_by_key = saved.edge_by_key.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, RecordingSink};
    use crate::net::structure::Weight;

    fn marking(tokens: &[Weight]) -> Marking {
        Marking::new(IndexVec::from(tokens.to_vec()))
    }

    fn t(raw: u32) -> TransitionId {
        TransitionId::new(raw)
    }

    fn graph_with_root() -> ReachabilityGraph {
        let mut graph = ReachabilityGraph::new();
        graph.add_initial_marking(marking(&[1, 0]), &[t(0)]);
        graph
    }

    #[test]
    fn immediate_restore_is_a_no_op() {
        let mut graph = graph_with_root();
        graph.record_firing(t(0), "t0", &marking(&[1, 0]), &marking(&[0, 1]), &[], false);

        let saved = graph.save_state();
        let sink = RecordingSink::new();
        graph.set_event_sink(Box::new(sink.clone()));
        graph.restore_state(&saved);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn restore_deletes_elements_added_after_the_snapshot() {
        let mut graph = graph_with_root();
        let saved = graph.save_state();

        graph.record_firing(t(0), "t0", &marking(&[1, 0]), &marking(&[0, 1]), &[], false);
        let sink = RecordingSink::new();
        graph.set_event_sink(Box::new(sink.clone()));

        graph.restore_state(&saved);

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_for_marking(&marking(&[0, 1])), None);
        let events = sink.take();
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Graph(RGraphEvent::EdgeRemoved { .. }))));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Graph(RGraphEvent::NodeRemoved { .. }))));
    }

    #[test]
    fn restore_recreates_elements_removed_since_the_snapshot() {
        let mut graph = graph_with_root();
        graph.record_firing(t(0), "t0", &marking(&[1, 0]), &marking(&[0, 1]), &[], false);
        let full = graph.save_state();

        // roll back to the bare root, then forward again
        let bare = graph_with_root().save_state();
        graph.restore_state(&bare);
        assert_eq!(graph.node_count(), 1);

        graph.restore_state(&full);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let target = graph.node_for_marking(&marking(&[0, 1])).unwrap();
        assert_eq!(graph.inbound_edges(target).len(), 1);
    }

    #[test]
    fn restore_swaps_a_lone_root_with_a_changed_marking() {
        let mut graph = graph_with_root();
        let saved = graph.save_state();

        // initial marking changed: the graph was reinitialized
        graph.reinitialize(marking(&[9, 9]), &[]);
        let sink = RecordingSink::new();
        graph.set_event_sink(Box::new(sink.clone()));

        graph.restore_state(&saved);

        assert_eq!(graph.node_count(), 1);
        let root = graph.initial_node().unwrap();
        assert_eq!(graph.node_label(root), "(1|0)");
        assert_eq!(graph.node_for_marking(&marking(&[9, 9])), None);
        let events = sink.take();
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Graph(RGraphEvent::NodeRemoved { .. }))));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Graph(RGraphEvent::NodeAdded { .. }))));
    }

    #[test]
    fn restore_overwrites_highlight_flags() {
        let mut graph = graph_with_root();
        let e0 = graph
            .record_firing(t(0), "t0", &marking(&[1, 0]), &marking(&[0, 1]), &[], false)
            .unwrap();
        let saved = graph.save_state();

        let root = graph.initial_node().unwrap();
        let target = graph.node_for_marking(&marking(&[0, 1])).unwrap();
        graph.mark_unbounded_cause(&[e0], root, target);
        assert!(graph.edge(e0).is_unbounded_cause());

        graph.restore_state(&saved);
        assert!(!graph.edge(e0).is_unbounded_cause());
        assert!(!graph.node(root).is_dominated_marking());
    }
}
