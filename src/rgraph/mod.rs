//! 可达图：以标识为内容寻址的去重有向多重图.
//!
//! Nodes and edges live in id-keyed arenas and reference each other only by
//! id, so the whole graph can be snapshotted by cloning the tables. Node
//! identity is derived from the marking's canonical text and edge identity
//! from (transition, source, target): re-firing into an already seen marking
//! folds back into the existing node instead of growing the graph, which is
//! what keeps an infinite firing sequence representable.

mod memento;

pub use memento::RGraphMemento;

use std::fmt;

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::events::{EdgeFlag, EventSink, NodeFlag, NoopSink, RGraphEvent};
use crate::net::ids::{EdgeId, NodeId, TransitionId};
use crate::net::index_vec::IndexVec;
use crate::net::structure::Marking;

type EdgeKey = (TransitionId, NodeId, NodeId);
type AdjacencyList = SmallVec<[EdgeId; 4]>;

/// One discovered marking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RGraphNode {
    label: String,
    marking: Marking,
    inbound: AdjacencyList,
    outbound: AdjacencyList,
    remaining_active: IndexSet<TransitionId>,
    root: bool,
    last_firing: bool,
    unbounded_cause: bool,
    dominated_marking: bool,
    dominating_marking: bool,
}

impl RGraphNode {
    fn new(marking: Marking, active: &[TransitionId], root: bool) -> Self {
        Self {
            label: marking.label(),
            marking,
            inbound: AdjacencyList::new(),
            outbound: AdjacencyList::new(),
            remaining_active: active.iter().copied().collect(),
            root,
            last_firing: false,
            unbounded_cause: false,
            dominated_marking: false,
            dominating_marking: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Active transitions not yet fired from this marking; shrinks as
    /// firings are recorded.
    pub fn remaining_active(&self) -> impl Iterator<Item = TransitionId> + '_ {
        self.remaining_active.iter().copied()
    }

    pub fn is_last_firing(&self) -> bool {
        self.last_firing
    }

    pub fn is_unbounded_cause(&self) -> bool {
        self.unbounded_cause
    }

    pub fn is_dominated_marking(&self) -> bool {
        self.dominated_marking
    }

    pub fn is_dominating_marking(&self) -> bool {
        self.dominating_marking
    }

    fn flag_mut(&mut self, flag: NodeFlag) -> &mut bool {
        match flag {
            NodeFlag::LastFiring => &mut self.last_firing,
            NodeFlag::UnboundedCause => &mut self.unbounded_cause,
            NodeFlag::DominatedMarking => &mut self.dominated_marking,
            NodeFlag::DominatingMarking => &mut self.dominating_marking,
        }
    }
}

/// One recorded firing between two markings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RGraphEdge {
    transition: TransitionId,
    transition_name: String,
    source: NodeId,
    target: NodeId,
    last_firing: bool,
    unbounded_cause: bool,
}

impl RGraphEdge {
    pub fn transition(&self) -> TransitionId {
        self.transition
    }

    pub fn transition_name(&self) -> &str {
        &self.transition_name
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_last_firing(&self) -> bool {
        self.last_firing
    }

    pub fn is_unbounded_cause(&self) -> bool {
        self.unbounded_cause
    }

    fn flag_mut(&mut self, flag: EdgeFlag) -> &mut bool {
        match flag {
            EdgeFlag::LastFiring => &mut self.last_firing,
            EdgeFlag::UnboundedCause => &mut self.unbounded_cause,
        }
    }
}

/// Incrementally discovered reachability graph.
pub struct ReachabilityGraph {
    nodes: IndexVec<NodeId, RGraphNode>,
    edges: IndexVec<EdgeId, RGraphEdge>,
    node_by_marking: FxHashMap<Marking, NodeId>,
    edge_by_key: FxHashMap<EdgeKey, EdgeId>,
    sink: Box<dyn EventSink>,
}

impl ReachabilityGraph {
    pub fn new() -> Self {
        Self {
            nodes: IndexVec::new(),
            edges: IndexVec::new(),
            node_by_marking: FxHashMap::default(),
            edge_by_key: FxHashMap::default(),
            sink: Box::new(NoopSink),
        }
    }

    pub fn set_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    fn emit(&self, event: RGraphEvent) {
        self.sink.rgraph_event(&event);
    }

    // --- construction --------------------------------------------------

    /// Seeds the root node; a no-op once the graph holds anything.
    pub fn add_initial_marking(&mut self, marking: Marking, active: &[TransitionId]) {
        if self.nodes.is_empty() {
            self.add_node(marking, active, true);
        }
    }

    /// Records one firing of `transition` from `old` to `new`.
    ///
    /// The target node is looked up or created; the edge is created unless
    /// the same firing was seen before, in which case the existing edge id
    /// is returned only when `return_existing` is set; `None` tells a
    /// caller that nothing new happened. Recording removes the transition
    /// from the source node's remaining-active set.
    pub fn record_firing(
        &mut self,
        transition: TransitionId,
        transition_name: &str,
        old: &Marking,
        new: &Marking,
        active_at_new: &[TransitionId],
        return_existing: bool,
    ) -> Option<EdgeId> {
        let source = *self
            .node_by_marking
            .get(old)
            .expect("the source marking must already be recorded");
        let target = match self.node_by_marking.get(new) {
            Some(&node) => node,
            None => self.add_node(new.clone(), active_at_new, false),
        };
        let key = (transition, source, target);
        if let Some(&edge) = self.edge_by_key.get(&key) {
            return return_existing.then_some(edge);
        }
        let edge = self.edges.push(RGraphEdge {
            transition,
            transition_name: transition_name.to_owned(),
            source,
            target,
            last_firing: false,
            unbounded_cause: false,
        });
        self.edge_by_key.insert(key, edge);
        self.nodes[source].outbound.push(edge);
        self.nodes[target].inbound.push(edge);
        self.nodes[source].remaining_active.shift_remove(&transition);
        self.emit(RGraphEvent::EdgeAdded { edge });
        log::debug!(
            "recorded firing {}: {} -> {}",
            transition_name,
            self.nodes[source].label,
            self.nodes[target].label
        );
        Some(edge)
    }

    /// Drops the whole graph and seeds a fresh root, as required after the
    /// net's initial marking changed.
    pub fn reinitialize(&mut self, marking: Marking, active: &[TransitionId]) {
        for edge in self.edges.indices() {
            self.emit(RGraphEvent::EdgeRemoved { edge });
        }
        for (node, data) in self.nodes.iter_enumerated() {
            self.sink.rgraph_event(&RGraphEvent::NodeRemoved {
                node,
                label: data.label.clone(),
            });
        }
        self.nodes.clear();
        self.edges.clear();
        self.node_by_marking.clear();
        self.edge_by_key.clear();
        self.add_node(marking, active, true);
    }

    fn add_node(&mut self, marking: Marking, active: &[TransitionId], root: bool) -> NodeId {
        debug_assert!(!self.node_by_marking.contains_key(&marking));
        let node = self
            .nodes
            .push(RGraphNode::new(marking.clone(), active, root));
        self.node_by_marking.insert(marking, node);
        self.emit(RGraphEvent::NodeAdded { node });
        node
    }

    // --- lookups -------------------------------------------------------

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn initial_node(&self) -> Option<NodeId> {
        self.nodes
            .iter_enumerated()
            .find_map(|(node, data)| data.root.then_some(node))
    }

    pub fn node(&self, node: NodeId) -> &RGraphNode {
        &self.nodes[node]
    }

    pub fn edge(&self, edge: EdgeId) -> &RGraphEdge {
        &self.edges[edge]
    }

    pub fn node_marking(&self, node: NodeId) -> &Marking {
        &self.nodes[node].marking
    }

    pub fn node_label(&self, node: NodeId) -> &str {
        &self.nodes[node].label
    }

    pub fn node_for_marking(&self, marking: &Marking) -> Option<NodeId> {
        self.node_by_marking.get(marking).copied()
    }

    pub fn inbound_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node].inbound
    }

    pub fn outbound_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node].outbound
    }

    pub fn edge_source(&self, edge: EdgeId) -> NodeId {
        self.edges[edge].source
    }

    pub fn edge_target(&self, edge: EdgeId) -> NodeId {
        self.edges[edge].target
    }

    pub fn edge_transition(&self, edge: EdgeId) -> TransitionId {
        self.edges[edge].transition
    }

    // --- highlighting --------------------------------------------------

    /// Moves the exclusive last-firing highlight onto the node and edge
    /// representing the given firing.
    pub fn highlight_firing(&mut self, transition: TransitionId, old: &Marking, new: &Marking) {
        let (Some(source), Some(target)) =
            (self.node_for_marking(old), self.node_for_marking(new))
        else {
            debug_assert!(false, "both endpoint markings must be recorded");
            return;
        };
        let edge = self.edge_by_key.get(&(transition, source, target)).copied();
        for node in self.nodes.indices().collect::<Vec<_>>() {
            self.set_node_flag(node, NodeFlag::LastFiring, node == target);
        }
        for candidate in self.edges.indices().collect::<Vec<_>>() {
            self.set_edge_flag(candidate, EdgeFlag::LastFiring, Some(candidate) == edge);
        }
    }

    /// Flags the witness for an unbounded verdict: every edge on `path` and
    /// its source node, the final edge's target node, and the dominated /
    /// dominating pair. Any previous witness is cleared first.
    pub fn mark_unbounded_cause(&mut self, path: &[EdgeId], dominated: NodeId, dominating: NodeId) {
        for node in self.nodes.indices().collect::<Vec<_>>() {
            self.set_node_flag(node, NodeFlag::UnboundedCause, false);
            self.set_node_flag(node, NodeFlag::DominatedMarking, false);
            self.set_node_flag(node, NodeFlag::DominatingMarking, false);
        }
        for edge in self.edges.indices().collect::<Vec<_>>() {
            self.set_edge_flag(edge, EdgeFlag::UnboundedCause, false);
        }
        for (idx, &edge) in path.iter().enumerate() {
            let source = self.edges[edge].source;
            self.set_edge_flag(edge, EdgeFlag::UnboundedCause, true);
            self.set_node_flag(source, NodeFlag::UnboundedCause, true);
            if idx == path.len() - 1 {
                let target = self.edges[edge].target;
                self.set_node_flag(target, NodeFlag::UnboundedCause, true);
            }
        }
        self.set_node_flag(dominated, NodeFlag::DominatedMarking, true);
        self.set_node_flag(dominating, NodeFlag::DominatingMarking, true);
    }

    fn set_node_flag(&mut self, node: NodeId, flag: NodeFlag, value: bool) {
        let old = std::mem::replace(self.nodes[node].flag_mut(flag), value);
        if old != value {
            self.emit(RGraphEvent::NodeFlagChanged {
                node,
                flag,
                old,
                new: value,
            });
        }
    }

    fn set_edge_flag(&mut self, edge: EdgeId, flag: EdgeFlag, value: bool) {
        let old = std::mem::replace(self.edges[edge].flag_mut(flag), value);
        if old != value {
            self.emit(RGraphEvent::EdgeFlagChanged {
                edge,
                flag,
                old,
                new: value,
            });
        }
    }
}

impl Default for ReachabilityGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReachabilityGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReachabilityGraph")
            .field("nodes", &self.nodes)
            .field("edges", &self.edges)
            .finish()
    }
}
