//! Undo/redo bookkeeping over paired model snapshots.

use crate::net::core::{Net, NetMemento};
use crate::rgraph::{RGraphMemento, ReachabilityGraph};

/// Keeps the undo and redo stacks for one net / reachability graph pair.
///
/// Snapshots are taken and restored strictly together; rolling only one of
/// the two models back would tear their shared history apart.
#[derive(Debug, Default)]
pub struct Caretaker {
    undo_stack: Vec<(NetMemento, RGraphMemento)>,
    redo_stack: Vec<(NetMemento, RGraphMemento)>,
}

impl Caretaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves the current state before an action that starts a new
    /// undo/redo continuum; any redoable future is discarded.
    pub fn save(&mut self, net: &Net, graph: &ReachabilityGraph) {
        self.undo_stack.push((net.save_state(), graph.save_state()));
        self.redo_stack.clear();
    }

    /// Rolls both models back one step; `false` when there is nothing to
    /// undo.
    pub fn undo(&mut self, net: &mut Net, graph: &mut ReachabilityGraph) -> bool {
        let Some((net_memento, graph_memento)) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push((net.save_state(), graph.save_state()));
        net.restore_state(&net_memento);
        graph.restore_state(&graph_memento);
        true
    }

    /// Re-applies the most recently undone step; `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self, net: &mut Net, graph: &mut ReachabilityGraph) -> bool {
        let Some((net_memento, graph_memento)) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push((net.save_state(), graph.save_state()));
        net.restore_state(&net_memento);
        graph.restore_state(&graph_memento);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forgets all history, e.g. when a different net file is loaded.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fire_and_record;

    fn producer() -> (Net, ReachabilityGraph) {
        let mut net = Net::new();
        net.add_place("p1").unwrap();
        net.add_transition("t1").unwrap();
        net.add_arc("a1", "t1", "p1").unwrap();
        net.check_all_transition_states();
        let mut graph = ReachabilityGraph::new();
        graph.add_initial_marking(net.initial_marking(), &net.active_transition_ids());
        (net, graph)
    }

    #[test]
    fn undo_then_redo_replays_a_firing() {
        let (mut net, mut graph) = producer();
        let t1 = net.transition_id("t1").unwrap();
        let mut caretaker = Caretaker::new();

        caretaker.save(&net, &graph);
        fire_and_record(&mut net, &mut graph, t1, false).unwrap();
        assert_eq!(graph.node_count(), 2);

        assert!(caretaker.undo(&mut net, &mut graph));
        assert_eq!(net.actual_marking().label(), "(0)");
        assert_eq!(graph.node_count(), 1);
        assert!(caretaker.can_redo());

        assert!(caretaker.redo(&mut net, &mut graph));
        assert_eq!(net.actual_marking().label(), "(1)");
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn saving_discards_the_redo_stack() {
        let (mut net, mut graph) = producer();
        let t1 = net.transition_id("t1").unwrap();
        let mut caretaker = Caretaker::new();

        caretaker.save(&net, &graph);
        fire_and_record(&mut net, &mut graph, t1, false).unwrap();
        caretaker.undo(&mut net, &mut graph);

        caretaker.save(&net, &graph);
        fire_and_record(&mut net, &mut graph, t1, false).unwrap();

        assert!(!caretaker.can_redo());
        assert!(!caretaker.redo(&mut net, &mut graph));
    }

    #[test]
    fn undo_on_an_empty_stack_is_refused() {
        let (mut net, mut graph) = producer();
        let mut caretaker = Caretaker::new();

        assert!(!caretaker.undo(&mut net, &mut graph));
        assert!(!caretaker.can_undo());
    }
}
