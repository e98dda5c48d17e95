//! Exhaustive depth-first exploration of the reachable markings.
//!
//! 模拟算法：从初始标识出发，对每个标识把所有激活迁移各发生一次，
//! 每进入一个新标识先做一次无界性判定；回溯时恢复进入该标识时的标识.

use crate::analysis::boundedness::BoundednessAnalyzer;
use crate::analysis::path::PathFinder;
use crate::net::core::Net;
use crate::net::ids::{EdgeId, NodeId, TransitionId};
use crate::net::structure::Marking;
use crate::rgraph::ReachabilityGraph;

/// Proof that the net is unbounded: repeating the firing sequence between
/// the dominated and the dominating marking grows some place forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    /// Edges from the graph root through the dominated marking to the
    /// dominating one.
    pub edge_path: Vec<EdgeId>,
    pub dominated: NodeId,
    pub dominating: NodeId,
}

/// Outcome of one exhaustive exploration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Bounded { node_count: usize, edge_count: usize },
    Unbounded { witness: Witness },
}

impl Verdict {
    pub fn is_bounded(&self) -> bool {
        matches!(self, Verdict::Bounded { .. })
    }
}

struct Frame {
    marking: Marking,
    active: Vec<TransitionId>,
    next: usize,
}

/// Drives the token game until either every reachable marking has fired all
/// of its active transitions exactly once, or a domination witness aborts
/// the exploration.
///
/// Terminates on every net: a bounded net has finitely many markings, and
/// on an unbounded net the analyzer recognizes growth before any infinite
/// branch can unfold (edge deduplication stops revisits of known firings).
pub struct SimulationEngine;

impl SimulationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, net: &mut Net, graph: &mut ReachabilityGraph) -> Verdict {
        let root = graph
            .initial_node()
            .expect("the reachability graph must hold the initial marking");
        log::info!("starting simulation at {}", graph.node_label(root));

        // align the net with the root in case a manual firing moved it
        let root_marking = graph.node_marking(root).clone();
        net.set_actual_marking(&root_marking);

        if let Some(path) = BoundednessAnalyzer::new(graph).run(root) {
            return Self::unbounded(graph, path);
        }
        let mut stack = vec![Frame {
            marking: root_marking,
            active: net.active_transition_ids(),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.next >= frame.active.len() {
                log::debug!("no remaining active transitions at {}", frame.marking.label());
                let marking = frame.marking.clone();
                stack.pop();
                net.set_actual_marking(&marking);
                continue;
            }
            let transition = frame.active[frame.next];
            frame.next += 1;

            // siblings always start from the marking this frame was entered
            // with
            let base = frame.marking.clone();
            net.set_actual_marking(&base);

            if let Some(edge) = fire_and_record(net, graph, transition, false) {
                let node = graph.edge_target(edge);
                if let Some(path) = BoundednessAnalyzer::new(graph).run(node) {
                    log::info!("aborting exploration: unboundedness detected");
                    return Self::unbounded(graph, path);
                }
                stack.push(Frame {
                    marking: net.actual_marking(),
                    active: net.active_transition_ids(),
                    next: 0,
                });
            }
        }

        let verdict = Verdict::Bounded {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
        };
        log::info!(
            "exploration exhausted: {} markings, {} firings",
            graph.node_count(),
            graph.edge_count()
        );
        verdict
    }

    /// Builds the full witness (root prefix plus analyzer path) and pushes
    /// the highlight onto the graph.
    fn unbounded(graph: &mut ReachabilityGraph, path: Vec<EdgeId>) -> Verdict {
        let first = *path.first().expect("a witness path is never empty");
        let last = *path.last().expect("a witness path is never empty");
        let dominated = graph.edge_source(first);
        let dominating = graph.edge_target(last);

        let mut edge_path = PathFinder::new(graph).run(dominated).unwrap_or_default();
        edge_path.extend(path);
        graph.mark_unbounded_cause(&edge_path, dominated, dominating);

        Verdict::Unbounded {
            witness: Witness {
                edge_path,
                dominated,
                dominating,
            },
        }
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Fires one transition on the net and mirrors the outcome into the graph:
/// the building block for both the exploration loop and manual stepping.
///
/// Returns the recorded edge, or `None` when the transition was inactive or
/// (with `return_existing` unset) the firing was already known.
pub fn fire_and_record(
    net: &mut Net,
    graph: &mut ReachabilityGraph,
    transition: TransitionId,
    return_existing: bool,
) -> Option<EdgeId> {
    let old = net.actual_marking();
    let new = net.fire(transition)?;
    let name = net.transition_name(transition).to_owned();
    let edge = graph.record_firing(
        transition,
        &name,
        &old,
        &new,
        &net.active_transition_ids(),
        return_existing,
    );
    graph.highlight_firing(transition, &old, &new);
    edge
}
