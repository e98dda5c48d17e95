//! Change notification for the net and reachability graph models.
//!
//! Both models own a single [`EventSink`] and push discrete, named change
//! events into it. Events carry the old and the new value and are emitted
//! only when the two differ, so a sink never sees a redundant notification.

use std::cell::RefCell;
use std::rc::Rc;

use crate::net::ids::{ArcId, EdgeId, NodeId, PlaceId, TransitionId};
use crate::net::structure::{NetNode, Position, Weight};

/// Property changes of the live net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    PlaceAdded { place: PlaceId },
    TransitionAdded { transition: TransitionId },
    ArcAdded { arc: ArcId },
    TokensChanged { place: PlaceId, old: Weight, new: Weight },
    InitialTokensChanged { place: PlaceId, old: Weight, new: Weight },
    EditFocusChanged { place: PlaceId, old: bool, new: bool },
    ActivationChanged { transition: TransitionId, old: bool, new: bool },
    NameChanged { node: NetNode, old: String, new: String },
    PositionChanged { node: NetNode, old: Position, new: Position },
    ModifiedChanged { old: bool, new: bool },
}

/// Highlight flags a reachability graph node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFlag {
    LastFiring,
    UnboundedCause,
    DominatedMarking,
    DominatingMarking,
}

/// Highlight flags a reachability graph edge can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFlag {
    LastFiring,
    UnboundedCause,
}

/// Structural and highlight changes of the reachability graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RGraphEvent {
    NodeAdded { node: NodeId },
    NodeRemoved { node: NodeId, label: String },
    EdgeAdded { edge: EdgeId },
    EdgeRemoved { edge: EdgeId },
    NodeFlagChanged { node: NodeId, flag: NodeFlag, old: bool, new: bool },
    EdgeFlagChanged { edge: EdgeId, flag: EdgeFlag, old: bool, new: bool },
}

/// Receiver interface the models push their events into.
///
/// The default implementations discard everything, so a sink only has to
/// override what it cares about.
pub trait EventSink {
    fn net_event(&self, _event: &NetEvent) {}

    fn rgraph_event(&self, _event: &RGraphEvent) {}
}

/// Sink that drops every event; the models' default.
#[derive(Debug, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Net(NetEvent),
    Graph(RGraphEvent),
}

/// Sink that records every event, for embedders and tests.
///
/// Cloning yields another handle onto the same buffer, so one clone can be
/// installed into a model while the other is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<Event>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Drains and returns everything recorded so far.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl EventSink for RecordingSink {
    fn net_event(&self, event: &NetEvent) {
        self.events.borrow_mut().push(Event::Net(event.clone()));
    }

    fn rgraph_event(&self, event: &RGraphEvent) {
        self.events.borrow_mut().push(Event::Graph(event.clone()));
    }
}
