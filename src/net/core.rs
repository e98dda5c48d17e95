//! 运行时: 激活判定、发生（token game）语义与标识管理.
use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::events::{EventSink, NetEvent, NoopSink};
use crate::net::ids::{ArcId, PlaceId, TransitionId};
use crate::net::incidence::Incidence;
use crate::net::index_vec::IndexVec;
use crate::net::structure::{Arc, ArcEndpoints, Marking, NetNode, Place, Position, Transition, Weight};

#[derive(Debug, Error)]
pub enum NetError {
    #[error("an element with id `{0}` already exists")]
    DuplicateId(String),
    #[error("node `{0}` does not exist")]
    UnknownNode(String),
    #[error("arc `{arc}` references the nonexistent endpoint `{endpoint}`")]
    DanglingEndpoint { arc: String, endpoint: String },
    #[error("arc `{arc}` must connect a place with a transition")]
    InvalidArcShape { arc: String },
    #[error("id `{0}` does not name a place")]
    NotAPlace(String),
    #[error("place `{place}`: token count {tokens} must not be negative")]
    NegativeTokens { place: String, tokens: i64 },
}

/// Deep copy of the live net state: (current marking, initial marking,
/// modified flag). Opaque to callers; see [`Net::restore_state`].
#[derive(Debug, Clone)]
pub struct NetMemento {
    actual: Marking,
    initial: Marking,
    modified: bool,
}

/// A place/transition net together with its live marking.
///
/// Structure (places, transitions, arcs) is built once through the
/// construction feed and stays fixed; only token counts, activation state
/// and the edit focus mutate afterwards. Every mutating call that fails
/// leaves the net untouched.
pub struct Net {
    places: IndexVec<PlaceId, Place>,
    transitions: IndexVec<TransitionId, Transition>,
    arcs: IndexVec<ArcId, Arc>,
    pre: Incidence,
    post: Incidence,
    nodes: FxHashMap<String, NetNode>,
    arc_ids: FxHashMap<String, ArcId>,
    edit_focus: Option<PlaceId>,
    modified: bool,
    sink: Box<dyn EventSink>,
}

impl Net {
    pub fn new() -> Self {
        Self {
            places: IndexVec::new(),
            transitions: IndexVec::new(),
            arcs: IndexVec::new(),
            pre: Incidence::new(),
            post: Incidence::new(),
            nodes: FxHashMap::default(),
            arc_ids: FxHashMap::default(),
            edit_focus: None,
            modified: false,
            sink: Box::new(NoopSink),
        }
    }

    pub fn set_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    fn emit(&self, event: NetEvent) {
        self.sink.net_event(&event);
    }

    // --- construction feed ---------------------------------------------

    pub fn add_place(&mut self, id: &str) -> Result<PlaceId, NetError> {
        if self.nodes.contains_key(id) {
            return Err(NetError::DuplicateId(id.to_owned()));
        }
        let place = self.places.push(Place::new(id));
        self.pre.push_place();
        self.post.push_place();
        self.nodes.insert(id.to_owned(), NetNode::Place(place));
        self.emit(NetEvent::PlaceAdded { place });
        Ok(place)
    }

    pub fn add_transition(&mut self, id: &str) -> Result<TransitionId, NetError> {
        if self.nodes.contains_key(id) {
            return Err(NetError::DuplicateId(id.to_owned()));
        }
        let transition = self.transitions.push(Transition::new(id));
        self.pre.push_transition();
        self.post.push_transition();
        self.nodes
            .insert(id.to_owned(), NetNode::Transition(transition));
        self.emit(NetEvent::TransitionAdded { transition });
        Ok(transition)
    }

    pub fn add_arc(&mut self, id: &str, source: &str, target: &str) -> Result<ArcId, NetError> {
        if self.arc_ids.contains_key(id) {
            return Err(NetError::DuplicateId(id.to_owned()));
        }
        let resolve = |endpoint: &str| {
            self.nodes
                .get(endpoint)
                .copied()
                .ok_or_else(|| NetError::DanglingEndpoint {
                    arc: id.to_owned(),
                    endpoint: endpoint.to_owned(),
                })
        };
        let endpoints = match (resolve(source)?, resolve(target)?) {
            (NetNode::Place(place), NetNode::Transition(transition)) => {
                ArcEndpoints::PlaceToTransition(place, transition)
            }
            (NetNode::Transition(transition), NetNode::Place(place)) => {
                ArcEndpoints::TransitionToPlace(transition, place)
            }
            _ => return Err(NetError::InvalidArcShape { arc: id.to_owned() }),
        };
        match endpoints {
            ArcEndpoints::PlaceToTransition(place, transition) => self.pre.add_arc(place, transition),
            ArcEndpoints::TransitionToPlace(transition, place) => self.post.add_arc(place, transition),
        }
        let arc = self.arcs.push(Arc::new(id, endpoints));
        self.arc_ids.insert(id.to_owned(), arc);
        self.emit(NetEvent::ArcAdded { arc });
        Ok(arc)
    }

    pub fn set_node_name(&mut self, id: &str, name: &str) -> Result<(), NetError> {
        let node = self.node(id)?;
        let slot = match node {
            NetNode::Place(place) => &mut self.places[place].name,
            NetNode::Transition(transition) => &mut self.transitions[transition].name,
        };
        if slot.as_str() != name {
            let old = std::mem::replace(slot, name.to_owned());
            self.emit(NetEvent::NameChanged {
                node,
                old,
                new: name.to_owned(),
            });
        }
        Ok(())
    }

    pub fn set_node_position(&mut self, id: &str, x: i32, y: i32) -> Result<(), NetError> {
        let node = self.node(id)?;
        let new: Position = (x, y);
        let slot = match node {
            NetNode::Place(place) => &mut self.places[place].position,
            NetNode::Transition(transition) => &mut self.transitions[transition].position,
        };
        if *slot != new {
            let old = std::mem::replace(slot, new);
            self.emit(NetEvent::PositionChanged { node, old, new });
        }
        Ok(())
    }

    /// Seeds both the current and the initial token count of a place, as an
    /// importer does. Negative counts are rejected before any mutation.
    pub fn init_place_tokens(&mut self, id: &str, tokens: i64) -> Result<(), NetError> {
        let place = self.place_id_checked(id)?;
        if tokens < 0 {
            return Err(NetError::NegativeTokens {
                place: id.to_owned(),
                tokens,
            });
        }
        self.set_place_tokens(place, tokens as Weight);
        self.set_place_initial_tokens(place, tokens as Weight);
        Ok(())
    }

    // --- marking and firing --------------------------------------------

    /// Recomputes the activation flag of every transition: activated iff
    /// every preset place holds at least one token.
    pub fn check_all_transition_states(&mut self) {
        let ids: Vec<TransitionId> = self.transitions.indices().collect();
        for transition in ids {
            let activated = self
                .pre
                .entries_for(transition)
                .all(|(place, _)| self.places[place].tokens >= 1);
            let old = std::mem::replace(&mut self.transitions[transition].activated, activated);
            if old != activated {
                self.emit(NetEvent::ActivationChanged {
                    transition,
                    old,
                    new: activated,
                });
            }
        }
    }

    /// Transitions activated under the current marking, sorted by external
    /// id so exploration order is reproducible.
    pub fn active_transition_ids(&self) -> Vec<TransitionId> {
        let mut active: Vec<TransitionId> = self
            .transitions
            .iter_enumerated()
            .filter_map(|(id, transition)| transition.activated.then_some(id))
            .collect();
        active.sort_by(|a, b| self.transitions[*a].id.cmp(&self.transitions[*b].id));
        active
    }

    /// Fires a transition: consumes one token per preset arc, produces one
    /// per postset arc, then recomputes every activation flag.
    ///
    /// Returns `None` without touching anything when the transition is not
    /// activated; callers skip and move on, this is not an error.
    /// Decrements saturate at zero.
    pub fn fire(&mut self, transition: TransitionId) -> Option<Marking> {
        if !self.transitions.get(transition)?.activated {
            log::debug!(
                "transition {} is not activated under the current marking",
                self.transitions[transition].id
            );
            return None;
        }
        let old = self.actual_marking();
        let preset: Vec<(PlaceId, Weight)> = self.pre.entries_for(transition).collect();
        let postset: Vec<(PlaceId, Weight)> = self.post.entries_for(transition).collect();
        for (place, weight) in preset {
            let tokens = self.places[place].tokens;
            self.set_place_tokens(place, tokens.saturating_sub(weight));
        }
        for (place, weight) in postset {
            let tokens = self.places[place].tokens;
            self.set_place_tokens(place, tokens + weight);
        }
        self.check_all_transition_states();
        let new = self.actual_marking();
        log::debug!(
            "transition {} fired: {} -> {}",
            self.transitions[transition].id,
            old.label(),
            new.label()
        );
        Some(new)
    }

    pub fn actual_marking(&self) -> Marking {
        Marking::new(IndexVec::from(
            self.places.iter().map(|place| place.tokens).collect::<Vec<_>>(),
        ))
    }

    pub fn initial_marking(&self) -> Marking {
        Marking::new(IndexVec::from(
            self.places
                .iter()
                .map(|place| place.initial_tokens)
                .collect::<Vec<_>>(),
        ))
    }

    /// Overwrites the current marking, as the exploration engine does when
    /// backtracking to a previously visited state.
    pub fn set_actual_marking(&mut self, marking: &Marking) {
        debug_assert_eq!(marking.len(), self.places.len());
        for (place, tokens) in marking.iter() {
            self.set_place_tokens(place, tokens);
        }
        self.check_all_transition_states();
    }

    pub fn reset_to_initial_marking(&mut self) {
        let ids: Vec<PlaceId> = self.places.indices().collect();
        for place in ids {
            let initial = self.places[place].initial_tokens;
            self.set_place_tokens(place, initial);
        }
        self.check_all_transition_states();
    }

    /// Declares the current marking the new initial marking and flags the
    /// net as modified.
    pub fn set_as_new_initial_marking(&mut self) {
        let ids: Vec<PlaceId> = self.places.indices().collect();
        for place in ids {
            let tokens = self.places[place].tokens;
            self.set_place_initial_tokens(place, tokens);
        }
        self.set_modified(true);
        self.check_all_transition_states();
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    // --- token editing -------------------------------------------------

    /// Moves the edit focus onto the given place, or clears it when the
    /// place already holds it.
    pub fn toggle_edit_focus(&mut self, id: &str) -> Result<(), NetError> {
        let place = self.place_id_checked(id)?;
        if let Some(previous) = self.edit_focus.take() {
            self.set_edit_focus_flag(previous, false);
            if previous == place {
                return Ok(());
            }
        }
        self.set_edit_focus_flag(place, true);
        self.edit_focus = Some(place);
        Ok(())
    }

    pub fn inc_focused_place_tokens(&mut self) {
        if let Some(place) = self.edit_focus {
            let tokens = self.places[place].tokens;
            self.set_place_tokens(place, tokens + 1);
            self.set_as_new_initial_marking();
        }
    }

    /// Decrement is a no-op at zero; token counts never go negative.
    pub fn dec_focused_place_tokens(&mut self) {
        if let Some(place) = self.edit_focus {
            let tokens = self.places[place].tokens;
            if tokens > 0 {
                self.set_place_tokens(place, tokens - 1);
                self.set_as_new_initial_marking();
            }
        }
    }

    // --- memento -------------------------------------------------------

    pub fn save_state(&self) -> NetMemento {
        NetMemento {
            actual: self.actual_marking(),
            initial: self.initial_marking(),
            modified: self.modified,
        }
    }

    pub fn restore_state(&mut self, saved: &NetMemento) {
        let ids: Vec<PlaceId> = self.places.indices().collect();
        for place in ids {
            self.set_place_initial_tokens(place, saved.initial.tokens(place));
        }
        self.set_actual_marking(&saved.actual);
        self.set_modified(saved.modified);
    }

    // --- lookups -------------------------------------------------------

    pub fn place_id(&self, id: &str) -> Option<PlaceId> {
        match self.nodes.get(id)? {
            NetNode::Place(place) => Some(*place),
            NetNode::Transition(_) => None,
        }
    }

    pub fn transition_id(&self, id: &str) -> Option<TransitionId> {
        match self.nodes.get(id)? {
            NetNode::Transition(transition) => Some(*transition),
            NetNode::Place(_) => None,
        }
    }

    pub fn place(&self, place: PlaceId) -> &Place {
        &self.places[place]
    }

    pub fn transition(&self, transition: TransitionId) -> &Transition {
        &self.transitions[transition]
    }

    /// Display name of a transition, falling back to its external id.
    pub fn transition_name(&self, transition: TransitionId) -> &str {
        let transition = &self.transitions[transition];
        if transition.name.is_empty() {
            &transition.id
        } else {
            &transition.name
        }
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn arcs_len(&self) -> usize {
        self.arcs.len()
    }

    pub fn arc(&self, arc: ArcId) -> &Arc {
        &self.arcs[arc]
    }

    // --- internal ------------------------------------------------------

    fn node(&self, id: &str) -> Result<NetNode, NetError> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| NetError::UnknownNode(id.to_owned()))
    }

    fn place_id_checked(&self, id: &str) -> Result<PlaceId, NetError> {
        match self.node(id)? {
            NetNode::Place(place) => Ok(place),
            NetNode::Transition(_) => Err(NetError::NotAPlace(id.to_owned())),
        }
    }

    fn set_place_tokens(&mut self, place: PlaceId, tokens: Weight) {
        let old = std::mem::replace(&mut self.places[place].tokens, tokens);
        if old != tokens {
            self.emit(NetEvent::TokensChanged {
                place,
                old,
                new: tokens,
            });
        }
    }

    fn set_place_initial_tokens(&mut self, place: PlaceId, tokens: Weight) {
        let old = std::mem::replace(&mut self.places[place].initial_tokens, tokens);
        if old != tokens {
            self.emit(NetEvent::InitialTokensChanged {
                place,
                old,
                new: tokens,
            });
        }
    }

    fn set_edit_focus_flag(&mut self, place: PlaceId, value: bool) {
        let old = std::mem::replace(&mut self.places[place].edit_focus, value);
        if old != value {
            self.emit(NetEvent::EditFocusChanged {
                place,
                old,
                new: value,
            });
        }
    }

    fn set_modified(&mut self, value: bool) {
        let old = std::mem::replace(&mut self.modified, value);
        if old != value {
            self.emit(NetEvent::ModifiedChanged { old, new: value });
        }
    }
}

impl Default for Net {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("arcs", &self.arcs)
            .field("modified", &self.modified)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, RecordingSink};

    /// p0 --a0--> t0 --a1--> p1, 初始标识 (1|0).
    fn build_sequence_net() -> Net {
        let mut net = Net::new();
        net.add_place("p0").unwrap();
        net.add_place("p1").unwrap();
        net.add_transition("t0").unwrap();
        net.add_arc("a0", "p0", "t0").unwrap();
        net.add_arc("a1", "t0", "p1").unwrap();
        net.init_place_tokens("p0", 1).unwrap();
        net.check_all_transition_states();
        net
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut net = Net::new();
        net.add_place("p0").unwrap();

        assert!(matches!(
            net.add_place("p0"),
            Err(NetError::DuplicateId(_))
        ));
        assert!(matches!(
            net.add_transition("p0"),
            Err(NetError::DuplicateId(_))
        ));
        assert_eq!(net.places_len(), 1);
    }

    #[test]
    fn arcs_must_connect_place_with_transition() {
        let mut net = Net::new();
        net.add_place("p0").unwrap();
        net.add_place("p1").unwrap();
        net.add_transition("t0").unwrap();

        assert!(matches!(
            net.add_arc("a0", "p0", "p1"),
            Err(NetError::InvalidArcShape { .. })
        ));
        assert!(matches!(
            net.add_arc("a1", "p0", "missing"),
            Err(NetError::DanglingEndpoint { .. })
        ));
        assert_eq!(net.arcs_len(), 0);
    }

    #[test]
    fn negative_token_count_is_rejected_without_mutation() {
        let mut net = build_sequence_net();

        assert!(matches!(
            net.init_place_tokens("p0", -1),
            Err(NetError::NegativeTokens { .. })
        ));
        assert_eq!(net.actual_marking().label(), "(1|0)");
    }

    #[test]
    fn firing_moves_tokens_and_recomputes_activation() {
        let mut net = build_sequence_net();
        let t0 = net.transition_id("t0").unwrap();
        assert!(net.transition(t0).activated);

        let new = net.fire(t0).unwrap();

        assert_eq!(new.label(), "(0|1)");
        assert!(!net.transition(t0).activated);
        assert_eq!(net.fire(t0), None);
        assert_eq!(net.actual_marking().label(), "(0|1)");
    }

    #[test]
    fn active_transitions_are_sorted_by_external_id() {
        let mut net = Net::new();
        net.add_place("p0").unwrap();
        net.add_transition("t2").unwrap();
        net.add_transition("t10").unwrap();
        net.add_transition("t1").unwrap();
        net.add_arc("a0", "t2", "p0").unwrap();
        net.check_all_transition_states();

        let ids: Vec<&str> = net
            .active_transition_ids()
            .into_iter()
            .map(|id| net.transition(id).id.as_str())
            .collect();

        // string order, as imported ids are opaque
        assert_eq!(ids, vec!["t1", "t10", "t2"]);
    }

    #[test]
    fn memento_round_trip_is_a_no_op() {
        let mut net = build_sequence_net();
        let t0 = net.transition_id("t0").unwrap();
        let saved = net.save_state();

        net.fire(t0).unwrap();
        net.set_as_new_initial_marking();
        assert!(net.is_modified());

        net.restore_state(&saved);
        assert_eq!(net.actual_marking().label(), "(1|0)");
        assert_eq!(net.initial_marking().label(), "(1|0)");
        assert!(!net.is_modified());

        // restoring the state just saved must not change anything
        let snapshot = net.save_state();
        net.restore_state(&snapshot);
        assert_eq!(net.actual_marking().label(), "(1|0)");
    }

    #[test]
    fn token_editing_reseeds_the_initial_marking() {
        let mut net = build_sequence_net();
        net.toggle_edit_focus("p1").unwrap();

        net.inc_focused_place_tokens();
        assert_eq!(net.initial_marking().label(), "(1|1)");
        assert!(net.is_modified());

        net.toggle_edit_focus("p1").unwrap();
        net.inc_focused_place_tokens();
        // focus was cleared, nothing changes
        assert_eq!(net.initial_marking().label(), "(1|1)");
    }

    #[test]
    fn dec_is_a_no_op_at_zero_tokens() {
        let mut net = build_sequence_net();
        net.toggle_edit_focus("p1").unwrap();

        net.dec_focused_place_tokens();

        assert_eq!(net.actual_marking().label(), "(1|0)");
    }

    #[test]
    fn redundant_marking_updates_emit_no_events() {
        let mut net = build_sequence_net();
        let sink = RecordingSink::new();
        net.set_event_sink(Box::new(sink.clone()));

        let marking = net.actual_marking();
        net.set_actual_marking(&marking);

        assert!(sink.is_empty());

        let t0 = net.transition_id("t0").unwrap();
        net.fire(t0).unwrap();
        let events = sink.take();
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Net(NetEvent::TokensChanged { .. }))));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Net(NetEvent::ActivationChanged { .. }))));
    }
}
