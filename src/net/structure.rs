//! P/T 网静态结构元素：库所、迁移、弧与标识.
use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::IndexVec;

pub type Weight = u64;

/// Layout position as imported; not interpreted by any analysis.
pub type Position = (i32, i32);

/// A net element referenced by its external id. Arcs are legal only between
/// the two variants, never within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetNode {
    Place(PlaceId),
    Transition(TransitionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub tokens: Weight,
    pub initial_tokens: Weight,
    pub edit_focus: bool,
}

impl Place {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            position: (0, 0),
            tokens: 0,
            initial_tokens: 0,
            edit_focus: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub activated: bool,
}

impl Transition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            position: (0, 0),
            activated: false,
        }
    }
}

/// Resolved, direction-tagged arc endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcEndpoints {
    PlaceToTransition(PlaceId, TransitionId),
    TransitionToPlace(TransitionId, PlaceId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arc {
    pub id: String,
    pub endpoints: ArcEndpoints,
}

impl Arc {
    pub fn new(id: impl Into<String>, endpoints: ArcEndpoints) -> Self {
        Self {
            id: id.into(),
            endpoints,
        }
    }
}

/// Token assignment for every place, in stable place order.
///
/// The partial order is component-wise: `a < b` holds exactly when `b`
/// assigns at least as many tokens to every place and strictly more to at
/// least one, which is the criterion that certifies unbounded growth.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marking(IndexVec<PlaceId, Weight>);

impl Marking {
    pub fn new(tokens: IndexVec<PlaceId, Weight>) -> Self {
        Self(tokens)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self, place: PlaceId) -> Weight {
        self.0[place]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, Weight)> + '_ {
        self.0.iter_enumerated().map(|(place, tokens)| (place, *tokens))
    }

    /// Canonical textual form, e.g. `(1|0|2)`. Doubles as the node label in
    /// the reachability graph, so equal markings produce equal labels.
    pub fn label(&self) -> String {
        format!("({})", self.0.iter().join("|"))
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl PartialOrd for Marking {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.len() != other.len() {
            return None;
        }
        let mut less = false;
        let mut greater = false;
        for (place, left) in self.0.iter_enumerated() {
            let right = other.0[place];
            if *left < right {
                less = true;
            } else if *left > right {
                greater = true;
            }
        }
        match (less, greater) {
            (true, true) => None,
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => Some(Ordering::Equal),
        }
    }
}
