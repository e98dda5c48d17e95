//! # pnbound
//!
//! Boundedness analysis for place/transition nets: an exhaustive token-game
//! exploration builds a deduplicating reachability graph and stops as soon
//! as a discovered marking strictly dominates one of its ancestors, the
//! covering criterion that certifies an infinite state space, with a
//! witness path as evidence.
//!
//! The typical flow mirrors the [`net::io`] loader: populate a [`net::Net`]
//! through the construction feed, seed a [`rgraph::ReachabilityGraph`] with
//! the initial marking, then hand both to
//! [`analysis::SimulationEngine::run`].

pub mod analysis;
pub mod caretaker;
pub mod events;
pub mod net;
pub mod options;
pub mod report;
pub mod rgraph;
