//! I/O 支持：JSON 与 RON 格式的网定义文件.
//!
//! A definition file plays the role of an external importer: building it
//! replays the construction feed (places, transitions, arcs, names,
//! positions, token counts) against a fresh [`Net`] and seeds the root of
//! the accompanying [`ReachabilityGraph`].
use std::fs;
use std::path::Path;

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::{Net, NetError};
use crate::net::structure::Position;
use crate::rgraph::ReachabilityGraph;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron error: {0}")]
    RonParse(#[from] ron::de::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("unsupported net file extension: `{0}`")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub tokens: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcDef {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// On-disk net definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetFile {
    pub places: Vec<PlaceDef>,
    pub transitions: Vec<TransitionDef>,
    #[serde(default)]
    pub arcs: Vec<ArcDef>,
}

impl NetFile {
    /// Reads a definition, dispatching on the file extension
    /// (`.json` / `.ron`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => from_json_str(&content),
            Some("ron") => from_ron_str(&content),
            other => Err(IoError::UnknownFormat(other.unwrap_or("").to_owned())),
        }
    }

    /// Replays the construction feed and returns the populated net together
    /// with a reachability graph seeded at the initial marking.
    ///
    /// Nodes are created before arcs, so arc order inside the file does not
    /// matter; a failing step aborts the whole build.
    pub fn build(&self) -> Result<(Net, ReachabilityGraph), IoError> {
        let mut net = Net::new();
        for place in &self.places {
            net.add_place(&place.id)?;
            if let Some(name) = &place.name {
                net.set_node_name(&place.id, name)?;
            }
            if let Some((x, y)) = place.position {
                net.set_node_position(&place.id, x, y)?;
            }
            net.init_place_tokens(&place.id, place.tokens)?;
        }
        for transition in &self.transitions {
            net.add_transition(&transition.id)?;
            if let Some(name) = &transition.name {
                net.set_node_name(&transition.id, name)?;
            }
            if let Some((x, y)) = transition.position {
                net.set_node_position(&transition.id, x, y)?;
            }
        }
        for arc in &self.arcs {
            net.add_arc(&arc.id, &arc.source, &arc.target)?;
        }
        net.check_all_transition_states();

        let mut graph = ReachabilityGraph::new();
        graph.add_initial_marking(net.initial_marking(), &net.active_transition_ids());
        Ok((net, graph))
    }
}

/// Convenience wrapper: read and build in one step.
pub fn load_net<P: AsRef<Path>>(path: P) -> Result<(Net, ReachabilityGraph), IoError> {
    NetFile::from_path(path)?.build()
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    fs::write(path, to_json_string(value)?)?;
    Ok(())
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(ron::ser::to_string_pretty(value, PrettyConfig::default())?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCER: &str = r#"{
        "places": [{ "id": "p1", "tokens": 0 }],
        "transitions": [{ "id": "t1", "name": "produce" }],
        "arcs": [{ "id": "a1", "source": "t1", "target": "p1" }]
    }"#;

    #[test]
    fn json_definition_builds_net_and_seeded_graph() {
        let file: NetFile = from_json_str(PRODUCER).unwrap();
        let (net, graph) = file.build().unwrap();

        assert_eq!(net.places_len(), 1);
        assert_eq!(net.transitions_len(), 1);
        assert_eq!(net.arcs_len(), 1);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(
            graph.node_label(graph.initial_node().unwrap()),
            net.initial_marking().label()
        );
    }

    #[test]
    fn definition_round_trips_through_ron() {
        let file: NetFile = from_json_str(PRODUCER).unwrap();
        let ron = to_ron_string(&file).unwrap();
        let back: NetFile = from_ron_str(&ron).unwrap();

        assert_eq!(back.places[0].id, "p1");
        assert_eq!(back.arcs.len(), 1);
    }

    #[test]
    fn dangling_arc_fails_the_whole_build() {
        let file: NetFile = from_json_str(
            r#"{
                "places": [{ "id": "p1" }],
                "transitions": [],
                "arcs": [{ "id": "a1", "source": "p1", "target": "t9" }]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            file.build(),
            Err(IoError::Net(NetError::DanglingEndpoint { .. }))
        ));
    }
}
