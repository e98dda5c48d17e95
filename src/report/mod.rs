//! Analysis result data handed to embedders and the CLI.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::analysis::Verdict;
use crate::net::core::Net;
use crate::rgraph::ReachabilityGraph;

/// Witness data of an unbounded verdict, resolved to external names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WitnessSummary {
    pub path_length: usize,
    /// External ids of the fired transitions along the witness path.
    pub transitions: Vec<String>,
    /// Label of the dominated marking m.
    pub dominated: String,
    /// Label of the dominating marking m'.
    pub dominating: String,
}

/// Result of analyzing one net file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub file_name: String,
    pub bounded: bool,
    pub node_count: usize,
    pub edge_count: usize,
    pub witness: Option<WitnessSummary>,
}

impl AnalysisReport {
    pub fn new(
        file_name: impl Into<String>,
        verdict: &Verdict,
        net: &Net,
        graph: &ReachabilityGraph,
    ) -> Self {
        let witness = match verdict {
            Verdict::Bounded { .. } => None,
            Verdict::Unbounded { witness } => Some(WitnessSummary {
                path_length: witness.edge_path.len(),
                transitions: witness
                    .edge_path
                    .iter()
                    .map(|&edge| net.transition(graph.edge_transition(edge)).id.clone())
                    .collect(),
                dominated: graph.node_label(witness.dominated).to_owned(),
                dominating: graph.node_label(witness.dominating).to_owned(),
            }),
        };
        Self {
            file_name: file_name.into(),
            bounded: verdict.is_bounded(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            witness,
        }
    }

    /// Witness path in the parenthesized form `(t1,t2,...)`.
    pub fn path_text(&self) -> Option<String> {
        self.witness
            .as_ref()
            .map(|witness| format!("({})", witness.transitions.iter().join(",")))
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = |f: &mut fmt::Formatter<'_>, key: &str, value: &dyn fmt::Display| {
            writeln!(f, "{key:<20} {value}")
        };
        if self.bounded {
            writeln!(f, "Analysis result: bounded")?;
            writeln!(f, "------------------------------")?;
            layout(f, "File:", &self.file_name)?;
            layout(f, "Nodes:", &self.node_count)?;
            layout(f, "Edges:", &self.edge_count)?;
        } else {
            let witness = self.witness.as_ref().ok_or(fmt::Error)?;
            writeln!(f, "Analysis result: unbounded")?;
            writeln!(f, "------------------------------")?;
            layout(f, "File:", &self.file_name)?;
            layout(f, "Path length:", &witness.path_length)?;
            layout(
                f,
                "Path:",
                &self.path_text().unwrap_or_default(),
            )?;
            layout(f, "m:", &witness.dominated)?;
            layout(f, "m':", &witness.dominating)?;
        }
        Ok(())
    }
}

/// Renders the tabular overview used after analyzing several files.
pub fn render_batch_table(reports: &[AnalysisReport]) -> String {
    let mut out = String::new();
    let row = |file: &str, bounded: &str, details: &str| {
        format!(" {file:<40}| {bounded:<10}| {details}\n")
    };
    out.push_str(&row("", "", "nodes / edges resp."));
    out.push_str(&row("file name", "bounded", "path length:path; m, m'"));
    out.push_str(&format!(
        " {:-<40}|{:-<11}|{:-<50}\n",
        "", "", ""
    ));
    for report in reports {
        if report.bounded {
            let details = format!("{:>2} / {:>2}", report.node_count, report.edge_count);
            out.push_str(&row(&report.file_name, "yes", &details));
        } else {
            let witness = report.witness.as_ref();
            let details = match witness {
                Some(witness) => format!(
                    "{}:{}; {}, {}",
                    witness.path_length,
                    report.path_text().unwrap_or_default(),
                    witness.dominated,
                    witness.dominating
                ),
                None => String::new(),
            };
            out.push_str(&row(&report.file_name, "no", &details));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SimulationEngine;
    use crate::net::io::{NetFile, from_json_str};

    fn analyzed(definition: &str, name: &str) -> AnalysisReport {
        let file: NetFile = from_json_str(definition).unwrap();
        let (mut net, mut graph) = file.build().unwrap();
        let verdict = SimulationEngine::new().run(&mut net, &mut graph);
        AnalysisReport::new(name, &verdict, &net, &graph)
    }

    const PRODUCER: &str = r#"{
        "places": [{ "id": "p1" }],
        "transitions": [{ "id": "t1" }],
        "arcs": [{ "id": "a1", "source": "t1", "target": "p1" }]
    }"#;

    #[test]
    fn unbounded_report_carries_the_witness() {
        let report = analyzed(PRODUCER, "producer.json");

        assert!(!report.bounded);
        let witness = report.witness.as_ref().unwrap();
        assert_eq!(witness.path_length, 1);
        assert_eq!(witness.transitions, vec!["t1"]);
        assert_eq!(witness.dominated, "(0)");
        assert_eq!(witness.dominating, "(1)");
        assert_eq!(report.path_text().unwrap(), "(t1)");

        let text = report.to_string();
        assert!(text.contains("unbounded"));
        assert!(text.contains("(t1)"));
    }

    #[test]
    fn batch_table_lists_every_file() {
        let reports = vec![
            analyzed(PRODUCER, "producer.json"),
            analyzed(
                r#"{
                    "places": [{ "id": "p1", "tokens": 1 }],
                    "transitions": [{ "id": "t1" }],
                    "arcs": [
                        { "id": "a1", "source": "p1", "target": "t1" },
                        { "id": "a2", "source": "t1", "target": "p1" }
                    ]
                }"#,
                "loop.json",
            ),
        ];

        let table = render_batch_table(&reports);

        assert!(table.contains("producer.json"));
        assert!(table.contains("loop.json"));
        assert!(table.contains("no"));
        assert!(table.contains("yes"));
        assert!(table.contains(" 1 /  1"));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = analyzed(PRODUCER, "producer.json");
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("\"bounded\":false"));
        assert!(json.contains("\"dominating\":\"(1)\""));
    }
}
