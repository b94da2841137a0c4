//! Importance weights that shape the layout.
//!
//! Weights are raw numbers keyed by node id. [`normalize`] maps them into
//! `[0, 1]` before the layout uses them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph_schema::{Graph, Node};

/// Weight given to nodes with no usable importance.
pub const NEUTRAL_IMPORTANCE: f64 = 0.5;

/// A provider of per-node importance, such as an LLM annotation pass.
pub trait ImportanceSource {
    fn name(&self) -> &'static str;

    /// Raw weights by node id. Nodes missing from the map are neutral.
    fn weights(&self, graph: &Graph) -> HashMap<String, f64>;
}

/// Reads the LLM-assigned `metadata.importance` of every node.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataImportance;

impl ImportanceSource for MetadataImportance {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn weights(&self, graph: &Graph) -> HashMap<String, f64> {
        let mut weights = HashMap::new();
        for node in graph.nodes.iter().chain(&graph.subgraphs) {
            collect_metadata(node, &mut weights);
        }
        weights
    }
}

fn collect_metadata(node: &Node, weights: &mut HashMap<String, f64>) {
    if let Some(meta) = &node.metadata {
        weights.entry(node.id.clone()).or_insert(meta.importance);
    }
    for child in node.children.iter().flatten() {
        collect_metadata(child, weights);
    }
}

/// Structural fallback: square root of the number of incident edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeImportance;

impl ImportanceSource for DegreeImportance {
    fn name(&self) -> &'static str {
        "degree"
    }

    fn weights(&self, graph: &Graph) -> HashMap<String, f64> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for edge in &graph.edges {
            *counts.entry(edge.source.as_str()).or_insert(0) += 1;
            *counts.entry(edge.target.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(id, n)| (id.to_string(), (n as f64).sqrt()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceMode {
    Metadata,
    Degree,
    /// Metadata when any node carries it, degree otherwise.
    #[default]
    Auto,
}

impl std::str::FromStr for ImportanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metadata" => Ok(ImportanceMode::Metadata),
            "degree" => Ok(ImportanceMode::Degree),
            "auto" => Ok(ImportanceMode::Auto),
            _ => Err(format!("unknown importance source: {s}")),
        }
    }
}

impl ImportanceMode {
    pub fn source_for(self, graph: &Graph) -> Box<dyn ImportanceSource> {
        match self {
            ImportanceMode::Metadata => Box::new(MetadataImportance),
            ImportanceMode::Degree => Box::new(DegreeImportance),
            ImportanceMode::Auto => {
                if MetadataImportance.weights(graph).is_empty() {
                    Box::new(DegreeImportance)
                } else {
                    Box::new(MetadataImportance)
                }
            }
        }
    }
}

/// Min-max scale the weights of `ids` into `[0, 1]`.
///
/// Non-finite weights are ignored. Ids without a weight, and every id when
/// all weights are equal, get [`NEUTRAL_IMPORTANCE`].
pub fn normalize<'a>(
    raw: &HashMap<String, f64>,
    ids: impl IntoIterator<Item = &'a str>,
) -> HashMap<String, f64> {
    let ids: Vec<&str> = ids.into_iter().collect();
    let known: Vec<f64> = ids
        .iter()
        .filter_map(|id| raw.get(*id).copied())
        .filter(|w| w.is_finite())
        .collect();
    let min = known.iter().copied().fold(f64::INFINITY, f64::min);
    let max = known.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    ids.into_iter()
        .map(|id| {
            let w = match raw.get(id).copied().filter(|w| w.is_finite()) {
                Some(w) if span > f64::EPSILON => (w - min) / span,
                _ => NEUTRAL_IMPORTANCE,
            };
            (id.to_string(), w)
        })
        .collect()
}
