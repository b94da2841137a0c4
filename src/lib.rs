pub mod config;
pub mod display_width;
pub mod error;
pub mod force;
pub mod graph_layout;
pub mod graph_schema;
pub mod hierarchy;
pub mod importance;
pub mod metrics;
pub mod routing;
pub mod style_parser;

pub use config::{Direction, LayoutConfig};
pub use error::{Error, Result};
pub use graph_layout::LayoutResult;
pub use graph_schema::{Edge, EdgeKind, Graph, Node, NodeKind, NodeMetadata, Position, StyleProps};
pub use importance::{ImportanceMode, ImportanceSource};

/// Check that `input` is a structurally conforming graph document.
pub fn check(input: &str) -> Result<Graph> {
    Graph::from_json(input)
}

/// Parse a graph document and lay it out.
pub fn layout(input: &str, config: &LayoutConfig) -> Result<LayoutResult> {
    let graph = check(input)?;
    log::debug!(
        "laying out {} nodes, {} edges, {} subgraphs",
        graph.nodes.len(),
        graph.edges.len(),
        graph.subgraphs.len()
    );
    graph_layout::compute(&graph, config)
}
