use serde::Serialize;

use crate::graph_schema::Graph;
use crate::hierarchy::VertexIndex;

/// Structural summary of a graph, computed before layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureMetrics {
    pub vertex_count: usize,
    pub leaf_count: usize,
    pub container_count: usize,
    pub edge_count: usize,
    /// Edges naming an id that no node carries.
    pub dangling_edge_count: usize,
    pub self_loop_count: usize,
    /// Deepest containment level; 0 when nothing is nested.
    pub max_depth: usize,
    /// Layers the layout uses; edges touching a container count from its
    /// first leaf.
    pub rank_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
}

pub fn analyze(graph: &Graph) -> StructureMetrics {
    let index = VertexIndex::build(graph);
    analyze_indexed(graph, &index)
}

pub(crate) fn analyze_indexed(graph: &Graph, index: &VertexIndex<'_>) -> StructureMetrics {
    let n = index.len();
    let mut in_degree = vec![0usize; n];
    let mut out_degree = vec![0usize; n];
    let mut resolved: Vec<(usize, usize)> = Vec::new();
    let mut dangling = 0;
    let mut self_loops = 0;

    for edge in &graph.edges {
        match index.endpoints(edge) {
            Some((from, to)) => {
                out_degree[from] += 1;
                in_degree[to] += 1;
                if from == to {
                    self_loops += 1;
                }
                resolved.push((from, to));
            }
            None => dangling += 1,
        }
    }

    let ranks = index.leaf_ranks(&resolved);
    let rank_count = index.rank_count(&ranks);

    StructureMetrics {
        vertex_count: n,
        leaf_count: index.leaves().count(),
        container_count: index.containers().count(),
        edge_count: graph.edges.len(),
        dangling_edge_count: dangling,
        self_loop_count: self_loops,
        max_depth: index.vertices.iter().map(|v| v.depth).max().unwrap_or(0),
        rank_count,
        max_in_degree: in_degree.into_iter().max().unwrap_or(0),
        max_out_degree: out_degree.into_iter().max().unwrap_or(0),
    }
}
