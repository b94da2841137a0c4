//! Containment index and rank assignment.

use std::collections::{HashMap, VecDeque};

use crate::graph_schema::{Edge, Graph, Node};

#[derive(Debug)]
pub struct Vertex<'g> {
    pub node: &'g Node,
    /// Enclosing vertex, if any.
    pub parent: Option<usize>,
    pub depth: usize,
    /// Direct members, in declaration order.
    pub members: Vec<usize>,
}

impl Vertex<'_> {
    pub fn is_container(&self) -> bool {
        !self.members.is_empty()
    }
}

/// Every distinct node id in `nodes` (depth-first) then `subgraphs`.
///
/// The first value seen for an id is the vertex; later values with the same
/// id contribute their children to it.
#[derive(Debug, Default)]
pub struct VertexIndex<'g> {
    pub vertices: Vec<Vertex<'g>>,
    by_id: HashMap<&'g str, usize>,
}

impl<'g> VertexIndex<'g> {
    pub fn build(graph: &'g Graph) -> Self {
        let mut index = VertexIndex::default();
        for node in graph.nodes.iter().chain(&graph.subgraphs) {
            index.visit(node, None, 0);
        }
        index
    }

    fn visit(&mut self, node: &'g Node, parent: Option<usize>, depth: usize) {
        let idx = match self.by_id.get(node.id.as_str()) {
            Some(&existing) => {
                log::debug!("node `{}` declared more than once", node.id);
                existing
            }
            None => {
                let idx = self.vertices.len();
                self.vertices.push(Vertex {
                    node,
                    parent,
                    depth,
                    members: Vec::new(),
                });
                self.by_id.insert(node.id.as_str(), idx);
                if let Some(p) = parent {
                    self.vertices[p].members.push(idx);
                }
                idx
            }
        };
        let child_depth = self.vertices[idx].depth + 1;
        for child in node.children.iter().flatten() {
            self.visit(child, Some(idx), child_depth);
        }
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.vertices.len()).filter(|&i| !self.vertices[i].is_container())
    }

    pub fn containers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.vertices.len()).filter(|&i| self.vertices[i].is_container())
    }

    /// Outermost enclosing vertex, or the vertex itself at top level.
    pub fn root_of(&self, mut idx: usize) -> usize {
        while let Some(p) = self.vertices[idx].parent {
            idx = p;
        }
        idx
    }

    /// Resolve an edge's endpoints. `None` when either id is unknown.
    pub fn endpoints(&self, edge: &Edge) -> Option<(usize, usize)> {
        Some((self.get(&edge.source)?, self.get(&edge.target)?))
    }

    /// Leaf reached by following first members down. Leaves map to
    /// themselves.
    pub fn representative(&self, mut idx: usize) -> usize {
        while let Some(&first) = self.vertices[idx].members.first() {
            idx = first;
        }
        idx
    }

    /// Resolved edges with container endpoints moved to their
    /// representative leaf.
    pub fn leaf_edges(&self, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
        edges
            .iter()
            .map(|&(s, t)| (self.representative(s), self.representative(t)))
            .collect()
    }

    /// Rank of every vertex under [`leaf_edges`](Self::leaf_edges). Only
    /// leaf ranks are meaningful; containers carry no edges and sit at 0.
    pub fn leaf_ranks(&self, edges: &[(usize, usize)]) -> Vec<usize> {
        assign_ranks(self.len(), &self.leaf_edges(edges))
    }

    /// Number of distinct leaf ranks.
    pub fn rank_count(&self, ranks: &[usize]) -> usize {
        self.leaves().map(|v| ranks[v] + 1).max().unwrap_or(0)
    }
}

/// Longest-path layering over `vertex_count` vertices.
///
/// Self-loops are ignored. When every remaining vertex sits on a cycle, the
/// lowest-index one is released with the rank its processed predecessors
/// give it, which breaks the cycle at that vertex's incoming edges.
pub fn assign_ranks(vertex_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    let mut in_degree = vec![0usize; vertex_count];
    for &(from, to) in edges {
        if from == to || from >= vertex_count || to >= vertex_count {
            continue;
        }
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut ranks = vec![0usize; vertex_count];
    let mut done = vec![false; vertex_count];
    let mut queue: VecDeque<usize> = (0..vertex_count).filter(|&v| in_degree[v] == 0).collect();
    let mut processed = 0;

    while processed < vertex_count {
        let v = match queue.pop_front() {
            Some(v) => v,
            None => match (0..vertex_count).find(|&v| !done[v]) {
                Some(v) => {
                    log::debug!("breaking cycle at vertex {v}");
                    in_degree[v] = 0;
                    v
                }
                None => break,
            },
        };
        if done[v] {
            continue;
        }
        done[v] = true;
        processed += 1;

        for &w in &successors[v] {
            if done[w] {
                continue;
            }
            ranks[w] = ranks[w].max(ranks[v] + 1);
            in_degree[w] = in_degree[w].saturating_sub(1);
            if in_degree[w] == 0 {
                queue.push_back(w);
            }
        }
    }

    ranks
}
