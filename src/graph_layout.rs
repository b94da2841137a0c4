use std::collections::HashMap;

use serde::Serialize;

use crate::config::{Direction, LayoutConfig};
use crate::display_width::{label_width, line_count};
use crate::error::{Error, Result};
use crate::force::{ForceInput, UNITS_PER_CELL, force_directed_layout};
use crate::graph_schema::{Edge, EdgeKind, Graph, NodeKind};
use crate::hierarchy::VertexIndex;
use crate::importance::{ImportanceSource, normalize};
use crate::metrics::{StructureMetrics, analyze_indexed};
use crate::routing::{RoutedEdge, route_edges};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Rect {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        self.x < other.right() - EPS
            && other.x < self.right() - EPS
            && self.y < other.bottom() - EPS
            && other.y < self.bottom() - EPS
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePlacement {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub parent: Option<String>,
    pub rank: usize,
    /// Normalized importance in `[0, 1]`.
    pub importance: f64,
    pub pinned: bool,
    pub center: Point,
    #[serde(flatten)]
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerBox {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub parent: Option<String>,
    pub depth: usize,
    #[serde(flatten)]
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePath {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub label: Option<String>,
    pub points: Vec<Point>,
    /// Middle of the path's central segment.
    pub label_anchor: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    pub direction: Direction,
    pub width: f64,
    pub height: f64,
    pub importance_source: String,
    pub metrics: StructureMetrics,
    pub nodes: Vec<NodePlacement>,
    pub containers: Vec<ContainerBox>,
    pub edges: Vec<EdgePath>,
}

impl LayoutResult {
    pub fn node(&self, id: &str) -> Option<&NodePlacement> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn container(&self, id: &str) -> Option<&ContainerBox> {
        self.containers.iter().find(|c| c.id == id)
    }
}

const LABEL_PAD: f64 = 4.0;
const CONTAINER_PAD_LEFT: f64 = 2.0;
const CONTAINER_PAD_RIGHT: f64 = 2.0;
const CONTAINER_PAD_TOP: f64 = 1.0;
const CONTAINER_PAD_BOTTOM: f64 = 1.0;
const CONTAINER_TITLE_DECOR: f64 = 6.0;

/// Lay out a graph, choosing the importance source from `config`.
pub fn compute(graph: &Graph, config: &LayoutConfig) -> Result<LayoutResult> {
    let source = config.importance.source_for(graph);
    compute_with_source(graph, config, source.as_ref())
}

/// Lay out a graph with an explicit importance source.
///
/// Stages: force-directed base layout, rank snapping, importance sizing and
/// pull, overlap removal with container boxes, edge routing.
pub fn compute_with_source(
    graph: &Graph,
    config: &LayoutConfig,
    source: &dyn ImportanceSource,
) -> Result<LayoutResult> {
    let config = config.clone().clamped();
    let dir = config.direction;
    let index = VertexIndex::build(graph);
    if index.is_empty() {
        return Err(Error::EmptyGraph);
    }

    let metrics = analyze_indexed(graph, &index);
    log::debug!("structure: {metrics:?}");

    let n = index.len();
    let leaves: Vec<usize> = index.leaves().collect();

    let mut resolved: Vec<(usize, usize, &Edge)> = Vec::new();
    for edge in &graph.edges {
        match index.endpoints(edge) {
            Some((s, t)) => resolved.push((s, t, edge)),
            None => log::warn!(
                "skipping edge {} -> {}: unknown node id",
                edge.source,
                edge.target
            ),
        }
    }

    // Importance and sizes.
    let raw = source.weights(graph);
    let weights = normalize(&raw, index.vertices.iter().map(|v| v.node.id.as_str()));
    log::debug!("importance from `{}` source", source.name());
    let importance: Vec<f64> = index
        .vertices
        .iter()
        .map(|v| weights.get(&v.node.id).copied().unwrap_or(0.0))
        .collect();
    let sizes: Vec<(f64, f64)> = (0..n)
        .map(|v| {
            let label = &index.vertices[v].node.label;
            let grow = 1.0 + config.importance_scale * importance[v];
            (
                (label_width(label) as f64 + LABEL_PAD) * grow,
                (2 + line_count(label)) as f64 * grow,
            )
        })
        .collect();

    let pinned: HashMap<usize, Point> = leaves
        .iter()
        .filter_map(|&v| {
            let pos = index.vertices[v].node.metadata.as_ref()?.position?;
            (pos.x.is_finite() && pos.y.is_finite()).then_some((v, Point { x: pos.x, y: pos.y }))
        })
        .collect();

    // Edges touching a container act on its first leaf.
    let pairs: Vec<(usize, usize)> = resolved.iter().map(|&(s, t, _)| (s, t)).collect();
    let mut springs = index.leaf_edges(&pairs);
    for c in index.containers() {
        let members = &index.vertices[c].members;
        for pair in members.windows(2) {
            springs.push((index.representative(pair[0]), index.representative(pair[1])));
        }
    }

    // 1. Force-directed base layout.
    let pinned_units: HashMap<usize, Point> = pinned
        .iter()
        .map(|(&v, p)| {
            (v, Point { x: p.x * UNITS_PER_CELL, y: p.y * UNITS_PER_CELL })
        })
        .collect();
    let forces = force_directed_layout(&ForceInput {
        vertices: &leaves,
        springs: &springs,
        pinned: &pinned_units,
        iterations: config.iterations,
        time_step: config.time_step,
    });
    let mut centers: Vec<Point> = vec![Point::default(); n];
    for &v in &leaves {
        let p = forces.get(&v).copied().unwrap_or_default();
        centers[v] = Point {
            x: p.x / UNITS_PER_CELL,
            y: p.y / UNITS_PER_CELL,
        };
    }
    for (&v, &p) in &pinned {
        centers[v] = p;
    }

    // 2. Hierarchy.
    let ranks = index.leaf_ranks(&pairs);
    let max_rank = leaves.iter().map(|&v| ranks[v]).max().unwrap_or(0);
    let mut rank_members: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
    for &v in &leaves {
        rank_members[ranks[v]].push(v);
    }

    let main_pad = match dir {
        Direction::TopDown => CONTAINER_PAD_TOP + CONTAINER_PAD_BOTTOM,
        Direction::LeftRight => CONTAINER_PAD_LEFT + CONTAINER_PAD_RIGHT,
    };
    let rank_gap = config.rank_spacing + main_pad * metrics.max_depth as f64;
    let mut slot = 0.0;
    let mut rank_center: Vec<f64> = Vec::with_capacity(rank_members.len());
    for members in &rank_members {
        let extent = members
            .iter()
            .map(|&v| main_extent(sizes[v], dir))
            .fold(0.0, f64::max);
        rank_center.push(slot + extent / 2.0);
        slot += extent + rank_gap;
    }

    for &v in &leaves {
        if pinned.contains_key(&v) {
            continue;
        }
        let snapped = rank_center[ranks[v]];
        let free = along(centers[v], dir);
        let w = config.hierarchy_weight;
        set_along(&mut centers[v], dir, w * snapped + (1.0 - w) * free);
    }

    // 3. Importance pull toward the middle of the rank.
    for members in &rank_members {
        if members.len() < 2 {
            continue;
        }
        let mid = mean(members.iter().map(|&v| across(centers[v], dir)));
        for &v in members {
            if pinned.contains_key(&v) {
                continue;
            }
            let c = across(centers[v], dir);
            let pull = config.importance_pull * importance[v];
            set_across(&mut centers[v], dir, c + (mid - c) * pull);
        }
    }

    // 4. Pack sibling blocks across the flow, innermost containers first, so
    // every container box (title included) is final before its siblings are
    // placed around it. Subtrees holding a pinned leaf stay put.
    let mut fixed = vec![false; n];
    for &v in pinned.keys() {
        let mut at = Some(v);
        while let Some(x) = at {
            fixed[x] = true;
            at = index.vertices[x].parent;
        }
    }
    let mut rects: Vec<Rect> = vec![Rect::default(); n];
    for &v in &leaves {
        rects[v] = Rect::centered(centers[v], sizes[v].0, sizes[v].1);
    }
    let roots: Vec<usize> = (0..n).filter(|&v| index.vertices[v].parent.is_none()).collect();
    let mut packer = Packer {
        index: &index,
        rects,
        fixed,
        dir,
        gap: config.node_gap,
    };
    packer.place_group(&roots);
    let mut rects = packer.rects;

    // 5. Edge routing.
    let routed: Vec<RoutedEdge> = resolved
        .iter()
        .map(|&(s, t, _)| RoutedEdge {
            from: s,
            to: t,
            source: rects[s],
            target: rects[t],
        })
        .collect();
    let mut paths = route_edges(&routed, dir);

    // 6. Move into the positive quadrant unless something is pinned.
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    for r in &rects {
        min_x = min_x.min(r.x);
        min_y = min_y.min(r.y);
    }
    for p in paths.iter().flat_map(|p| p.points.iter()) {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
    }
    if pinned.is_empty() {
        let (dx, dy) = (config.margin - min_x, config.margin - min_y);
        for r in &mut rects {
            r.translate(dx, dy);
        }
        for path in &mut paths {
            path.translate(dx, dy);
        }
    }

    let mut width: f64 = 0.0;
    let mut height: f64 = 0.0;
    for r in &rects {
        width = width.max(r.right());
        height = height.max(r.bottom());
    }
    for p in paths.iter().flat_map(|p| p.points.iter()) {
        width = width.max(p.x);
        height = height.max(p.y);
    }
    width += config.margin;
    height += config.margin;

    let parent_id = |v: usize| {
        index.vertices[v]
            .parent
            .map(|p| index.vertices[p].node.id.clone())
    };

    let nodes = leaves
        .iter()
        .map(|&v| {
            let node = index.vertices[v].node;
            NodePlacement {
                id: node.id.clone(),
                label: node.label.clone(),
                kind: node.kind,
                parent: parent_id(v),
                rank: ranks[v],
                importance: importance[v],
                pinned: pinned.contains_key(&v),
                center: rects[v].center(),
                rect: rects[v],
            }
        })
        .collect();

    let containers = index
        .containers()
        .map(|c| {
            let vertex = &index.vertices[c];
            ContainerBox {
                id: vertex.node.id.clone(),
                label: vertex.node.label.clone(),
                kind: vertex.node.kind,
                parent: parent_id(c),
                depth: vertex.depth,
                rect: rects[c],
            }
        })
        .collect();

    let edges = resolved
        .iter()
        .zip(paths)
        .map(|(&(_, _, edge), path)| EdgePath {
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.kind,
            label: edge.label.clone(),
            points: path.points,
            label_anchor: path.label_anchor,
        })
        .collect();

    Ok(LayoutResult {
        direction: dir,
        width,
        height,
        importance_source: source.name().to_string(),
        metrics,
        nodes,
        containers,
        edges,
    })
}

/// Cross-axis placement of sibling blocks. A block is a leaf or a container
/// together with everything inside it.
struct Packer<'a, 'g> {
    index: &'a VertexIndex<'g>,
    rects: Vec<Rect>,
    /// Blocks holding a pinned leaf.
    fixed: Vec<bool>,
    dir: Direction,
    gap: f64,
}

impl Packer<'_, '_> {
    /// Place `members` after giving each container among them its final box.
    fn place_group(&mut self, members: &[usize]) {
        let index = self.index;
        for &m in members {
            let vertex = &index.vertices[m];
            if vertex.is_container() {
                self.place_group(&vertex.members);
                let rect = container_rect(
                    vertex.members.iter().map(|&c| self.rects[c]),
                    &vertex.node.label,
                );
                self.rects[m] = rect;
            }
        }
        self.arrange(members);
    }

    /// Fixed blocks first, then the rest by cross position. Each free block
    /// moves to the nearest cross position clear of every placed sibling it
    /// shares main-axis extent with.
    fn arrange(&mut self, members: &[usize]) {
        let dir = self.dir;
        let mut order = members.to_vec();
        order.sort_by(|&a, &b| {
            self.fixed[b]
                .cmp(&self.fixed[a])
                .then(across(self.rects[a].center(), dir).total_cmp(&across(self.rects[b].center(), dir)))
                .then(a.cmp(&b))
        });

        let mut placed: Vec<Rect> = Vec::with_capacity(order.len());
        for v in order {
            if !self.fixed[v] {
                let rect = self.rects[v];
                let (start, end) = cross_span(&rect, dir);
                let half = (end - start) / 2.0;
                let center = start + half;
                let blocked: Vec<(f64, f64)> = placed
                    .iter()
                    .filter(|p| spans_overlap(main_span(p, dir), main_span(&rect, dir)))
                    .map(|p| {
                        let (s, e) = cross_span(p, dir);
                        (s - self.gap - half, e + self.gap + half)
                    })
                    .collect();
                let target = nearest_free(center, blocked);
                self.shift(v, target - center);
            }
            placed.push(self.rects[v]);
        }
    }

    fn shift(&mut self, v: usize, delta: f64) {
        if delta == 0.0 {
            return;
        }
        let (index, dir) = (self.index, self.dir);
        let mut stack = vec![v];
        while let Some(x) = stack.pop() {
            let rect = &mut self.rects[x];
            match dir {
                Direction::TopDown => rect.x += delta,
                Direction::LeftRight => rect.y += delta,
            }
            stack.extend(&index.vertices[x].members);
        }
    }
}

/// Closest value to `wanted` outside every open interval in `blocked`.
/// Ties go to the lower side.
fn nearest_free(wanted: f64, mut blocked: Vec<(f64, f64)>) -> f64 {
    blocked.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(blocked.len());
    for (s, e) in blocked {
        match merged.last_mut() {
            Some(last) if s < last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }
    match merged.iter().find(|&&(s, e)| s < wanted && wanted < e) {
        Some(&(s, e)) if wanted - s <= e - wanted => s,
        Some(&(_, e)) => e,
        None => wanted,
    }
}

fn spans_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    const EPS: f64 = 1e-9;
    a.0 < b.1 - EPS && b.0 < a.1 - EPS
}

fn main_span(r: &Rect, dir: Direction) -> (f64, f64) {
    match dir {
        Direction::TopDown => (r.y, r.bottom()),
        Direction::LeftRight => (r.x, r.right()),
    }
}

fn cross_span(r: &Rect, dir: Direction) -> (f64, f64) {
    match dir {
        Direction::TopDown => (r.x, r.right()),
        Direction::LeftRight => (r.y, r.bottom()),
    }
}

fn container_rect(members: impl Iterator<Item = Rect>, label: &str) -> Rect {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for r in members {
        min_x = min_x.min(r.x);
        min_y = min_y.min(r.y);
        max_x = max_x.max(r.right());
        max_y = max_y.max(r.bottom());
    }
    let x = min_x - CONTAINER_PAD_LEFT;
    let y = min_y - CONTAINER_PAD_TOP;
    let content_width = max_x + CONTAINER_PAD_RIGHT - x;
    let title_width = label_width(label) as f64 + CONTAINER_TITLE_DECOR;
    Rect {
        x,
        y,
        width: content_width.max(title_width),
        height: max_y + CONTAINER_PAD_BOTTOM - y,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn along(p: Point, dir: Direction) -> f64 {
    match dir {
        Direction::TopDown => p.y,
        Direction::LeftRight => p.x,
    }
}

fn across(p: Point, dir: Direction) -> f64 {
    match dir {
        Direction::TopDown => p.x,
        Direction::LeftRight => p.y,
    }
}

fn set_along(p: &mut Point, dir: Direction, v: f64) {
    match dir {
        Direction::TopDown => p.y = v,
        Direction::LeftRight => p.x = v,
    }
}

fn set_across(p: &mut Point, dir: Direction, v: f64) {
    match dir {
        Direction::TopDown => p.x = v,
        Direction::LeftRight => p.y = v,
    }
}

fn main_extent((w, h): (f64, f64), dir: Direction) -> f64 {
    match dir {
        Direction::TopDown => h,
        Direction::LeftRight => w,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::importance::{DegreeImportance, MetadataImportance};
    use pretty_assertions::assert_eq;

    const EPS: f64 = 1e-6;

    fn graph(json: &str) -> Graph {
        Graph::from_json(json).unwrap()
    }

    fn chain() -> Graph {
        graph(
            r#"{"nodes": [
                {"id": "a", "type": "node", "label": "Start"},
                {"id": "b", "type": "node", "label": "Middle"},
                {"id": "c", "type": "node", "label": "End"}
            ], "edges": [
                {"source": "a", "target": "b", "type": "normal"},
                {"source": "b", "target": "c", "type": "emphasis", "label": "done"}
            ], "subgraphs": []}"#,
        )
    }

    fn nested() -> Graph {
        graph(
            r#"{"nodes": [
                {"id": "user", "type": "node", "label": "User"},
                {"id": "svc", "type": "subgraph", "label": "Services", "children": [
                    {"id": "api", "type": "node", "label": "API"},
                    {"id": "inner", "type": "subgraph", "label": "Storage", "children": [
                        {"id": "db", "type": "node", "label": "DB"},
                        {"id": "cache", "type": "node", "label": "Cache"}
                    ]}
                ]}
            ], "edges": [
                {"source": "user", "target": "api", "type": "normal"},
                {"source": "api", "target": "db", "type": "normal"},
                {"source": "api", "target": "cache", "type": "subflow"}
            ], "subgraphs": []}"#,
        )
    }

    #[test]
    fn empty_graph_is_an_error() {
        let g = graph(r#"{"nodes": [], "edges": [], "subgraphs": []}"#);
        assert!(matches!(
            compute(&g, &LayoutConfig::default()),
            Err(Error::EmptyGraph)
        ));
    }

    #[test]
    fn top_down_chain_flows_downward() {
        let out = compute(&chain(), &LayoutConfig::default()).unwrap();
        let (a, b, c) = (
            out.node("a").unwrap(),
            out.node("b").unwrap(),
            out.node("c").unwrap(),
        );
        assert_eq!((a.rank, b.rank, c.rank), (0, 1, 2));
        assert!(a.rect.bottom() < b.rect.y);
        assert!(b.rect.bottom() < c.rect.y);
    }

    #[test]
    fn left_right_chain_flows_rightward() {
        let config = LayoutConfig {
            direction: Direction::LeftRight,
            ..LayoutConfig::default()
        };
        let out = compute(&chain(), &config).unwrap();
        assert_eq!(out.direction, Direction::LeftRight);
        let (a, b) = (out.node("a").unwrap(), out.node("b").unwrap());
        assert!(a.rect.right() < b.rect.x);
    }

    #[test]
    fn same_rank_nodes_do_not_overlap() {
        let g = graph(
            r#"{"nodes": [
                {"id": "root", "type": "node", "label": "Root"},
                {"id": "x", "type": "node", "label": "Alpha"},
                {"id": "y", "type": "node", "label": "Beta"},
                {"id": "z", "type": "node", "label": "Gamma"},
                {"id": "w", "type": "node", "label": "Delta"}
            ], "edges": [
                {"source": "root", "target": "x", "type": "normal"},
                {"source": "root", "target": "y", "type": "normal"},
                {"source": "root", "target": "z", "type": "normal"},
                {"source": "root", "target": "w", "type": "normal"}
            ], "subgraphs": []}"#,
        );
        let out = compute(&g, &LayoutConfig::default()).unwrap();
        for (i, a) in out.nodes.iter().enumerate() {
            for b in &out.nodes[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect), "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn containers_enclose_their_members() {
        let out = compute(&nested(), &LayoutConfig::default()).unwrap();
        assert_eq!(out.nodes.len(), 4);
        assert_eq!(out.containers.len(), 2);

        let svc = out.container("svc").unwrap();
        let inner = out.container("inner").unwrap();
        assert_eq!(svc.depth, 0);
        assert_eq!(inner.depth, 1);
        assert_eq!(inner.parent.as_deref(), Some("svc"));
        assert!(svc.rect.contains(&inner.rect));
        for id in ["db", "cache"] {
            let n = out.node(id).unwrap();
            assert_eq!(n.parent.as_deref(), Some("inner"));
            assert!(inner.rect.contains(&n.rect));
        }
        assert!(svc.rect.contains(&out.node("api").unwrap().rect));
        assert!(!svc.rect.overlaps(&out.node("user").unwrap().rect));
    }

    #[test]
    fn pinned_node_keeps_its_position() {
        let g = graph(
            r#"{"nodes": [
                {"id": "a", "type": "node", "label": "A",
                 "metadata": {"style": {}, "position": {"x": 5, "y": 7}, "importance": 0}},
                {"id": "b", "type": "node", "label": "B"}
            ], "edges": [
                {"source": "a", "target": "b", "type": "normal"}
            ], "subgraphs": []}"#,
        );
        let out = compute(&g, &LayoutConfig::default()).unwrap();
        let a = out.node("a").unwrap();
        assert!(a.pinned);
        assert!(!out.node("b").unwrap().pinned);
        assert!((a.center.x - 5.0).abs() < EPS);
        assert!((a.center.y - 7.0).abs() < EPS);
    }

    #[test]
    fn dangling_edges_are_skipped() {
        let g = graph(
            r#"{"nodes": [
                {"id": "a", "type": "node", "label": "A"},
                {"id": "b", "type": "node", "label": "B"}
            ], "edges": [
                {"source": "a", "target": "b", "type": "normal"},
                {"source": "a", "target": "ghost", "type": "normal"}
            ], "subgraphs": []}"#,
        );
        let out = compute(&g, &LayoutConfig::default()).unwrap();
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.metrics.dangling_edge_count, 1);
    }

    #[test]
    fn important_nodes_are_larger() {
        let g = graph(
            r#"{"nodes": [
                {"id": "a", "type": "node", "label": "Same",
                 "metadata": {"style": {}, "importance": 0.9}},
                {"id": "b", "type": "node", "label": "Same",
                 "metadata": {"style": {}, "importance": 0.1}}
            ], "edges": [], "subgraphs": []}"#,
        );
        let out = compute_with_source(&g, &LayoutConfig::default(), &MetadataImportance).unwrap();
        assert_eq!(out.importance_source, "metadata");
        let (a, b) = (out.node("a").unwrap(), out.node("b").unwrap());
        assert_eq!(a.importance, 1.0);
        assert_eq!(b.importance, 0.0);
        assert!(a.rect.width > b.rect.width);
        assert!(a.rect.height > b.rect.height);
    }

    #[test]
    fn zero_scale_keeps_base_size() {
        let config = LayoutConfig {
            importance_scale: 0.0,
            ..LayoutConfig::default()
        };
        let out = compute_with_source(&chain(), &config, &DegreeImportance).unwrap();
        let b = out.node("b").unwrap();
        assert_eq!(b.rect.width, 6.0 + LABEL_PAD);
        assert_eq!(b.rect.height, 3.0);
    }

    #[test]
    fn layout_starts_at_margin() {
        let config = LayoutConfig {
            margin: 2.0,
            ..LayoutConfig::default()
        };
        let out = compute(&nested(), &config).unwrap();
        let rects = out
            .nodes
            .iter()
            .map(|n| n.rect)
            .chain(out.containers.iter().map(|c| c.rect));
        let (min_x, min_y) = rects.fold((f64::INFINITY, f64::INFINITY), |(x, y), r| {
            (x.min(r.x), y.min(r.y))
        });
        assert!((min_x - 2.0).abs() < EPS);
        assert!((min_y - 2.0).abs() < EPS);
        for n in &out.nodes {
            assert!(n.rect.right() <= out.width - 2.0 + EPS);
            assert!(n.rect.bottom() <= out.height - 2.0 + EPS);
        }
    }

    #[test]
    fn edge_paths_start_and_end_on_their_nodes() {
        let out = compute(&chain(), &LayoutConfig::default()).unwrap();
        assert_eq!(out.edges.len(), 2);
        for edge in &out.edges {
            let source = out.node(&edge.source).unwrap().rect;
            let target = out.node(&edge.target).unwrap().rect;
            let first = edge.points[0];
            let last = edge.points[edge.points.len() - 1];
            assert!((first.y - source.bottom()).abs() < EPS);
            assert!((last.y - target.y).abs() < EPS);
        }
        let labelled = &out.edges[1];
        assert_eq!(labelled.kind, EdgeKind::Emphasis);
        assert_eq!(labelled.label.as_deref(), Some("done"));
    }

    #[test]
    fn edge_kind_nodes_are_placed_like_nodes() {
        let g = graph(
            r#"{"nodes": [
                {"id": "a", "type": "node", "label": "A"},
                {"id": "via", "type": "edge", "label": "via"},
                {"id": "b", "type": "node", "label": "B"}
            ], "edges": [
                {"source": "a", "target": "via", "type": "normal"},
                {"source": "via", "target": "b", "type": "normal"}
            ], "subgraphs": []}"#,
        );
        let out = compute(&g, &LayoutConfig::default()).unwrap();
        let via = out.node("via").unwrap();
        assert_eq!(via.kind, NodeKind::Edge);
        assert_eq!(via.rank, 1);
    }

    /// Ids of `id` and every container enclosing it.
    fn lineage(out: &LayoutResult, id: &str) -> Vec<String> {
        let parents: HashMap<&str, Option<&str>> = out
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.parent.as_deref()))
            .chain(out.containers.iter().map(|c| (c.id.as_str(), c.parent.as_deref())))
            .collect();
        let mut chain = vec![id.to_string()];
        let mut at = parents.get(id).copied().flatten();
        while let Some(p) = at {
            chain.push(p.to_string());
            at = parents.get(p).copied().flatten();
        }
        chain
    }

    /// Leaves never overlap each other, and a container overlaps only the
    /// leaves and containers nested in it or enclosing it.
    fn assert_no_overlaps(out: &LayoutResult) {
        for (i, a) in out.nodes.iter().enumerate() {
            for b in &out.nodes[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect), "{} overlaps {}", a.id, b.id);
            }
        }
        for c in &out.containers {
            for n in &out.nodes {
                if !lineage(out, &n.id).contains(&c.id) {
                    assert!(!c.rect.overlaps(&n.rect), "{} covers foreign {}", c.id, n.id);
                }
            }
            for d in &out.containers {
                let related = lineage(out, &d.id).contains(&c.id) || lineage(out, &c.id).contains(&d.id);
                if !related {
                    assert!(!c.rect.overlaps(&d.rect), "{} overlaps {}", c.id, d.id);
                }
            }
        }
    }

    #[test]
    fn nearest_free_keeps_clear_positions() {
        assert_eq!(nearest_free(5.0, vec![]), 5.0);
        assert_eq!(nearest_free(5.0, vec![(6.0, 9.0), (0.0, 5.0)]), 5.0);
    }

    #[test]
    fn nearest_free_picks_closer_edge_of_merged_block() {
        // (0, 4) and (3, 10) merge into (0, 10).
        assert_eq!(nearest_free(3.0, vec![(3.0, 10.0), (0.0, 4.0)]), 0.0);
        assert_eq!(nearest_free(7.0, vec![(3.0, 10.0), (0.0, 4.0)]), 10.0);
        assert_eq!(nearest_free(5.0, vec![(0.0, 10.0)]), 0.0);
    }

    #[test]
    fn pinned_leaf_shares_rank_without_overlap() {
        let config = LayoutConfig {
            iterations: 50,
            ..LayoutConfig::default()
        };
        for x in -40..=40 {
            let g = graph(&format!(
                r#"{{"nodes": [
                    {{"id": "a", "type": "node", "label": "Anchored",
                      "metadata": {{"style": {{}}, "position": {{"x": {x}, "y": 1.5}}, "importance": 0}}}},
                    {{"id": "b", "type": "node", "label": "Floating"}},
                    {{"id": "c", "type": "node", "label": "Drifting"}}
                ], "edges": [], "subgraphs": []}}"#
            ));
            let out = compute(&g, &config).unwrap();
            let a = out.node("a").unwrap();
            assert!((a.center.x - x as f64).abs() < EPS, "pinned moved at x={x}");
            assert!((a.center.y - 1.5).abs() < EPS, "pinned moved at x={x}");
            assert_no_overlaps(&out);
        }
    }

    #[test]
    fn pinned_leaf_inside_container_holds_the_container() {
        let g = graph(
            r#"{"nodes": [
                {"id": "g", "type": "subgraph", "label": "Group", "children": [
                    {"id": "p", "type": "node", "label": "Pinned",
                     "metadata": {"style": {}, "position": {"x": 0, "y": 0}, "importance": 0}},
                    {"id": "q", "type": "node", "label": "Loose"}
                ]},
                {"id": "r", "type": "node", "label": "Outside"}
            ], "edges": [
                {"source": "r", "target": "q", "type": "normal"}
            ], "subgraphs": []}"#,
        );
        let out = compute(&g, &LayoutConfig::default()).unwrap();
        let p = out.node("p").unwrap();
        assert!(p.center.x.abs() < EPS && p.center.y.abs() < EPS);
        assert_no_overlaps(&out);
    }

    #[test]
    fn container_spanning_ranks_keeps_foreign_nodes_out() {
        let g = graph(
            r#"{"nodes": [
                {"id": "g", "type": "subgraph", "label": "Group", "children": [
                    {"id": "m1", "type": "node", "label": "Member one"},
                    {"id": "m2", "type": "node", "label": "Member two"},
                    {"id": "m3", "type": "node", "label": "Member three"}
                ]},
                {"id": "e0", "type": "node", "label": "External zero"},
                {"id": "e1", "type": "node", "label": "External one"},
                {"id": "e2", "type": "node", "label": "External two"}
            ], "edges": [
                {"source": "m1", "target": "m2", "type": "normal"},
                {"source": "m2", "target": "m3", "type": "normal"},
                {"source": "e0", "target": "e1", "type": "normal"},
                {"source": "e1", "target": "e2", "type": "normal"},
                {"source": "e0", "target": "g", "type": "subflow"}
            ], "subgraphs": []}"#,
        );
        for direction in [Direction::TopDown, Direction::LeftRight] {
            let config = LayoutConfig {
                direction,
                ..LayoutConfig::default()
            };
            let out = compute(&g, &config).unwrap();
            let group = out.container("g").unwrap();
            for id in ["m1", "m2", "m3"] {
                assert!(group.rect.contains(&out.node(id).unwrap().rect));
            }
            for id in ["e0", "e1", "e2"] {
                assert!(!group.rect.overlaps(&out.node(id).unwrap().rect), "{id} inside g");
            }
            assert_no_overlaps(&out);
        }
    }

    #[test]
    fn long_container_title_pushes_neighbours_aside() {
        let title = "A container title that is exactly fifty chars long";
        assert_eq!(title.len(), 50);
        let g = graph(&format!(
            r#"{{"nodes": [
                {{"id": "g", "type": "subgraph", "label": "{title}", "children": [
                    {{"id": "x", "type": "node", "label": "X"}}
                ]}},
                {{"id": "y", "type": "node", "label": "Y"}},
                {{"id": "z", "type": "node", "label": "Z"}}
            ], "edges": [], "subgraphs": []}}"#
        ));
        let out = compute(&g, &LayoutConfig::default()).unwrap();
        let group = out.container("g").unwrap();
        assert!(group.rect.width >= 50.0 + CONTAINER_TITLE_DECOR);
        assert!(!group.rect.overlaps(&out.node("y").unwrap().rect));
        assert!(!group.rect.overlaps(&out.node("z").unwrap().rect));
        assert_no_overlaps(&out);
    }

    #[test]
    fn partial_hierarchy_weight_has_no_overlaps() {
        for weight in [0.0, 0.3, 0.7] {
            for direction in [Direction::TopDown, Direction::LeftRight] {
                let config = LayoutConfig {
                    direction,
                    hierarchy_weight: weight,
                    ..LayoutConfig::default()
                };
                assert_no_overlaps(&compute(&nested(), &config).unwrap());
                assert_no_overlaps(&compute(&chain(), &config).unwrap());
            }
        }
    }

    #[test]
    fn nested_fixture_has_no_overlaps() {
        assert_no_overlaps(&compute(&nested(), &LayoutConfig::default()).unwrap());
    }

    #[test]
    fn ranks_agree_with_metrics() {
        let g = graph(
            r#"{"nodes": [
                {"id": "client", "type": "node", "label": "Client"},
                {"id": "backend", "type": "subgraph", "label": "Backend", "children": [
                    {"id": "api", "type": "node", "label": "API"},
                    {"id": "db", "type": "node", "label": "DB"}
                ]}
            ], "edges": [
                {"source": "client", "target": "backend", "type": "subflow"},
                {"source": "api", "target": "db", "type": "normal"}
            ], "subgraphs": []}"#,
        );
        let out = compute(&g, &LayoutConfig::default()).unwrap();
        let ranks = out.nodes.iter().map(|n| n.rank).max().unwrap() + 1;
        assert_eq!(out.metrics.rank_count, ranks);
        assert_eq!(ranks, 3);
    }
}
