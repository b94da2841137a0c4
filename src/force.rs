//! Force-directed base layout.
//!
//! Wraps the `force_graph` simulation. Output coordinates are in simulation
//! units; the layout pipeline scales them into cells.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::graph_layout::Point;

/// Simulation units per layout cell.
pub const UNITS_PER_CELL: f64 = 10.0;

pub struct ForceInput<'a> {
    /// Vertex indices to place, in a stable order.
    pub vertices: &'a [usize],
    /// Attractive pairs (edges and container cohesion).
    pub springs: &'a [(usize, usize)],
    /// Vertices held at a fixed position, in simulation units.
    pub pinned: &'a HashMap<usize, Point>,
    pub iterations: usize,
    pub time_step: f32,
}

/// Initial placement: evenly spaced on a circle around the origin.
pub fn initial_positions(count: usize) -> Vec<Point> {
    let radius = 100.0 + 20.0 * count as f64;
    (0..count)
        .map(|i| {
            let angle = (i as f64) * 2.0 * PI / count.max(1) as f64;
            Point {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            }
        })
        .collect()
}

pub fn force_directed_layout(input: &ForceInput<'_>) -> HashMap<usize, Point> {
    let start = initial_positions(input.vertices.len());

    let mut graph: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
        force_charge: 150.0,
        force_spring: 0.05,
        force_max: 100.0,
        node_speed: 3000.0,
        damping_factor: 0.9,
    });

    let mut idx_of: HashMap<usize, DefaultNodeIdx> = HashMap::new();
    for (i, &vertex) in input.vertices.iter().enumerate() {
        let (p, is_anchor) = match input.pinned.get(&vertex) {
            Some(p) => (*p, true),
            None => (start[i], false),
        };
        let idx = graph.add_node(NodeData {
            x: p.x as f32,
            y: p.y as f32,
            mass: 10.0,
            is_anchor,
            user_data: vertex,
        });
        idx_of.insert(vertex, idx);
    }

    for &(a, b) in input.springs {
        if a == b {
            continue;
        }
        if let (Some(&src), Some(&tgt)) = (idx_of.get(&a), idx_of.get(&b)) {
            graph.add_edge(src, tgt, EdgeData::default());
        }
    }

    for _ in 0..input.iterations {
        graph.update(input.time_step);
    }

    let mut positions: HashMap<usize, Point> = HashMap::new();
    let mut finite = true;
    graph.visit_nodes(|node| {
        let (x, y) = (node.x() as f64, node.y() as f64);
        finite &= x.is_finite() && y.is_finite();
        positions.insert(node.data.user_data, Point { x, y });
    });

    if !finite {
        log::warn!("force simulation diverged; using initial placement");
        return input
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, input.pinned.get(&v).copied().unwrap_or(start[i])))
            .collect();
    }

    positions
}
