//! Orthogonal edge routing between placed rectangles.
//!
//! Routes are computed in a frame where `main` runs along the flow direction
//! and `cross` across it, then mapped back to x/y.

use std::collections::HashMap;

use crate::config::Direction;
use crate::graph_layout::{Point, Rect};

/// Spacing between parallel edges sharing a pair of endpoints.
const LANE_GAP: f64 = 1.0;
/// Reach of a self-loop beyond its node.
const LOOP_SIZE: f64 = 2.0;
const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct RoutedEdge {
    pub from: usize,
    pub to: usize,
    pub source: Rect,
    pub target: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    pub points: Vec<Point>,
    pub label_anchor: Point,
}

impl RoutedPath {
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
        self.label_anchor.x += dx;
        self.label_anchor.y += dy;
    }
}

/// Rectangle in the flow frame.
#[derive(Debug, Clone, Copy)]
struct Span {
    main_start: f64,
    main_end: f64,
    cross_start: f64,
    cross_end: f64,
}

impl Span {
    fn of(r: Rect, dir: Direction) -> Self {
        match dir {
            Direction::TopDown => Span {
                main_start: r.y,
                main_end: r.bottom(),
                cross_start: r.x,
                cross_end: r.right(),
            },
            Direction::LeftRight => Span {
                main_start: r.x,
                main_end: r.right(),
                cross_start: r.y,
                cross_end: r.bottom(),
            },
        }
    }

    fn main_mid(&self) -> f64 {
        (self.main_start + self.main_end) / 2.0
    }

    fn cross_mid(&self) -> f64 {
        (self.cross_start + self.cross_end) / 2.0
    }

    fn cross_half(&self) -> f64 {
        (self.cross_end - self.cross_start) / 2.0
    }
}

/// Point in the flow frame: (main, cross).
type FramePoint = (f64, f64);

fn to_point((main, cross): FramePoint, dir: Direction) -> Point {
    match dir {
        Direction::TopDown => Point { x: cross, y: main },
        Direction::LeftRight => Point { x: main, y: cross },
    }
}

pub fn route_edges(edges: &[RoutedEdge], dir: Direction) -> Vec<RoutedPath> {
    // Lane of each edge among the edges joining the same pair of vertices.
    let mut totals: HashMap<(usize, usize), usize> = HashMap::new();
    for e in edges {
        *totals.entry(pair_key(e)).or_insert(0) += 1;
    }
    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();

    edges
        .iter()
        .map(|e| {
            let key = pair_key(e);
            let lane = {
                let slot = seen.entry(key).or_insert(0);
                let lane = *slot;
                *slot += 1;
                lane
            };
            let total = totals.get(&key).copied().unwrap_or(1);
            let frame = if e.from == e.to {
                self_loop(Span::of(e.source, dir), lane)
            } else {
                route(Span::of(e.source, dir), Span::of(e.target, dir), lane, total)
            };
            let anchor = label_anchor(&frame);
            RoutedPath {
                points: frame.into_iter().map(|p| to_point(p, dir)).collect(),
                label_anchor: to_point(anchor, dir),
            }
        })
        .collect()
}

fn pair_key(e: &RoutedEdge) -> (usize, usize) {
    (e.from.min(e.to), e.from.max(e.to))
}

fn lane_offset(lane: usize, total: usize, a: &Span, b: &Span) -> f64 {
    if total < 2 {
        return 0.0;
    }
    let raw = (lane as f64 - (total - 1) as f64 / 2.0) * LANE_GAP;
    let limit = (a.cross_half().min(b.cross_half()) - 0.5).max(0.0);
    raw.clamp(-limit, limit)
}

fn route(s: Span, t: Span, lane: usize, total: usize) -> Vec<FramePoint> {
    if t.main_start >= s.main_end - EPS || t.main_end <= s.main_start + EPS {
        // Separated along the flow: leave and enter through the facing sides.
        let forward = t.main_start >= s.main_end - EPS;
        let off = lane_offset(lane, total, &s, &t);
        let start = (
            if forward { s.main_end } else { s.main_start },
            s.cross_mid() + off,
        );
        let end = (
            if forward { t.main_start } else { t.main_end },
            t.cross_mid() + off,
        );
        if (start.1 - end.1).abs() < EPS {
            return vec![start, end];
        }
        let mid = (start.0 + end.0) / 2.0;
        vec![start, (mid, start.1), (mid, end.1), end]
    } else {
        // Overlapping along the flow (same rank): go across.
        let rightward = t.cross_mid() >= s.cross_mid();
        let off = (lane as f64 - (total.max(1) - 1) as f64 / 2.0) * LANE_GAP;
        let start = (
            s.main_mid() + off,
            if rightward { s.cross_end } else { s.cross_start },
        );
        let end = (
            t.main_mid() + off,
            if rightward { t.cross_start } else { t.cross_end },
        );
        if (start.0 - end.0).abs() < EPS {
            return vec![start, end];
        }
        let mid = (start.1 + end.1) / 2.0;
        vec![start, (start.0, mid), (end.0, mid), end]
    }
}

fn self_loop(s: Span, lane: usize) -> Vec<FramePoint> {
    let reach = LOOP_SIZE + lane as f64 * LANE_GAP;
    let out_cross = s.cross_end + reach;
    let above = s.main_start - reach;
    vec![
        (s.main_mid(), s.cross_end),
        (s.main_mid(), out_cross),
        (above, out_cross),
        (above, s.cross_mid()),
        (s.main_start, s.cross_mid()),
    ]
}

fn label_anchor(points: &[FramePoint]) -> FramePoint {
    match points.len() {
        0 => (0.0, 0.0),
        1 => points[0],
        n => {
            // Central segment: the middle one for odd segment counts, else
            // the one just past the middle.
            let i = (n - 1) / 2;
            let (a, b) = (points[i], points[i + 1]);
            ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
        }
    }
}
