//! Undirected weighted multigraph built from line features.
//!
//! Nodes are keyed by exact endpoint coordinates. Each feature contributes at
//! most one edge; parallel edges between the same pair of nodes are kept.

use crate::feature::{Feature, FeatureId};
use crate::geometry::{CoordKey, Frame, to_endpoints};
use ahash::AHashMap as HashMap;
use geo::{Coord, LineString};
use log::{debug, info};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub type NodeId = usize;
pub type EdgeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    pub coord: Coord<f64>,
    incident: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Traversal cost; equals `length` unless score weighting reduced it.
    pub weight: f64,
    /// True measured length in metres.
    pub length: f64,
    /// Original coordinates, oriented `from` -> `to`.
    pub geometry: LineString<f64>,
    pub feature: FeatureId,
}

impl Edge {
    pub fn other(&self, node: NodeId) -> NodeId {
        if node == self.from { self.to } else { self.from }
    }

    /// Geometry as seen when leaving `from`; reversed if `from` is the far end.
    pub fn oriented_geometry(&self, from: NodeId) -> LineString<f64> {
        if from == self.from {
            self.geometry.clone()
        } else {
            LineString::new(self.geometry.0.iter().rev().copied().collect())
        }
    }
}

#[derive(Debug, Clone)]
pub struct Graph {
    frame: Frame,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<CoordKey, NodeId>,
}

impl Graph {
    fn new(frame: Frame) -> Self {
        Self {
            frame,
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn node_for(&mut self, coord: Coord<f64>) -> NodeId {
        let nodes = &mut self.nodes;
        *self.index.entry(CoordKey::from(coord)).or_insert_with(|| {
            nodes.push(Node {
                coord,
                incident: Vec::new(),
            });
            nodes.len() - 1
        })
    }

    fn add_edge(&mut self, edge: Edge) {
        let id = self.edges.len();
        self.nodes[edge.from].incident.push(id);
        self.nodes[edge.to].incident.push(id);
        self.edges.push(edge);
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    /// Node sitting exactly on `coord`, if any.
    pub fn node_at(&self, coord: Coord<f64>) -> Option<NodeId> {
        self.index.get(&CoordKey::from(coord)).copied()
    }

    pub fn incident(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node].incident
    }

    /// Ordinary weighted shortest path between two nodes.
    pub fn shortest_path(&self, source: NodeId, target: NodeId) -> Option<PathResult> {
        if source == target {
            return Some(PathResult::default());
        }

        let mut dist: Vec<f64> = vec![f64::INFINITY; self.nodes.len()];
        // node -> (edge used to reach it, previous node)
        let mut predecessors: HashMap<NodeId, (EdgeId, NodeId)> = HashMap::new();
        let mut heap = BinaryHeap::new();

        dist[source] = 0.0;
        heap.push(State {
            cost: OrderedFloat(0.0),
            node: source,
        });

        while let Some(State { cost, node }) = heap.pop() {
            if node == target {
                break;
            }
            if cost.0 > dist[node] {
                continue;
            }

            for &edge_id in &self.nodes[node].incident {
                let edge = &self.edges[edge_id];
                let next = edge.other(node);
                let next_cost = cost.0 + edge.weight;
                if next_cost < dist[next] {
                    dist[next] = next_cost;
                    predecessors.insert(next, (edge_id, node));
                    heap.push(State {
                        cost: OrderedFloat(next_cost),
                        node: next,
                    });
                }
            }
        }

        if !dist[target].is_finite() {
            return None;
        }

        let mut steps = Vec::new();
        let mut curr = target;
        while curr != source {
            let &(edge, prev) = predecessors.get(&curr)?;
            steps.push(PathStep {
                edge,
                from: prev,
                to: curr,
            });
            curr = prev;
        }
        steps.reverse();

        Some(PathResult::from_steps(self, steps))
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
struct State {
    cost: OrderedFloat<f64>,
    node: NodeId,
}

// Flipped so the heap pops the cheapest state first.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One hop of a walk: a concrete edge and the direction it was taken in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathStep {
    pub edge: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
}

/// A walk through the graph with its accumulated cost and true length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathResult {
    pub steps: Vec<PathStep>,
    pub weight: f64,
    pub length: f64,
}

impl PathResult {
    pub fn from_steps(graph: &Graph, steps: Vec<PathStep>) -> Self {
        let (weight, length) = steps.iter().fold((0.0, 0.0), |(w, l), step| {
            let edge = graph.edge(step.edge);
            (w + edge.weight, l + edge.length)
        });
        Self {
            steps,
            weight,
            length,
        }
    }

    pub fn start_node(&self) -> Option<NodeId> {
        self.steps.first().map(|s| s.from)
    }

    pub fn end_node(&self) -> Option<NodeId> {
        self.steps.last().map(|s| s.to)
    }

    /// Edge geometries in traversal order, each oriented along the walk.
    pub fn segments(&self, graph: &Graph) -> Vec<LineString<f64>> {
        self.steps
            .iter()
            .map(|s| graph.edge(s.edge).oriented_geometry(s.from))
            .collect()
    }
}

/// Effective traversal cost of a feature.
///
/// With score weighting on, a non-negative score divides the length by
/// `1 + score`: more desirable features are cheaper but never free.
pub fn effective_weight(length: f64, score: Option<f64>, score_weighting: bool) -> f64 {
    match score {
        Some(s) if score_weighting && s.is_finite() && s >= 0.0 => length / (1.0 + s),
        _ => length,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GraphBuilder {
    frame: Frame,
    score_weighting: bool,
}

impl GraphBuilder {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            score_weighting: false,
        }
    }

    pub fn score_weighting(mut self, enabled: bool) -> Self {
        self.score_weighting = enabled;
        self
    }

    pub fn build<'a, I>(&self, features: I) -> Graph
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let mut graph = Graph::new(self.frame);
        let mut skipped = 0usize;

        for feature in features {
            let ends = match to_endpoints(feature, self.frame) {
                Ok(ends) => ends,
                Err(e) => {
                    debug!("Skipping feature: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            if CoordKey::from(ends.start) == CoordKey::from(ends.end) {
                debug!("Skipping closed feature {} (would be a self-loop)", feature.id);
                skipped += 1;
                continue;
            }

            let weight = effective_weight(ends.length, feature.score, self.score_weighting);
            if !(weight > 0.0 && weight.is_finite()) {
                debug!("Skipping feature {} with weight {}", feature.id, weight);
                skipped += 1;
                continue;
            }

            let from = graph.node_for(ends.start);
            let to = graph.node_for(ends.end);
            debug!(
                "Edge {} -> {} ({}), length {:.2} m, weight {:.2}",
                from, to, feature.id, ends.length, weight
            );
            graph.add_edge(Edge {
                from,
                to,
                weight,
                length: ends.length,
                geometry: feature.line_string(),
                feature: feature.id.clone(),
            });
        }

        info!(
            "Built graph: {} nodes, {} edges, {} features skipped",
            graph.node_count(),
            graph.edge_count(),
            skipped
        );
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn line(id: &str, pts: &[(f64, f64)]) -> Feature {
        Feature::new(id, pts.iter().map(|&(x, y)| coord! { x: x, y: y }).collect())
    }

    #[test]
    fn test_shared_endpoints_become_one_node() {
        let features = vec![
            line("a", &[(0.0, 0.0), (100.0, 0.0)]),
            line("b", &[(100.0, 0.0), (100.0, 50.0), (200.0, 50.0)]),
        ];
        let graph = GraphBuilder::new(Frame::Projected).build(&features);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let shared = graph.node_at(coord! { x: 100.0, y: 0.0 }).unwrap();
        assert_eq!(graph.incident(shared).len(), 2);
        assert!((graph.edge(1).length - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_and_closed_features_are_skipped() {
        let features = vec![
            line("point", &[(0.0, 0.0)]),
            line("empty", &[]),
            line("ring", &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]),
            line("ok", &[(0.0, 0.0), (10.0, 0.0)]),
        ];
        let graph = GraphBuilder::new(Frame::Projected).build(&features);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge(0).feature.0, "ok");
    }

    #[test]
    fn test_parallel_edges_are_kept() {
        let features = vec![
            line("straight", &[(0.0, 0.0), (10.0, 0.0)]),
            line("detour", &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]),
        ];
        let graph = GraphBuilder::new(Frame::Projected).build(&features);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_edge_weights_positive_and_finite() {
        let features = vec![
            line("a", &[(0.0, 0.0), (1e-9, 0.0)]),
            line("b", &[(0.0, 0.0), (0.0, 1e6)]),
            line("c", &[(3.0, 3.0), (3.0, 3.0)]),
        ];
        let graph = GraphBuilder::new(Frame::Projected).build(&features);
        assert_eq!(graph.edge_count(), 2);
        for edge in graph.edges() {
            assert!(edge.weight > 0.0 && edge.weight.is_finite());
        }
    }

    #[test]
    fn test_score_weighting_is_monotonic() {
        let mut last = f64::INFINITY;
        for score in [0.0, 0.5, 1.0, 4.0, 100.0] {
            let w = effective_weight(200.0, Some(score), true);
            assert!(w < last);
            assert!(w > 0.0);
            last = w;
        }
        assert_eq!(effective_weight(200.0, Some(3.0), false), 200.0);
        assert_eq!(effective_weight(200.0, Some(-1.0), true), 200.0);
        assert_eq!(effective_weight(200.0, None, true), 200.0);
    }

    #[test]
    fn test_score_weighting_applied_by_builder() {
        let features = vec![line("a", &[(0.0, 0.0), (100.0, 0.0)]).with_score(1.0)];
        let weighted = GraphBuilder::new(Frame::Projected)
            .score_weighting(true)
            .build(&features);
        assert!((weighted.edge(0).weight - 50.0).abs() < 1e-9);
        assert!((weighted.edge(0).length - 100.0).abs() < 1e-9);

        let plain = GraphBuilder::new(Frame::Projected).build(&features);
        assert!((plain.edge(0).weight - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_oriented_geometry_reverses() {
        let features = vec![line("a", &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)])];
        let graph = GraphBuilder::new(Frame::Projected).build(&features);
        let edge = graph.edge(0);
        let back = edge.oriented_geometry(edge.to);
        assert_eq!(back.0.first(), Some(&coord! { x: 10.0, y: 0.0 }));
        assert_eq!(back.0.last(), Some(&coord! { x: 0.0, y: 0.0 }));
        assert_eq!(back.0[1], coord! { x: 5.0, y: 5.0 });
    }

    #[test]
    fn test_shortest_path_prefers_cheaper_parallel_edge() {
        let features = vec![
            line("detour", &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]),
            line("straight", &[(0.0, 0.0), (10.0, 0.0)]),
            line("tail", &[(10.0, 0.0), (20.0, 0.0)]),
            line("island", &[(100.0, 100.0), (110.0, 100.0)]),
        ];
        let graph = GraphBuilder::new(Frame::Projected).build(&features);
        let a = graph.node_at(coord! { x: 0.0, y: 0.0 }).unwrap();
        let c = graph.node_at(coord! { x: 20.0, y: 0.0 }).unwrap();
        let island = graph.node_at(coord! { x: 100.0, y: 100.0 }).unwrap();

        let path = graph.shortest_path(c, a).unwrap();
        assert_eq!(path.steps.len(), 2);
        assert!((path.weight - 20.0).abs() < 1e-9);
        assert_eq!(graph.edge(path.steps[1].edge).feature.0, "straight");
        assert_eq!(path.start_node(), Some(c));
        assert_eq!(path.end_node(), Some(a));

        assert!(graph.shortest_path(a, island).is_none());
        assert_eq!(graph.shortest_path(a, a).unwrap().steps.len(), 0);
    }
}
