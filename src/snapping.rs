use crate::graph::{Graph, NodeId};
use geo::Coord;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snap {
    pub node: NodeId,
    pub distance: f64,
}

/// Nearest graph node to `point`, if it lies within `max_distance` metres.
///
/// Linear scan; the connectivity graphs built from one buffered area have a
/// few hundred nodes at most.
pub fn snap(point: Coord<f64>, graph: &Graph, max_distance: f64) -> Option<Snap> {
    let frame = graph.frame();
    let mut best: Option<Snap> = None;

    for (idx, node) in graph.nodes().iter().enumerate() {
        let distance = frame.point_distance(point, node.coord);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Snap {
                node: idx,
                distance,
            });
        }
    }

    best.filter(|b| b.distance <= max_distance)
}
