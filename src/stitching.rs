//! Greedy multi-stop stitching of disjoint line features.
//!
//! Features are visited nearest-next (a single-pass greedy TSP heuristic,
//! not an optimal tour) and consecutive features are joined through a
//! separate connectivity graph, typically the road network around them.
//! Any pair that cannot be joined fails the whole attempt.

use crate::error::RoutingError;
use crate::feature::{Feature, FeatureId};
use crate::geometry::{CoordKey, Endpoints, to_endpoints};
use crate::graph::Graph;
use crate::snapping::snap;
use geo::{Coord, LineString};
use log::{debug, info, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum SegmentKind {
    /// One of the input features, in its own orientation.
    Feature(FeatureId),
    /// Straight hop between a feature end and the connectivity node it
    /// snapped to.
    SnapLink,
    /// An edge of the connectivity graph joining two features.
    Connector { from: FeatureId, to: FeatureId },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteSegment {
    pub kind: SegmentKind,
    pub geometry: LineString<f64>,
    pub length: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StitchResult {
    /// Feature ids in the order they were visited.
    pub visit_order: Vec<FeatureId>,
    pub segments: Vec<RouteSegment>,
}

impl StitchResult {
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    pub fn geometries(&self) -> Vec<LineString<f64>> {
        self.segments.iter().map(|s| s.geometry.clone()).collect()
    }
}

struct Stop<'a> {
    feature: &'a Feature,
    ends: Endpoints,
}

/// Visit every feature, starting with the first one supplied, joining each
/// to the next through `connectivity`.
pub fn stitch(
    features: &[Feature],
    connectivity: &Graph,
    snap_distance: f64,
) -> Result<StitchResult, RoutingError> {
    let frame = connectivity.frame();

    let mut remaining: Vec<Stop> = Vec::with_capacity(features.len());
    for feature in features {
        match to_endpoints(feature, frame) {
            Ok(ends) => remaining.push(Stop { feature, ends }),
            Err(e) => warn!("Not stitching: {}", e),
        }
    }

    let mut result = StitchResult::default();
    if remaining.is_empty() {
        return Ok(result);
    }

    let mut current = remaining.remove(0);
    push_feature(&mut result, &current);

    while !remaining.is_empty() {
        let here = current.ends.end;

        // First minimum wins, so ties keep caller order.
        let mut next_idx = 0;
        let mut next_dist = f64::INFINITY;
        for (idx, candidate) in remaining.iter().enumerate() {
            let d = frame.point_distance(here, candidate.ends.start);
            if d < next_dist {
                next_dist = d;
                next_idx = idx;
            }
        }
        let next = remaining.remove(next_idx);

        let from_id = &current.feature.id;
        let to_id = &next.feature.id;
        debug!("Joining {} -> {} ({:.1} m apart)", from_id, to_id, next_dist);

        let snap_failure = |point: Coord<f64>| RoutingError::SnapFailure {
            from_feature: from_id.clone(),
            to_feature: to_id.clone(),
            point,
            max_distance: snap_distance,
        };
        let exit = snap(here, connectivity, snap_distance).ok_or_else(|| snap_failure(here));
        let entry = snap(next.ends.start, connectivity, snap_distance)
            .ok_or_else(|| snap_failure(next.ends.start));
        let (exit, entry) = match (exit, entry) {
            (Ok(exit), Ok(entry)) => (exit, entry),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Stitching failed: {}", e);
                return Err(e);
            }
        };

        let Some(path) = connectivity.shortest_path(exit.node, entry.node) else {
            let e = RoutingError::NoConnectingPath {
                from_feature: from_id.clone(),
                to_feature: to_id.clone(),
            };
            warn!("Stitching failed: {}", e);
            return Err(e);
        };

        push_snap_link(&mut result, connectivity, here, connectivity.node(exit.node).coord);
        for step in &path.steps {
            let edge = connectivity.edge(step.edge);
            result.segments.push(RouteSegment {
                kind: SegmentKind::Connector {
                    from: from_id.clone(),
                    to: to_id.clone(),
                },
                geometry: edge.oriented_geometry(step.from),
                length: edge.length,
            });
        }
        push_snap_link(
            &mut result,
            connectivity,
            connectivity.node(entry.node).coord,
            next.ends.start,
        );

        push_feature(&mut result, &next);
        current = next;
    }

    info!(
        "Stitched {} features into {} segments, {:.1} m total",
        result.visit_order.len(),
        result.segments.len(),
        result.total_length()
    );
    Ok(result)
}

fn push_feature(result: &mut StitchResult, stop: &Stop) {
    result.visit_order.push(stop.feature.id.clone());
    result.segments.push(RouteSegment {
        kind: SegmentKind::Feature(stop.feature.id.clone()),
        geometry: stop.feature.line_string(),
        length: stop.ends.length,
    });
}

fn push_snap_link(result: &mut StitchResult, graph: &Graph, a: Coord<f64>, b: Coord<f64>) {
    if CoordKey::from(a) == CoordKey::from(b) {
        return;
    }
    result.segments.push(RouteSegment {
        kind: SegmentKind::SnapLink,
        geometry: LineString::new(vec![a, b]),
        length: graph.frame().segment_length(a, b),
    });
}
