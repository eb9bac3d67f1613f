//! Geometry adapter: endpoint extraction and length measurement.
//!
//! Every call into the geometry library goes through here so the graph and
//! search code only ever see coordinates and metres.

use crate::error::RoutingError;
use crate::feature::Feature;
use geo::{Coord, Distance, Geodesic, Haversine, Point};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Reference frame of the input coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    /// x = longitude, y = latitude, in degrees (WGS84).
    #[default]
    Geographic,
    /// Metric planar coordinates, e.g. a UTM zone or EPSG:3857.
    Projected,
}

impl Frame {
    /// Length of a single segment: ellipsoidal for geographic input,
    /// Euclidean for projected input.
    pub fn segment_length(self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        match self {
            Frame::Geographic => Geodesic.distance(Point::from(a), Point::from(b)),
            Frame::Projected => planar_distance(a, b),
        }
    }

    /// Point-to-point distance used for snapping and nearest-next selection.
    pub fn point_distance(self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        match self {
            Frame::Geographic => Haversine.distance(Point::from(a), Point::from(b)),
            Frame::Projected => planar_distance(a, b),
        }
    }

    pub fn polyline_length(self, coords: &[Coord<f64>]) -> f64 {
        coords
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| self.segment_length(a, b))
            .sum()
    }
}

fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Exact, bit-level identity of a coordinate. Two polylines only share a
/// node when they supply bit-identical endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey(u64, u64);

impl From<Coord<f64>> for CoordKey {
    fn from(c: Coord<f64>) -> Self {
        CoordKey(c.x.to_bits(), c.y.to_bits())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Endpoints {
    pub start: Coord<f64>,
    pub end: Coord<f64>,
    pub length: f64,
}

pub fn to_endpoints(feature: &Feature, frame: Frame) -> Result<Endpoints, RoutingError> {
    let coords = &feature.coords;
    if coords.len() < 2 || coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(RoutingError::DegenerateGeometry {
            feature: feature.id.clone(),
        });
    }

    Ok(Endpoints {
        start: coords[0],
        end: coords[coords.len() - 1],
        length: frame.polyline_length(coords),
    })
}

/// Centre of the axis-aligned bounding box of a coordinate sequence.
pub fn bbox_center(coords: &[Coord<f64>]) -> Option<Coord<f64>> {
    let first = coords.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for c in coords {
        min_x = min_x.min(c.x);
        min_y = min_y.min(c.y);
        max_x = max_x.max(c.x);
        max_y = max_y.max(c.y);
    }
    Some(Coord {
        x: (min_x + max_x) / 2.0,
        y: (min_y + max_y) / 2.0,
    })
}

/// Mean earth radius used for the tangent-plane approximation.
const EARTH_RADIUS_M: f64 = 6_371_007.2;

/// Maps coordinates of either frame into a plane measured in metres.
/// Geographic input goes through an equirectangular approximation around
/// an origin, which holds at the scale of one survey area.
#[derive(Debug, Clone, Copy)]
pub enum MetricPlane {
    Identity,
    Tangent {
        origin: Coord<f64>,
        metres_per_deg_x: f64,
        metres_per_deg_y: f64,
    },
}

impl MetricPlane {
    /// Picks a plane suited to `frame`, centred on `origin` when a
    /// projection is needed.
    pub fn for_frame(frame: Frame, origin: Coord<f64>) -> Self {
        match frame {
            Frame::Projected => MetricPlane::Identity,
            Frame::Geographic => {
                let metres_per_deg_y = EARTH_RADIUS_M.to_radians();
                MetricPlane::Tangent {
                    origin,
                    metres_per_deg_x: metres_per_deg_y * origin.y.to_radians().cos(),
                    metres_per_deg_y,
                }
            }
        }
    }

    pub fn project(&self, c: Coord<f64>) -> [f64; 2] {
        match *self {
            MetricPlane::Identity => [c.x, c.y],
            MetricPlane::Tangent {
                origin,
                metres_per_deg_x,
                metres_per_deg_y,
            } => [
                (c.x - origin.x) * metres_per_deg_x,
                (c.y - origin.y) * metres_per_deg_y,
            ],
        }
    }
}
