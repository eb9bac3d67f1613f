use crate::error::RoutingError;
use crate::geometry::CoordKey;
use geo_types::{Coord, LineString};

/// Concatenate ordered segments into one continuous line.
///
/// Each segment must start exactly where the previous one ended; the shared
/// vertex is kept once. A gap means something upstream is broken, so it is
/// reported rather than bridged.
pub fn merge(segments: &[LineString<f64>]) -> Result<LineString<f64>, RoutingError> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(segments.iter().map(|s| s.0.len()).sum());

    for (index, segment) in segments.iter().enumerate() {
        let Some(&first) = segment.0.first() else {
            continue;
        };

        match coords.last() {
            None => coords.extend_from_slice(&segment.0),
            Some(&last) if CoordKey::from(last) == CoordKey::from(first) => {
                coords.extend_from_slice(&segment.0[1..]);
            }
            Some(&last) => {
                return Err(RoutingError::DisjointSegments {
                    index,
                    gap: (first.x - last.x).hypot(first.y - last.y),
                });
            }
        }
    }

    if coords.len() < 2 {
        return Err(RoutingError::EmptyRoute);
    }
    Ok(LineString::new(coords))
}
