//! GeoJSON in: line layers become [`Feature`]s, anything else becomes plain
//! geometry for environment scoring.

use crate::error::{RoutingError, io_err};
use crate::feature::{Feature, FeatureId, RoadClass};
use geo::Coord;
use geojson::{FeatureCollection, GeoJson, Value};
use log::{debug, info};
use std::path::Path;

pub const SCORE_PROPERTY: &str = "score";
pub const ROAD_CLASS_PROPERTY: &str = "highway";

fn read_collection(path: &Path) -> Result<FeatureCollection, RoutingError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err!(path, e))?;
    parse_collection(&contents)
}

fn parse_collection(contents: &str) -> Result<FeatureCollection, RoutingError> {
    let geojson: GeoJson = contents.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

fn to_coords(positions: &[Vec<f64>]) -> Vec<Coord<f64>> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect()
}

/// Line features of a GeoJSON file, minus those whose road class is in
/// `excluded_road_classes`.
pub fn read_features(path: &Path, excluded_road_classes: &[String]) -> Result<Vec<Feature>, RoutingError> {
    let features = features_from_collection(read_collection(path)?, excluded_road_classes);
    info!("Read {} line features from {}", features.len(), path.display());
    Ok(features)
}

pub fn features_from_str(contents: &str, excluded_road_classes: &[String]) -> Result<Vec<Feature>, RoutingError> {
    Ok(features_from_collection(
        parse_collection(contents)?,
        excluded_road_classes,
    ))
}

fn features_from_collection(collection: FeatureCollection, excluded_road_classes: &[String]) -> Vec<Feature> {
    let mut features = Vec::with_capacity(collection.features.len());

    for (i, gj) in collection.features.into_iter().enumerate() {
        let id = match &gj.id {
            Some(geojson::feature::Id::String(s)) => FeatureId(s.clone()),
            Some(geojson::feature::Id::Number(n)) => FeatureId(n.to_string()),
            None => FeatureId::from(i),
        };

        let coords = match gj.geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(line)) => to_coords(line),
            // Only the first part of a multi-line is used.
            Some(Value::MultiLineString(parts)) => parts.first().map(|p| to_coords(p)).unwrap_or_default(),
            _ => {
                debug!("Skipping feature {}: not a line", id);
                continue;
            }
        };

        let road_class = gj.property(ROAD_CLASS_PROPERTY).map(RoadClass::from_tag);
        if let Some(class) = &road_class {
            if class.is_excluded(excluded_road_classes) {
                debug!("Excluding feature {} ({:?})", id, class.raw_values);
                continue;
            }
        }

        features.push(Feature {
            id,
            coords,
            score: gj.property(SCORE_PROPERTY).and_then(|v| v.as_f64()),
            road_class,
        });
    }
    features
}

/// Every geometry in a GeoJSON file, whatever its type.
pub fn read_geometries(path: &Path) -> Result<Vec<geo::Geometry<f64>>, RoutingError> {
    let collection = read_collection(path)?;
    let mut geometries = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        if let Some(geometry) = feature.geometry {
            geometries.push(geo::Geometry::<f64>::try_from(geometry)?);
        }
    }
    Ok(geometries)
}
