//! Explicit accumulator for found routes.
//!
//! Each search or stitch returns its own route; callers decide whether to
//! pool them here across invocations.

use crate::error::{RoutingError, io_err};
use geo_types::LineString;
use geojson::{Feature as GeoJsonFeature, FeatureCollection, JsonObject, JsonValue};
use std::path::Path;

#[derive(Clone, Debug, PartialEq)]
pub struct RouteRecord {
    pub geometry: LineString<f64>,
    pub length_m: f64,
    /// Where the route came from: an input layer name, a segment kind, ...
    pub source: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteCollection {
    routes: Vec<RouteRecord>,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, route: RouteRecord) {
        self.routes.push(route);
    }

    pub fn extend(&mut self, other: RouteCollection) {
        self.routes.extend(other.routes);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteRecord> {
        self.routes.iter()
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .routes
            .iter()
            .map(|route| {
                let mut properties = JsonObject::new();
                properties.insert("length_m".to_string(), JsonValue::from(route.length_m));
                properties.insert("source".to_string(), JsonValue::from(route.source.clone()));
                GeoJsonFeature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(&route.geometry))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    pub fn write_geojson(&self, path: &Path) -> Result<(), RoutingError> {
        let json = serde_json::to_string_pretty(&self.to_feature_collection())?;
        std::fs::write(path, json).map_err(|e| io_err!(path, e))
    }
}
