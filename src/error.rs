//! Error taxonomy for graph construction, search, stitching and merging.

use crate::feature::FeatureId;
use geo::Coord;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("feature {feature} has fewer than 2 usable coordinates")]
    DegenerateGeometry { feature: FeatureId },

    #[error(
        "cannot join feature {from_feature} to feature {to_feature}: no connectivity node within {max_distance} m of ({}, {})",
        .point.x,
        .point.y
    )]
    SnapFailure {
        from_feature: FeatureId,
        to_feature: FeatureId,
        point: Coord<f64>,
        max_distance: f64,
    },

    #[error("cannot join feature {from_feature} to feature {to_feature}: snapped nodes are not connected")]
    NoConnectingPath {
        from_feature: FeatureId,
        to_feature: FeatureId,
    },

    #[error("segment {index} does not start where the previous one ends (gap of {gap} units)")]
    DisjointSegments { index: usize, gap: f64 },

    #[error("no segments to merge")]
    EmptyRoute,

    #[error("search cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),
}

impl From<geojson::Error> for RoutingError {
    fn from(e: geojson::Error) -> Self {
        RoutingError::GeoJson(Box::new(e))
    }
}

macro_rules! io_err {
    ($path:expr, $err:expr) => {
        $crate::error::RoutingError::Io {
            path: $path.to_path_buf(),
            source: $err,
        }
    };
}

pub(crate) use io_err;
