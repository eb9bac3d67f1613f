//! End-to-end flows: features in, assembled route out.

use crate::assembler::merge;
use crate::config::RoutingConfig;
use crate::environment::EnvironmentIndex;
use crate::error::RoutingError;
use crate::feature::Feature;
use crate::graph::GraphBuilder;
use crate::routes::RouteRecord;
use crate::stitching::{StitchResult, stitch};
use crate::threshold_search::{CancelCheck, SearchReport};

/// Outcome of searching one line layer.
#[derive(Clone, Debug)]
pub struct LayerSearch {
    pub report: SearchReport,
    /// The best path merged into one line, if one was found.
    pub route: Option<RouteRecord>,
}

/// Build a graph from one layer and find its threshold path.
pub fn search_layer<C>(
    features: &[Feature],
    config: &RoutingConfig,
    source: &str,
    cancel: &C,
) -> Result<LayerSearch, RoutingError>
where
    C: CancelCheck + ?Sized,
{
    let graph = GraphBuilder::new(config.frame)
        .score_weighting(config.prefer_score)
        .build(features);
    let report = config.threshold_search().run(&graph, cancel)?;

    let route = match &report.best {
        Some(path) => Some(RouteRecord {
            geometry: merge(&path.segments(&graph))?,
            length_m: path.length,
            source: source.to_string(),
        }),
        None => None,
    };

    Ok(LayerSearch { report, route })
}

/// Score the roads (when an environment index is given), build the
/// connectivity graph from them, stitch the transects and merge the result.
pub fn stitch_layers(
    transects: &[Feature],
    mut roads: Vec<Feature>,
    environment: Option<&EnvironmentIndex>,
    config: &RoutingConfig,
) -> Result<(RouteRecord, StitchResult), RoutingError> {
    if let Some(index) = environment {
        index.apply_scores(&mut roads);
    }

    let connectivity = GraphBuilder::new(config.frame)
        .score_weighting(config.prefer_score)
        .build(&roads);
    let stitched = stitch(transects, &connectivity, config.snap_distance_meters)?;

    let route = RouteRecord {
        geometry: merge(&stitched.geometries())?,
        length_m: stitched.total_length(),
        source: "stitched".to_string(),
    };
    Ok((route, stitched))
}
