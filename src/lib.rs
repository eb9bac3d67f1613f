//! Threshold route search and transect stitching over line-segment networks.
//!
//! Line features (survey transects, road data) become an undirected weighted
//! graph. From there either the cheapest path that is still at least a
//! given length is searched for, or a set of disjoint transects is joined
//! into one walk through a road network.

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::arc_with_non_send_sync,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_unit_value,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::bytes_nth,
    clippy::deprecated_clippy_cfg_attr,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

pub mod assembler;
pub mod config;
pub mod environment;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod graph;
pub mod ingest;
pub mod pipeline;
pub mod routes;
pub mod snapping;
pub mod stitching;
pub mod threshold_search;

#[cfg(test)]
mod test_scenarios;

pub use config::RoutingConfig;
pub use error::RoutingError;
pub use feature::{Feature, FeatureId, RoadClass};
pub use geometry::Frame;
pub use graph::{Graph, GraphBuilder, PathResult};
pub use stitching::{StitchResult, stitch};
pub use threshold_search::{CancelCheck, SearchReport, ThresholdSearch, find_min_path_at_least};
