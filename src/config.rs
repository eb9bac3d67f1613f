use crate::environment::{EnvironmentKind, EnvironmentPreferences};
use crate::error::{RoutingError, io_err};
use crate::geometry::Frame;
use crate::threshold_search::ThresholdSearch;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Minimum acceptable route weight.
    pub threshold_meters: f64,
    /// Simple-path enumeration depth cutoff.
    pub max_hops: usize,
    /// Reduce edge weight by desirability score.
    pub prefer_score: bool,
    /// Max distance for snapping feature ends onto the road network.
    pub snap_distance_meters: f64,
    pub frame: Frame,
    /// Hard cap on paths enumerated by the threshold search.
    pub max_enumerated_paths: Option<u64>,
    pub time_limit_secs: Option<u64>,
    pub excluded_road_classes: Vec<String>,
    pub environment: EnvironmentPreferences,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            threshold_meters: 500.0,
            max_hops: 10,
            prefer_score: false,
            snap_distance_meters: 500.0,
            frame: Frame::Geographic,
            max_enumerated_paths: Some(2_000_000),
            time_limit_secs: None,
            excluded_road_classes: Vec::new(),
            environment: EnvironmentPreferences::default(),
        }
    }
}

impl RoutingConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, RoutingError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err!(path, e))?;
        let config: RoutingConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RoutingError> {
        if !self.threshold_meters.is_finite() || self.threshold_meters < 0.0 {
            return Err(RoutingError::InvalidConfig(format!(
                "threshold_meters must be a non-negative number, got {}",
                self.threshold_meters
            )));
        }
        if self.max_hops == 0 {
            return Err(RoutingError::InvalidConfig(
                "max_hops must be at least 1".to_string(),
            ));
        }
        if !self.snap_distance_meters.is_finite() || self.snap_distance_meters < 0.0 {
            return Err(RoutingError::InvalidConfig(format!(
                "snap_distance_meters must be a non-negative number, got {}",
                self.snap_distance_meters
            )));
        }
        if !(self.environment.max_distance_meters > 0.0) {
            return Err(RoutingError::InvalidConfig(format!(
                "environment.max_distance_meters must be positive, got {}",
                self.environment.max_distance_meters
            )));
        }
        Ok(())
    }

    /// Turn on scoring for `kind`. Scores only change edge weights under
    /// `prefer_score`, so that is switched on as well.
    pub fn enable_environment(&mut self, kind: EnvironmentKind) {
        match kind {
            EnvironmentKind::Forest => self.environment.forest = true,
            EnvironmentKind::Water => self.environment.water = true,
            EnvironmentKind::Cave => self.environment.cave = true,
            EnvironmentKind::Abandoned => self.environment.abandoned = true,
        }
        if !self.prefer_score {
            info!("{:?} layer given, enabling prefer_score", kind);
            self.prefer_score = true;
        }
    }

    pub fn threshold_search(&self) -> ThresholdSearch {
        ThresholdSearch::new(self.threshold_meters, self.max_hops)
            .max_paths(self.max_enumerated_paths)
            .time_limit(self.time_limit_secs.map(Duration::from_secs))
    }
}
