use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an input line feature, used when reporting stitch failures.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub String);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId(s.to_owned())
    }
}

impl From<String> for FeatureId {
    fn from(s: String) -> Self {
        FeatureId(s)
    }
}

impl From<usize> for FeatureId {
    fn from(n: usize) -> Self {
        FeatureId(n.to_string())
    }
}

/// Normalized road classification.
///
/// Upstream tags arrive as a scalar or an arbitrarily nested list; they are
/// flattened once at ingestion so nothing downstream has to care.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadClass {
    pub road_class: String,
    pub raw_values: Vec<String>,
}

impl RoadClass {
    pub fn from_tag(value: &serde_json::Value) -> Self {
        let mut raw_values = Vec::new();
        flatten_tag(value, &mut raw_values);

        Self {
            road_class: raw_values.first().cloned().unwrap_or_default(),
            raw_values,
        }
    }

    pub fn is_excluded(&self, excluded: &[String]) -> bool {
        self.raw_values.iter().any(|v| excluded.contains(v))
    }
}

fn flatten_tag(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Null => {}
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                flatten_tag(item, out);
            }
        }
        other => out.push(other.to_string()),
    }
}

/// A line feature from an input layer. Read-only once ingested.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub coords: Vec<Coord<f64>>,
    /// Desirability bonus; higher is more pleasant to walk.
    pub score: Option<f64>,
    pub road_class: Option<RoadClass>,
}

impl Feature {
    pub fn new(id: impl Into<FeatureId>, coords: Vec<Coord<f64>>) -> Self {
        Self {
            id: id.into(),
            coords,
            score: None,
            road_class: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn line_string(&self) -> LineString<f64> {
        LineString::new(self.coords.clone())
    }
}
