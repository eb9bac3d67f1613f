//! Desirability scores from nearby environmental features.
//!
//! A road close to forest, water, caves or abandoned buildings is nicer to
//! survey along. For every enabled kind, the nearest geometry of that kind
//! (by bounding box, from the feature's bbox centre) contributes
//! `1 / (d + 1)` when its true distance `d` is under the preference cutoff.

use crate::feature::Feature;
use crate::geometry::{Frame, MetricPlane, bbox_center};
use geo::{BoundingRect, Coord, Distance, Euclidean, Geometry, LineString, MapCoords};
use log::debug;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    Forest,
    Water,
    Cave,
    Abandoned,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentPreferences {
    pub forest: bool,
    pub water: bool,
    pub cave: bool,
    pub abandoned: bool,
    pub max_distance_meters: f64,
}

impl Default for EnvironmentPreferences {
    fn default() -> Self {
        Self {
            forest: false,
            water: false,
            cave: false,
            abandoned: false,
            max_distance_meters: 100.0,
        }
    }
}

impl EnvironmentPreferences {
    pub fn is_enabled(&self, kind: EnvironmentKind) -> bool {
        match kind {
            EnvironmentKind::Forest => self.forest,
            EnvironmentKind::Water => self.water,
            EnvironmentKind::Cave => self.cave,
            EnvironmentKind::Abandoned => self.abandoned,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.forest || self.water || self.cave || self.abandoned
    }
}

#[derive(Clone, Debug)]
pub struct EnvironmentLayer {
    pub kind: EnvironmentKind,
    pub geometries: Vec<Geometry<f64>>,
}

type BoxTree = RTree<GeomWithData<Rectangle<[f64; 2]>, usize>>;

struct IndexedKind {
    kind: EnvironmentKind,
    geometries: Vec<Geometry<f64>>,
    tree: BoxTree,
}

pub struct EnvironmentIndex {
    plane: MetricPlane,
    max_distance: f64,
    kinds: Vec<IndexedKind>,
}

impl EnvironmentIndex {
    /// Index the layers the preferences enable; the rest are dropped.
    pub fn new(layers: Vec<EnvironmentLayer>, prefs: &EnvironmentPreferences, frame: Frame) -> Self {
        let all_coords: Vec<Coord<f64>> = layers
            .iter()
            .flat_map(|l| l.geometries.iter())
            .filter_map(|g| g.bounding_rect())
            .flat_map(|r| [r.min(), r.max()])
            .collect();
        let origin = bbox_center(&all_coords).unwrap_or(Coord { x: 0.0, y: 0.0 });
        let plane = MetricPlane::for_frame(frame, origin);

        let mut kinds: Vec<IndexedKind> = Vec::new();
        for layer in layers {
            if !prefs.is_enabled(layer.kind) {
                continue;
            }
            let projected = layer.geometries.iter().map(|g| {
                g.map_coords(|c| {
                    let [x, y] = plane.project(c);
                    Coord { x, y }
                })
            });

            match kinds.iter_mut().find(|k| k.kind == layer.kind) {
                Some(existing) => existing.geometries.extend(projected),
                None => kinds.push(IndexedKind {
                    kind: layer.kind,
                    geometries: projected.collect(),
                    tree: RTree::new(),
                }),
            }
        }

        for entry in &mut kinds {
            let boxes: Vec<_> = entry
                .geometries
                .iter()
                .enumerate()
                .filter_map(|(i, g)| {
                    let rect = g.bounding_rect()?;
                    let aabb = Rectangle::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    );
                    Some(GeomWithData::new(aabb, i))
                })
                .collect();
            entry.tree = RTree::bulk_load(boxes);
            debug!("Indexed {} {:?} geometries", entry.geometries.len(), entry.kind);
        }

        Self {
            plane,
            max_distance: prefs.max_distance_meters,
            kinds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.iter().all(|k| k.geometries.is_empty())
    }

    pub fn score(&self, feature: &Feature) -> f64 {
        let Some(center) = bbox_center(&feature.coords) else {
            return 0.0;
        };
        let center = self.plane.project(center);
        let line = Geometry::LineString(LineString::new(
            feature
                .coords
                .iter()
                .map(|&c| {
                    let [x, y] = self.plane.project(c);
                    Coord { x, y }
                })
                .collect(),
        ));

        let mut score = 0.0;
        for entry in &self.kinds {
            let Some(nearest) = entry.tree.nearest_neighbor(&center) else {
                continue;
            };
            let d = Euclidean.distance(&line, &entry.geometries[nearest.data]);
            if d < self.max_distance {
                score += 1.0 / (d + 1.0);
            }
        }
        score
    }

    /// Overwrite every feature's score with its environmental score.
    pub fn apply_scores(&self, features: &mut [Feature]) {
        for feature in features.iter_mut() {
            feature.score = Some(self.score(feature));
        }
    }
}
