#[cfg(test)]
mod tests {
    use crate::assembler::merge;
    use crate::config::RoutingConfig;
    use crate::environment::{EnvironmentIndex, EnvironmentKind, EnvironmentLayer};
    use crate::error::RoutingError;
    use crate::feature::{Feature, FeatureId};
    use crate::geometry::Frame;
    use crate::graph::GraphBuilder;
    use crate::pipeline::{search_layer, stitch_layers};
    use crate::stitching::{SegmentKind, stitch};
    use crate::threshold_search::find_min_path_at_least;
    use geo::{Geometry, coord, polygon};

    fn line(id: &str, pts: &[(f64, f64)]) -> Feature {
        Feature::new(id, pts.iter().map(|&(x, y)| coord! { x: x, y: y }).collect())
    }

    fn projected() -> RoutingConfig {
        RoutingConfig {
            frame: Frame::Projected,
            ..Default::default()
        }
    }

    #[test]
    fn test_chain_returns_full_length_not_sub_path() {
        let features = vec![
            line("t1", &[(0.0, 0.0), (200.0, 0.0)]),
            line("t2", &[(200.0, 0.0), (400.0, 0.0)]),
            line("t3", &[(400.0, 0.0), (600.0, 0.0)]),
        ];
        let graph = GraphBuilder::new(Frame::Projected).build(&features);
        let path = find_min_path_at_least(&graph, 500.0, 10).unwrap();
        assert_eq!(path.steps.len(), 3);
        assert!((path.length - 600.0).abs() < 1e-9);

        let search = search_layer(&features, &projected(), "chain", &|| false).unwrap();
        let route = search.route.unwrap();
        assert!((route.length_m - 600.0).abs() < 1e-9);
        assert_eq!(route.geometry.0.len(), 4);
        assert_eq!(route.source, "chain");
    }

    #[test]
    fn test_chain_on_the_ellipsoid() {
        // Three ~200 m hops east along 50N; 1 deg of longitude there is ~71.7 km.
        let step = 200.0 / 71_695.0;
        let xs: Vec<f64> = (0..4).map(|k| 19.0 + step * k as f64).collect();
        let features: Vec<Feature> = xs
            .windows(2)
            .enumerate()
            .map(|(i, w)| line(&format!("t{}", i), &[(w[0], 50.0), (w[1], 50.0)]))
            .collect();
        let graph = GraphBuilder::new(Frame::Geographic).build(&features);
        let path = find_min_path_at_least(&graph, 500.0, 10).unwrap();
        assert_eq!(path.steps.len(), 3);
        assert!((path.length - 600.0).abs() < 5.0, "got {}", path.length);
    }

    #[test]
    fn test_no_path_long_enough_is_not_an_error() {
        let features = vec![
            line("t1", &[(0.0, 0.0), (100.0, 0.0)]),
            line("t2", &[(100.0, 0.0), (200.0, 0.0)]),
            line("t3", &[(200.0, 0.0), (300.0, 0.0)]),
        ];
        let search = search_layer(&features, &projected(), "short", &|| false).unwrap();
        assert!(search.route.is_none());
        assert!(search.report.best.is_none());
        assert_eq!(search.report.pairs_examined, 6);
    }

    #[test]
    fn test_far_apart_features_fail_to_snap() {
        // ~2000 m apart along 50N, with the only road a kilometre north.
        let dx = 2000.0 / 71_695.0;
        let transects = vec![
            line("west", &[(19.0 - 0.001, 50.0), (19.0, 50.0)]),
            line("east", &[(19.0 + dx, 50.0), (19.0 + dx + 0.001, 50.0)]),
        ];
        let roads = GraphBuilder::new(Frame::Geographic).build(&vec![line(
            "road",
            &[(19.0, 50.009), (19.0 + dx, 50.009)],
        )]);

        match stitch(&transects, &roads, 50.0) {
            Err(RoutingError::SnapFailure {
                from_feature,
                to_feature,
                max_distance,
                ..
            }) => {
                assert_eq!(from_feature, FeatureId::from("west"));
                assert_eq!(to_feature, FeatureId::from("east"));
                assert_eq!(max_distance, 50.0);
            }
            other => panic!("expected SnapFailure, got {:?}", other),
        }
    }

    fn scenario_d() -> (Vec<Feature>, Vec<Feature>) {
        let transects = vec![
            line("a", &[(0.0, 0.0), (100.0, 0.0)]),
            line("b", &[(1000.0, 0.0), (1100.0, 0.0)]),
            line("c", &[(300.0, 0.0), (400.0, 0.0)]),
        ];
        let roads = vec![
            line("r1", &[(100.0, 0.0), (100.0, 20.0), (300.0, 20.0), (300.0, 0.0)]),
            line("r2", &[(400.0, 0.0), (400.0, -20.0)]),
            line("r3", &[(400.0, -20.0), (1000.0, -20.0)]),
            line("r4", &[(1000.0, -20.0), (1000.0, 0.0)]),
        ];
        (transects, roads)
    }

    #[test]
    fn test_greedy_order_differs_from_input_order() {
        let (transects, roads) = scenario_d();
        let graph = GraphBuilder::new(Frame::Projected).build(&roads);
        let result = stitch(&transects, &graph, 10.0).unwrap();

        // From a's end (100, 0): c starts 200 m away, b starts 900 m away.
        let order: Vec<&str> = result.visit_order.iter().map(|id| id.0.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);

        let kinds: Vec<String> = result
            .segments
            .iter()
            .map(|s| match &s.kind {
                SegmentKind::Feature(id) => id.0.clone(),
                SegmentKind::SnapLink => "link".to_string(),
                SegmentKind::Connector { from, to } => format!("{}>{}", from, to),
            })
            .collect();
        assert_eq!(kinds, vec!["a", "a>c", "c", "c>b", "c>b", "c>b", "b"]);

        // 100 + 240 + 100 + (20 + 600 + 20) + 100
        assert!((result.total_length() - 1180.0).abs() < 1e-9);
    }

    #[test]
    fn test_stitching_is_deterministic() {
        let (transects, roads) = scenario_d();
        let graph = GraphBuilder::new(Frame::Projected).build(&roads);
        let first = stitch(&transects, &graph, 10.0).unwrap();
        for _ in 0..5 {
            assert_eq!(stitch(&transects, &graph, 10.0).unwrap(), first);
        }
    }

    #[test]
    fn test_merge_preserves_total_length() {
        let (transects, roads) = scenario_d();
        let graph = GraphBuilder::new(Frame::Projected).build(&roads);
        let result = stitch(&transects, &graph, 10.0).unwrap();

        let merged = merge(&result.geometries()).unwrap();
        let merged_len = Frame::Projected.polyline_length(&merged.0);
        assert!((merged_len - result.total_length()).abs() < 1e-6);
    }

    #[test]
    fn test_stitch_layers_scores_and_merges() {
        let (transects, roads) = scenario_d();
        let config = RoutingConfig {
            snap_distance_meters: 10.0,
            prefer_score: true,
            ..projected()
        };
        let (route, stitched) = stitch_layers(&transects, roads, None, &config).unwrap();
        assert_eq!(stitched.visit_order.len(), 3);
        assert!((route.length_m - 1180.0).abs() < 1e-9);
        assert_eq!(route.geometry.0.first(), Some(&coord! { x: 0.0, y: 0.0 }));
        assert_eq!(route.geometry.0.last(), Some(&coord! { x: 1100.0, y: 0.0 }));
    }

    #[test]
    fn test_forest_pulls_connector_onto_longer_road() {
        let transects = vec![
            line("a", &[(0.0, 0.0), (100.0, 0.0)]),
            line("b", &[(300.0, 0.0), (400.0, 0.0)]),
        ];
        // A 200 m direct road and a 300 m loop north that runs along a forest edge.
        let roads = vec![
            line("direct", &[(100.0, 0.0), (300.0, 0.0)]),
            line("north", &[(100.0, 0.0), (100.0, 50.0), (300.0, 50.0), (300.0, 0.0)]),
        ];
        let config = RoutingConfig {
            snap_distance_meters: 10.0,
            prefer_score: true,
            ..projected()
        };

        let (plain, _) = stitch_layers(&transects, roads.clone(), None, &config).unwrap();
        assert!((plain.length_m - 400.0).abs() < 1e-9);

        let forest = EnvironmentLayer {
            kind: EnvironmentKind::Forest,
            geometries: vec![Geometry::Polygon(polygon![
                (x: 100.0, y: 50.5), (x: 300.0, y: 50.5), (x: 300.0, y: 150.0), (x: 100.0, y: 150.0)
            ])],
        };
        let mut prefs = config.environment.clone();
        prefs.forest = true;
        let index = EnvironmentIndex::new(vec![forest], &prefs, Frame::Projected);

        // north: 300 / (1 + 1/1.5) = 180; direct: 200 / (1 + 1/51.5) ~ 196.2
        let (scored, stitched) = stitch_layers(&transects, roads, Some(&index), &config).unwrap();
        assert!((scored.length_m - 500.0).abs() < 1e-9);
        assert!(scored.geometry.0.contains(&coord! { x: 100.0, y: 50.0 }));
        let connectors = stitched
            .segments
            .iter()
            .filter(|s| matches!(s.kind, SegmentKind::Connector { .. }))
            .count();
        assert_eq!(connectors, 1);
    }
}
