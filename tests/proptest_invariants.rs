use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use voronoi_treemap::geometry::power::DiagramBuilder;
use voronoi_treemap::layout::flicker::FlickeringTracker;
use voronoi_treemap::layout::overweight::{is_resolved, OverweightStrategy};
use voronoi_treemap::layout::Site;
use voronoi_treemap::{ClipPolygon, Point, PowerDiagram, SolverConfig, TreemapSolver};

fn sites_from(points: &[(f64, f64, f64)]) -> Vec<Site> {
    points
        .iter()
        .enumerate()
        .map(|(index, &(x, y, weight))| Site {
            index,
            position: Point::new(x, y),
            weight,
            target_area: 0.0,
        })
        .collect()
}

proptest! {
    #[test]
    fn resolved_weights_respect_pairwise_distances(
        points in proptest::collection::vec((0.0..100.0f64, 0.0..100.0f64, 0.0..10_000.0f64), 2..12)
    ) {
        let mut sites = sites_from(&points);
        OverweightStrategy::RaiseLightest.resolve(&mut sites, 1.0);
        prop_assert!(is_resolved(&sites));
        // positions are never touched
        for (site, &(x, y, _)) in sites.iter().zip(&points) {
            prop_assert_eq!(site.position, Point::new(x, y));
        }
    }

    #[test]
    fn lowered_weights_respect_pairwise_distances(
        points in proptest::collection::vec((0.0..100.0f64, 0.0..100.0f64, 0.0..10_000.0f64), 2..12),
        epsilon in 0.01..10.0f64
    ) {
        let mut sites = sites_from(&points);
        OverweightStrategy::LowerHeaviest.resolve(&mut sites, epsilon);
        prop_assert!(is_resolved(&sites));
    }

    #[test]
    fn target_areas_sum_to_clip_area(
        weights in proptest::collection::vec(0.001..1000.0f64, 1..8),
        seed in any::<u64>()
    ) {
        let mut config = SolverConfig::default();
        config.set_size([300.0, 200.0]).unwrap();
        config.set_max_iteration_count(0);
        let solver = TreemapSolver::new(config);

        let solution = solver.solve(&weights, &mut StdRng::seed_from_u64(seed)).unwrap();
        let total: f64 = solution.sites.iter().map(|s| s.target_area).sum();
        prop_assert!((total - 60_000.0).abs() < 1e-6);
        prop_assert_eq!(solution.iteration_count, 0);
    }

    #[test]
    fn flicker_ratio_is_zero_until_history_is_full(
        errors in proptest::collection::vec(0.0..1.0f64, 0..9)
    ) {
        let mut tracker = FlickeringTracker::new();
        tracker.set_total_area(100.0).unwrap();
        for e in errors {
            tracker.record(e);
        }
        prop_assert_eq!(tracker.ratio(), 0.0);
    }

    #[test]
    fn flicker_ratio_is_zero_for_large_latest_error(
        errors in proptest::collection::vec(0.0..1.0f64, 10..20),
        latest in 10.001..1000.0f64
    ) {
        let mut tracker = FlickeringTracker::new();
        tracker.set_total_area(100.0).unwrap();
        for e in errors {
            tracker.record(e);
        }
        tracker.record(latest);
        prop_assert_eq!(tracker.ratio(), 0.0);
    }

    #[test]
    fn flicker_ratio_is_bounded(errors in proptest::collection::vec(0.0..1.0f64, 0..30)) {
        let mut tracker = FlickeringTracker::new();
        tracker.set_total_area(100.0).unwrap();
        for e in errors {
            tracker.record(e);
            let ratio = tracker.ratio();
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
    }

    #[test]
    fn unweighted_cells_tile_the_clip(
        points in proptest::collection::vec((0.01..0.99f64, 0.01..0.99f64), 1..10)
    ) {
        let sites = sites_from(&points.iter().map(|&(x, y)| (x, y, 0.0)).collect::<Vec<_>>());
        let clip = ClipPolygon::unit_square();
        let cells = PowerDiagram.build(&sites, &clip);

        let total: f64 = cells.iter().map(|c| c.area()).sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        for cell in &cells {
            for v in &cell.polygon {
                prop_assert!((-1e-9..=1.0 + 1e-9).contains(&v.x));
                prop_assert!((-1e-9..=1.0 + 1e-9).contains(&v.y));
            }
        }
    }
}
