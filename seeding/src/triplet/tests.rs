use common::float_ext::FloatExt;
use glam::DVec3;

use super::*;
use crate::config::{GridConfig, RadiusQualityCuts};
use crate::doublet::{DoubletFinder, DoubletKind, LinCircle, count_doublets, find_doublets};
use crate::executor::{RayonExecutor, SequentialExecutor};
use crate::grid::SpacepointGrid;
use crate::spacepoint::{MeasurementId, MeasurementLink, Spacepoint};
use crate::synthetic::{EventGenerator, GeneratorConfig};

fn point(r: f64, phi: f64, z: f64) -> Spacepoint {
    Spacepoint::new(
        DVec3::new(r * phi.cos(), r * phi.sin(), z),
        MeasurementLink::Single(MeasurementId(0)),
    )
}

fn finder_config() -> SeedFinderConfig {
    SeedFinderConfig {
        collision_region_min: -50.0,
        collision_region_max: 50.0,
        ..Default::default()
    }
}

fn circles(bottom: &Spacepoint, middle: &Spacepoint, top: &Spacepoint) -> (LinCircle, LinCircle) {
    (
        LinCircle::new(DoubletKind::Bottom, middle, bottom),
        LinCircle::new(DoubletKind::Top, middle, top),
    )
}

/// Point at transverse radius `r` on a circle of radius `radius` through the
/// origin, starting in direction `phi0`.
fn on_circle(radius: f64, phi0: f64, r: f64, z: f64) -> Spacepoint {
    let phi = phi0 - (r / (2.0 * radius)).asin();
    point(r, phi, z)
}

struct Pipeline {
    spacepoints: SpacepointCollection,
    doublets: DoubletCollection,
}

impl Pipeline {
    fn new<E: Executor>(executor: &E, spacepoints: SpacepointCollection, config: &SeedFinderConfig) -> Self {
        let grid = SpacepointGrid::build(executor, &spacepoints, &GridConfig::from_finder(config)).unwrap();
        let finder = DoubletFinder::new(&spacepoints, &grid, config);
        let doublets = find_doublets(executor, &finder, count_doublets(executor, &finder)).unwrap();
        Self {
            spacepoints,
            doublets,
        }
    }

    fn triplets<E: Executor>(&self, executor: &E, config: &SeedFinderConfig) -> TripletCollection {
        let finder = TripletFinder::new(&self.spacepoints, &self.doublets, config);
        let counters = count_triplets(executor, &finder);
        let mut triplets = find_triplets(executor, &finder, counters).unwrap();
        weight_triplets(
            executor,
            &self.spacepoints,
            &mut triplets,
            config,
            &SeedFilterConfig::default(),
        );
        triplets
    }
}

#[test]
fn test_straight_line_is_accepted() {
    let config = finder_config();
    let (b, m, t) = (point(30.0, 0.3, 25.0), point(80.0, 0.3, 50.0), point(150.0, 0.3, 85.0));
    let (bottom, top) = circles(&b, &m, &t);

    let fit = fit_triplet(&m, &bottom, &top, &config).unwrap();
    assert!(fit.curvature.relative_eq(0.0, 1e-9));
    assert!(fit.impact.approximately_eq(0.0));
    assert!(fit.pt(&config) > config.max_pt_scattering);
}

#[test]
fn test_slope_mismatch_is_rejected() {
    let config = finder_config();
    let (b, m, t) = (point(30.0, 0.3, 25.0), point(80.0, 0.3, 50.0), point(150.0, 0.3, 106.0));
    let (bottom, top) = circles(&b, &m, &t);
    assert!(fit_triplet(&m, &bottom, &top, &config).is_none());
}

#[test]
fn test_helix_curvature_is_recovered() {
    let config = finder_config();
    let radius = 2000.0;
    let b = on_circle(radius, 0.5, 40.0, 0.0);
    let m = on_circle(radius, 0.5, 100.0, 0.0);
    let t = on_circle(radius, 0.5, 180.0, 0.0);
    let (bottom, top) = circles(&b, &m, &t);

    let fit = fit_triplet(&m, &bottom, &top, &config).unwrap();
    assert!(fit.curvature.abs().relative_eq(1.0 / radius, 1e-9));
    // the circle passes through the origin
    assert!(fit.impact.approximately_eq(0.0));
}

#[test]
fn test_low_pt_helix_exceeds_curvature_bound() {
    let config = finder_config();
    // well below the 834 mm min-pT radius
    let radius = 300.0;
    let b = on_circle(radius, 0.5, 40.0, 0.0);
    let m = on_circle(radius, 0.5, 100.0, 0.0);
    let t = on_circle(radius, 0.5, 180.0, 0.0);
    let (bottom, top) = circles(&b, &m, &t);
    assert!(fit_triplet(&m, &bottom, &top, &config).is_none());
}

#[test]
fn test_displaced_track_exceeds_impact_bound() {
    let config = finder_config();
    // straight line at distance 20 mm from the beam axis
    let at = |x: f64| point((x * x + 400.0).sqrt(), 20.0_f64.atan2(x), 0.0);
    let (b, m, t) = (at(40.0), at(100.0), at(180.0));
    let (bottom, top) = circles(&b, &m, &t);
    assert!(fit_triplet(&m, &bottom, &top, &config).is_none());

    let relaxed = SeedFinderConfig {
        impact_max: 25.0,
        ..config
    };
    let fit = fit_triplet(&m, &bottom, &top, &relaxed).unwrap();
    assert!(fit.impact.relative_eq(20.0, 0.025), "impact = {}", fit.impact);
}

#[test]
fn test_identical_partners_have_no_conformal_slope() {
    let config = finder_config();
    let m = point(80.0, 0.3, 50.0);
    let circle = LinCircle::new(DoubletKind::Top, &m, &point(150.0, 0.3, 85.0));
    assert!(fit_triplet(&m, &circle, &circle, &config).is_none());
}

#[test]
fn test_fit_spacepoints_matches_fit_triplet() {
    let config = finder_config();
    let spacepoints = SpacepointCollection::from_vec(vec![
        point(30.0, 0.3, 25.0),
        point(80.0, 0.3, 50.0),
        point(150.0, 0.3, 85.0),
    ]);
    let (bottom, top) = circles(&spacepoints[0], &spacepoints[1], &spacepoints[2]);
    assert_eq!(
        fit_spacepoints(&spacepoints, 0, 1, 2, &config),
        fit_triplet(&spacepoints[1], &bottom, &top, &config)
    );
}

#[test]
fn test_single_track_yields_one_triplet() {
    let config = finder_config();
    let spacepoints = SpacepointCollection::from_vec(vec![
        point(30.0, 0.3, 25.0),
        point(80.0, 0.3, 50.0),
        point(150.0, 0.3, 85.0),
    ]);
    let pipeline = Pipeline::new(&SequentialExecutor, spacepoints, &config);
    let triplets = pipeline.triplets(&SequentialExecutor, &config);

    assert_eq!(triplets.len(), 1);
    let triplet = triplets.triplets().items()[0];
    assert_eq!((triplet.bottom, triplet.middle, triplet.top), (0, 1, 2));
    assert!(triplet.weight.approximately_eq(config.impact_max));

    let counter = triplets.counters()[triplet.bottom_doublet];
    assert_eq!(counter.triplets, 1);
    assert_eq!(triplets.for_middle(counter.middle_lane), &[triplet]);
}

#[test]
fn test_triplets_grouped_by_middle_lane() {
    let event = EventGenerator::new(GeneratorConfig::default()).generate(3);
    let config = SeedFinderConfig::default();
    let pipeline = Pipeline::new(&SequentialExecutor, event.spacepoints, &config);
    let triplets = pipeline.triplets(&SequentialExecutor, &config);
    assert!(!triplets.is_empty());

    let mut seen = 0;
    for lane in 0..triplets.middle_lanes() {
        let middle = pipeline.doublets.counters()[lane].middle;
        for triplet in triplets.for_middle(lane) {
            assert_eq!(triplet.middle, middle);
            let sp = &pipeline.spacepoints;
            assert!(sp[triplet.bottom].r() < sp[triplet.middle].r());
            assert!(sp[triplet.middle].r() < sp[triplet.top].r());
            assert!(triplet.curvature.abs() <= config.max_curvature());
            assert!(triplet.impact <= config.impact_max);
            seen += 1;
        }
    }
    assert_eq!(seen, triplets.len());
}

#[test]
fn test_triplets_identical_across_executors() {
    let event = EventGenerator::new(GeneratorConfig::default()).generate(5);
    let config = SeedFinderConfig::default();

    let sequential = Pipeline::new(&SequentialExecutor, event.spacepoints.clone(), &config)
        .triplets(&SequentialExecutor, &config);
    let rayon = RayonExecutor::with_threads(4).unwrap();
    let parallel = Pipeline::new(&rayon, event.spacepoints, &config).triplets(&rayon, &config);

    assert_eq!(sequential.counters(), parallel.counters());
    assert_eq!(sequential.triplets(), parallel.triplets());
}

#[test]
fn test_weight_is_monotone() {
    let filter = SeedFilterConfig::default();
    let base = TripletFeatures {
        impact_headroom: 4.0,
        supporting: 0,
        bottom_r: 50.0,
        top_r: 200.0,
    };
    let w = seed_weight(&base, &filter);
    assert!(w.relative_eq(4.0, 1e-12));

    let closer = TripletFeatures {
        impact_headroom: 6.0,
        ..base
    };
    assert!(seed_weight(&closer, &filter) >= w);

    let supported = TripletFeatures {
        supporting: 2,
        ..base
    };
    assert!(seed_weight(&supported, &filter).relative_eq(404.0, 1e-12));
}

#[test]
fn test_radius_quality_bonuses() {
    let filter = SeedFilterConfig {
        radius_quality: Some(RadiusQualityCuts::default()),
        ..Default::default()
    };
    let features = TripletFeatures {
        impact_headroom: 0.0,
        supporting: 0,
        bottom_r: 160.0,
        top_r: 140.0,
    };
    assert!(seed_weight(&features, &filter).relative_eq(600.0, 1e-12));

    assert!(passes_single_seed_cut(100.0, 0.0, &filter));
    assert!(!passes_single_seed_cut(160.0, 379.0, &filter));
    assert!(passes_single_seed_cut(160.0, 380.0, &filter));
    assert!(passes_single_seed_cut(160.0, 0.0, &SeedFilterConfig::default()));
}

#[test]
fn test_supporting_triplets() {
    let filter = SeedFilterConfig::default();
    // candidate 0; 1 is too close in radius, 2 and 3 support, 4 bends the
    // other way, 5 would support but the limit of two is reached
    let tops = [100.0, 103.0, 200.0, 300.0, 400.0, 500.0];
    let curvatures = [1e-4, 1e-4, 1.2e-4, 0.9e-4, -1e-3, 1e-4];
    assert_eq!(count_supporting(0, &tops, &curvatures, &filter), 2);

    let unlimited = SeedFilterConfig {
        compat_seed_limit: 10,
        ..filter
    };
    assert_eq!(count_supporting(0, &tops, &curvatures, &unlimited), 3);
}

#[test]
fn test_supporters_need_distinct_radii() {
    let filter = SeedFilterConfig {
        compat_seed_limit: 10,
        ..Default::default()
    };
    // 1 and 2 share a layer, only the first counts
    let tops = [100.0, 200.0, 202.0];
    let curvatures = [0.0, 0.0, 0.0];
    assert_eq!(count_supporting(0, &tops, &curvatures, &filter), 1);
}
