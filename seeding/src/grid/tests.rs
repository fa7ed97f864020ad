//! Tests for the spacepoint grid.

use std::f64::consts::PI;

use glam::DVec3;
use rand::prelude::*;

use super::*;
use crate::error::SeedingError;
use crate::executor::{RayonExecutor, SequentialExecutor};
use crate::spacepoint::{MeasurementId, MeasurementLink, Spacepoint};

fn point(r: f64, phi: f64, z: f64, id: u64) -> Spacepoint {
    Spacepoint::new(
        DVec3::new(r * phi.cos(), r * phi.sin(), z),
        MeasurementLink::Single(MeasurementId(id)),
    )
}

fn random_event(n: usize, seed: u64) -> SpacepointCollection {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            point(
                rng.random_range(20.0..600.0),
                rng.random_range(-PI..PI),
                rng.random_range(-1200.0..1200.0),
                i as u64,
            )
        })
        .collect()
}

fn config(phi_bins: usize, z_bins: usize) -> GridConfig {
    GridConfig {
        phi_bins,
        z_bins,
        z_min: -1000.0,
        z_max: 1000.0,
    }
}

#[test]
fn test_every_spacepoint_in_exactly_one_bin() {
    let event = random_event(2000, 1);
    let grid = SpacepointGrid::build(&SequentialExecutor, &event, &config(32, 5)).unwrap();

    assert_eq!(grid.len(), event.len());
    let mut seen = vec![0usize; event.len()];
    for global in 0..grid.num_bins() {
        for &index in grid.bin_contents(global) {
            seen[index] += 1;
        }
    }
    assert!(seen.iter().all(|&count| count == 1));

    for (index, sp) in event.iter().enumerate() {
        let bin = grid.bin_of(sp.phi(), sp.z());
        assert!(grid.bin(bin).contains(&index));
    }
}

#[test]
fn test_zero_radius_neighborhood_is_own_bin() {
    let event = random_event(500, 2);
    let grid = SpacepointGrid::build(&SequentialExecutor, &event, &config(16, 4)).unwrap();

    for phi in 0..grid.phi_bins() {
        for z in 0..grid.z_bins() {
            let bin = BinIndex { phi, z };
            let found: Vec<usize> = grid.neighborhood(bin, 0, 0).collect();
            assert_eq!(found.as_slice(), grid.bin(bin));
        }
    }
}

#[test]
fn test_bins_sorted_by_radius() {
    let event = random_event(1000, 3);
    let grid = SpacepointGrid::build(&SequentialExecutor, &event, &config(8, 3)).unwrap();

    for global in 0..grid.num_bins() {
        let bin = grid.bin_contents(global);
        for pair in bin.windows(2) {
            let (a, b) = (&event[pair[0]], &event[pair[1]]);
            assert!(a.r() < b.r() || (a.r() == b.r() && pair[0] < pair[1]));
        }
    }
}

#[test]
fn test_equal_radius_ties_by_index() {
    let event: SpacepointCollection = (0..4).map(|i| point(50.0, 0.1, 0.0, i)).collect();
    let grid = SpacepointGrid::build(&SequentialExecutor, &event, &config(4, 1)).unwrap();
    assert_eq!(grid.ordered_spacepoints(), &[0, 1, 2, 3]);
}

#[test]
fn test_grid_identical_across_executors() {
    let event = random_event(5000, 4);
    let cfg = config(64, 6);
    let sequential = SpacepointGrid::build(&SequentialExecutor, &event, &cfg).unwrap();
    let parallel = SpacepointGrid::build(&RayonExecutor::with_threads(4).unwrap(), &event, &cfg)
        .unwrap();
    assert_eq!(sequential.bins, parallel.bins);
}

#[test]
fn test_phi_wraps_around() {
    let event = SpacepointCollection::from_vec(vec![
        point(100.0, PI - 0.01, 0.0, 0),
        point(100.0, -PI + 0.01, 0.0, 1),
    ]);
    let grid = SpacepointGrid::build(&SequentialExecutor, &event, &config(10, 1)).unwrap();

    let last = grid.bin_of(event[0].phi(), 0.0);
    let first = grid.bin_of(event[1].phi(), 0.0);
    assert_eq!(last.phi, 9);
    assert_eq!(first.phi, 0);

    let around_last: Vec<usize> = grid.neighborhood(last, 1, 0).collect();
    assert!(around_last.contains(&1));
    let around_first: Vec<usize> = grid.neighborhood(first, 1, 0).collect();
    assert!(around_first.contains(&0));
}

#[test]
fn test_phi_of_pi_maps_to_first_bin() {
    let grid = SpacepointGrid::build(&SequentialExecutor, &SpacepointCollection::default(), &config(12, 1))
        .unwrap();
    assert_eq!(grid.bin_of(PI, 0.0).phi, 0);
    assert_eq!(grid.bin_of(-PI, 0.0).phi, 0);
}

#[test]
fn test_neighbor_bins_cover_small_phi_axis_once() {
    let grid = SpacepointGrid::build(&SequentialExecutor, &SpacepointCollection::default(), &config(2, 3))
        .unwrap();
    let bins = grid.neighbor_bins(BinIndex { phi: 1, z: 1 }, 1, 1);
    assert_eq!(bins, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_neighbor_bins_clamp_z_edges() {
    let grid = SpacepointGrid::build(&SequentialExecutor, &SpacepointCollection::default(), &config(8, 4))
        .unwrap();
    let bins = grid.neighbor_bins(BinIndex { phi: 0, z: 0 }, 1, 1);
    // phi 7, 0, 1 with z 0..=1
    let expected: Vec<usize> = [7, 0, 1]
        .iter()
        .flat_map(|&phi| (0..=1).map(move |z| phi * 4 + z))
        .collect();
    assert_eq!(bins, expected);
}

#[test]
fn test_huge_neighbor_radius_covers_every_bin_once() {
    let grid = SpacepointGrid::build(&SequentialExecutor, &SpacepointCollection::default(), &config(8, 4))
        .unwrap();
    let center = BinIndex { phi: 7, z: 3 };
    let bins = grid.neighbor_bins(center, usize::MAX / 2 + 1, usize::MAX);
    let expected: Vec<usize> = (0..grid.num_bins()).collect();
    assert_eq!(bins, expected);

    let table = grid.neighbor_table(usize::MAX, usize::MAX);
    for global in 0..grid.num_bins() {
        assert_eq!(table.lane(global), expected.as_slice());
    }
}

#[test]
fn test_z_outside_bounds_clamped_to_edge_bins() {
    let event = SpacepointCollection::from_vec(vec![
        point(100.0, 0.0, -5000.0, 0),
        point(100.0, 0.0, 5000.0, 1),
    ]);
    let grid = SpacepointGrid::build(&SequentialExecutor, &event, &config(4, 5)).unwrap();
    assert_eq!(grid.bin_of(0.0, -5000.0).z, 0);
    assert_eq!(grid.bin_of(0.0, 5000.0).z, 4);
    assert_eq!(grid.len(), 2);
}

#[test]
fn test_neighbor_table_matches_neighbor_bins() {
    let grid = SpacepointGrid::build(&SequentialExecutor, &SpacepointCollection::default(), &config(6, 3))
        .unwrap();
    let table = grid.neighbor_table(1, 1);
    assert_eq!(table.lanes(), grid.num_bins());
    for global in 0..grid.num_bins() {
        let center = BinIndex {
            phi: global / 3,
            z: global % 3,
        };
        assert_eq!(table.lane(global), grid.neighbor_bins(center, 1, 1).as_slice());
    }
}

#[test]
fn test_invalid_grid_config() {
    let event = random_event(10, 5);
    for cfg in [
        config(0, 4),
        config(4, 0),
        GridConfig {
            phi_bins: 4,
            z_bins: 4,
            z_min: 10.0,
            z_max: -10.0,
        },
    ] {
        let result = SpacepointGrid::build(&SequentialExecutor, &event, &cfg);
        assert!(matches!(
            result,
            Err(SeedingError::InvalidConfiguration { .. })
        ));
    }
}
