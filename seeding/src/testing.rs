//! Testing utilities for seeding.

#![allow(dead_code)]

use crate::config::{SeedFinderConfig, SeedingConfig};
use crate::spacepoint::{MeasurementId, MeasurementLink, Spacepoint, SpacepointCollection};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
pub fn init_tracing() {
    common::log_setup::init_test_logging();
}

/// Spacepoint at cylindrical coordinates with its own measurement id.
pub fn cylindrical(r: f64, phi: f64, z: f64, id: u64) -> Spacepoint {
    Spacepoint::new(
        glam::DVec3::new(r * phi.cos(), r * phi.sin(), z),
        MeasurementLink::Single(MeasurementId(id)),
    )
}

/// Three spacepoints on the straight line `z = 10 + 0.5 r` at phi 0.3.
pub fn straight_track() -> SpacepointCollection {
    SpacepointCollection::from_vec(vec![
        cylindrical(30.0, 0.3, 25.0, 0),
        cylindrical(80.0, 0.3, 50.0, 1),
        cylindrical(150.0, 0.3, 85.0, 2),
    ])
}

/// Default configuration with a ±50 mm collision region.
pub fn narrow_collision_config() -> SeedingConfig {
    SeedingConfig {
        finder: SeedFinderConfig {
            collision_region_min: -50.0,
            collision_region_max: 50.0,
            ..Default::default()
        },
        ..Default::default()
    }
}
