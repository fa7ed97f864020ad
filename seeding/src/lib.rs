//! Seeding - parallel seed finding for helical track reconstruction.
//!
//! A seed is a radius-ordered triplet of spacepoints compatible with a helix
//! from the interaction region. The engine:
//! - bins spacepoints in a (phi, z) grid
//! - finds compatible bottom and top doublets per middle spacepoint
//! - combines them into triplets and scores them
//! - keeps the best seeds per middle spacepoint
//!
//! Every stage counts its output first and then fills exactly sized buffers,
//! so results are identical on one thread and on many.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seeding::{RayonExecutor, SeedFinder, SeedingConfig};
//!
//! let finder = SeedFinder::new(SeedingConfig::default(), RayonExecutor::new())?;
//! let seeds = finder.find_seeds(&spacepoints)?;
//!
//! println!("Found {} seeds", seeds.len());
//! ```

pub mod arena;
mod config;
pub mod doublet;
mod error;
mod executor;
pub mod grid;
mod pipeline;
pub mod selection;
mod spacepoint;
pub mod synthetic;
pub mod triplet;
pub mod truth;

#[cfg(test)]
pub mod testing;

pub mod prelude;

// ============================================================================
// Input data
// ============================================================================

pub use spacepoint::{MeasurementId, MeasurementLink, Spacepoint, SpacepointCollection};

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    GridConfig, MAX_PHI_BINS, PT_PER_HELIX_RADIUS_PER_TESLA, RadiusQualityCuts,
    SeedFilterConfig, SeedFinderConfig, SeedingConfig,
};

// ============================================================================
// Execution
// ============================================================================

pub use error::{Result, SeedingError, Stage};
pub use executor::{Executor, RayonExecutor, SequentialExecutor};

// ============================================================================
// Seed finding
// ============================================================================

pub use grid::{BinIndex, SpacepointGrid};
pub use pipeline::{SeedFinder, SeedingStats};
pub use selection::Seed;
pub use triplet::{TripletFit, fit_spacepoints};
pub use truth::{
    MatchPolicy, MatchSummary, MeasurementParticleMap, ParticleId, ParticleSelection, SeedMatcher,
};
