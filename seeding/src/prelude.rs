//! Common imports for seed finding.
//!
//! ```rust,ignore
//! use seeding::prelude::*;
//! ```

pub use crate::{
    MeasurementId, MeasurementLink, RayonExecutor, Seed, SeedFinder, SeedingConfig, SeedingError,
    SequentialExecutor, Spacepoint, SpacepointCollection,
};
