//! Seed finding for a whole event.
//!
//! # Stages
//!
//! 1. **Grid** - bin spacepoints by (phi, z), sorted by radius per bin
//! 2. **Doublets** - count, then fill bottom and top partners per middle
//! 3. **Triplets** - count, then fill per bottom doublet, then weight
//! 4. **Selection** - rank, deduplicate and cap per middle
//!
//! Every stage reads only the outputs of the previous one. A finder keeps no
//! per-event state, so one finder can process any number of events.


use std::time::{Duration, Instant};

use crate::config::{GridConfig, SeedingConfig};
use crate::doublet::{DoubletFinder, count_doublets, find_doublets};
use crate::error::{Result, SeedingError};
use crate::executor::{Executor, SequentialExecutor};
use crate::grid::SpacepointGrid;
use crate::selection::{Seed, select_seeds};
use crate::spacepoint::SpacepointCollection;
use crate::triplet::{TripletFinder, count_triplets, find_triplets, weight_triplets};

/// Per-event stage sizes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedingStats {
    pub spacepoints: usize,
    pub grid_bins: usize,
    pub bottom_doublets: usize,
    pub top_doublets: usize,
    pub triplets: usize,
    pub seeds: usize,
    pub elapsed: Duration,
}

/// Seed finder bound to a configuration and an execution backend.
#[derive(Debug)]
pub struct SeedFinder<E: Executor = SequentialExecutor> {
    config: SeedingConfig,
    grid: GridConfig,
    executor: E,
}

impl Default for SeedFinder<SequentialExecutor> {
    fn default() -> Self {
        let config = SeedingConfig::default();
        Self {
            grid: config.grid_config(),
            config,
            executor: SequentialExecutor,
        }
    }
}

impl<E: Executor> SeedFinder<E> {
    /// Create a finder, rejecting an invalid configuration.
    pub fn new(config: SeedingConfig, executor: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            grid: config.grid_config(),
            config,
            executor,
        })
    }

    pub fn config(&self) -> &SeedingConfig {
        &self.config
    }

    /// Effective grid binning.
    pub fn grid_config(&self) -> &GridConfig {
        &self.grid
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn build_grid(&self, spacepoints: &SpacepointCollection) -> Result<SpacepointGrid> {
        SpacepointGrid::build(&self.executor, spacepoints, &self.grid)
    }

    /// Find the seeds of one event.
    ///
    /// Seeds are grouped by middle spacepoint in grid order, best first
    /// within a group.
    pub fn find_seeds(&self, spacepoints: &SpacepointCollection) -> Result<Vec<Seed>> {
        Ok(self.find_seeds_with_stats(spacepoints)?.0)
    }

    /// Find seeds on a grid already built for `spacepoints`.
    ///
    /// The grid must hold exactly `spacepoints` and use this finder's
    /// binning; anything else is rejected as an invalid configuration.
    pub fn find_seeds_in_grid(
        &self,
        spacepoints: &SpacepointCollection,
        grid: &SpacepointGrid,
    ) -> Result<Vec<Seed>> {
        if grid.len() != spacepoints.len() {
            return Err(SeedingError::invalid(format!(
                "grid holds {} spacepoints, event has {}",
                grid.len(),
                spacepoints.len()
            )));
        }
        if !grid.matches(&self.grid) {
            return Err(SeedingError::invalid(format!(
                "grid binning {}x{} does not match the finder's {}x{} over z ({}, {})",
                grid.phi_bins(),
                grid.z_bins(),
                self.grid.phi_bins,
                self.grid.z_bins,
                self.grid.z_min,
                self.grid.z_max
            )));
        }
        let mut stats = SeedingStats::default();
        self.run(spacepoints, grid, &mut stats)
    }

    pub fn find_seeds_with_stats(
        &self,
        spacepoints: &SpacepointCollection,
    ) -> Result<(Vec<Seed>, SeedingStats)> {
        let start = Instant::now();
        let grid = self.build_grid(spacepoints)?;
        let grid_elapsed = start.elapsed();

        let mut stats = SeedingStats::default();
        let seeds = self.run(spacepoints, &grid, &mut stats)?;
        stats.elapsed = start.elapsed();

        tracing::debug!(
            spacepoints = stats.spacepoints,
            grid_bins = stats.grid_bins,
            bottom_doublets = stats.bottom_doublets,
            top_doublets = stats.top_doublets,
            triplets = stats.triplets,
            seeds = stats.seeds,
            backend = self.executor.name(),
            "seeding finished"
        );
        tracing::trace!(
            "seeding took {:.3} ms (grid {:.3} ms)",
            stats.elapsed.as_secs_f64() * 1e3,
            grid_elapsed.as_secs_f64() * 1e3
        );

        Ok((seeds, stats))
    }

    fn run(
        &self,
        spacepoints: &SpacepointCollection,
        grid: &SpacepointGrid,
        stats: &mut SeedingStats,
    ) -> Result<Vec<Seed>> {
        let executor = &self.executor;
        let finder_config = &self.config.finder;
        stats.spacepoints = spacepoints.len();
        stats.grid_bins = grid.num_bins();

        let doublet_finder = DoubletFinder::new(spacepoints, grid, finder_config);
        let counters = count_doublets(executor, &doublet_finder);
        let doublets = find_doublets(executor, &doublet_finder, counters)?;
        stats.bottom_doublets = doublets.num_bottom();
        stats.top_doublets = doublets.num_top();

        let triplet_finder = TripletFinder::new(spacepoints, &doublets, finder_config);
        let counters = count_triplets(executor, &triplet_finder);
        let mut triplets = find_triplets(executor, &triplet_finder, counters)?;
        weight_triplets(
            executor,
            spacepoints,
            &mut triplets,
            finder_config,
            &self.config.filter,
        );
        stats.triplets = triplets.len();

        let seeds = select_seeds(executor, spacepoints, &triplets, &self.config.filter)?;
        stats.seeds = seeds.len();
        Ok(seeds.into_items())
    }
}
