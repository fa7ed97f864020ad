//! Example: Seed Finding on a Synthetic Event
//!
//! 1. Generate a busy event with helical tracks and noise
//! 2. Find seeds on the rayon thread pool
//! 3. Match seeds to the generated particles
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example synthetic_event -- [config.yaml] [event_seed]
//! ```

use std::env;

use anyhow::Context;
use seeding::synthetic::{EventGenerator, busy_event_config};
use seeding::{
    MatchPolicy, ParticleSelection, RayonExecutor, SeedFinder, SeedMatcher, SeedingConfig,
};

fn main() -> anyhow::Result<()> {
    common::log_setup::setup_logging("info,seeding=debug", "logs", "synthetic_event");

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => SeedingConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {path}"))?,
        None => SeedingConfig::default(),
    };
    let event_seed = match args.get(2) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid event seed: {value}"))?,
        None => 42,
    };

    let event = EventGenerator::new(busy_event_config()).generate(event_seed);
    tracing::info!(
        "Generated event {}: {} spacepoints from {} particles",
        event_seed,
        event.spacepoints.len(),
        event.particles.len()
    );

    let finder = SeedFinder::new(config, RayonExecutor::new())?;
    let (seeds, stats) = finder.find_seeds_with_stats(&event.spacepoints)?;
    tracing::info!(
        "Found {} seeds from {} triplets in {:.1} ms",
        seeds.len(),
        stats.triplets,
        stats.elapsed.as_secs_f64() * 1e3
    );

    let matcher = SeedMatcher::new(&event.spacepoints, &event.truth, MatchPolicy::Majority);
    let summary = matcher.tally(&seeds);
    let particles = event.reconstructable(&ParticleSelection::default());
    tracing::info!(
        "Efficiency {:.3}, duplication rate {:.2}, fake rate {:.3}",
        summary.efficiency(&particles),
        summary.duplication_rate(),
        summary.fake_rate()
    );

    Ok(())
}
