//! Truth matching of seeds against simulated particles.
//!
//! A seed is attributed to the particle that contributed the most of its
//! measurements. Tallies over an event give the seeding efficiency and the
//! number of duplicate seeds per particle.

use std::collections::{BTreeMap, HashMap};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::selection::Seed;
use crate::spacepoint::{MeasurementId, SpacepointCollection};

/// Identifier of a simulated particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

/// Particles that left energy in each measurement.
pub type MeasurementParticleMap = HashMap<MeasurementId, Vec<ParticleId>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleHitCount {
    pub particle: ParticleId,
    pub hits: usize,
}

/// Particles behind `measurements`, most hits first, ties by particle id.
///
/// Measurements without truth information are ignored.
pub fn contributing_particles(
    measurements: &[MeasurementId],
    truth: &MeasurementParticleMap,
) -> Vec<ParticleHitCount> {
    let mut hits: BTreeMap<ParticleId, usize> = BTreeMap::new();
    for id in measurements {
        for &particle in truth.get(id).into_iter().flatten() {
            *hits.entry(particle).or_default() += 1;
        }
    }

    let mut counts: Vec<ParticleHitCount> = hits
        .into_iter()
        .map(|(particle, hits)| ParticleHitCount { particle, hits })
        .collect();
    counts.sort_by(|a, b| b.hits.cmp(&a.hits).then(a.particle.cmp(&b.particle)));
    counts
}

/// When a seed counts as reconstructing a particle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// The leading particle owns more than half of the measurements.
    #[default]
    Majority,
    /// Every measurement belongs to the leading particle.
    Pure,
}

/// Which particles count towards the efficiency.
///
/// Neutral particles are never selected. The vertex window applies to the
/// production point: z along the beam, r transverse to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSelection {
    /// Minimum transverse momentum (GeV).
    pub pt_cut: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub r_max: f64,
    /// Spacepoints a particle must leave to be reconstructable at all.
    pub min_hits: usize,
}

impl Default for ParticleSelection {
    fn default() -> Self {
        Self {
            pt_cut: 1.0,
            z_min: -500.0,
            z_max: 500.0,
            r_max: 200.0,
            min_hits: 3,
        }
    }
}

impl ParticleSelection {
    /// Whether a particle with these kinematics is selected.
    pub fn accepts(&self, charge: f64, pt: f64, vertex: DVec3) -> bool {
        charge != 0.0
            && pt >= self.pt_cut
            && (self.z_min..=self.z_max).contains(&vertex.z)
            && vertex.x.hypot(vertex.y) <= self.r_max
    }
}

/// Seed efficiency and duplication for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSummary {
    /// Seeds per matched particle.
    pub seeds_per_particle: BTreeMap<ParticleId, usize>,
    pub matched_seeds: usize,
    pub fake_seeds: usize,
}

impl MatchSummary {
    /// Fraction of `particles` with at least one matched seed.
    pub fn efficiency(&self, particles: &[ParticleId]) -> f64 {
        if particles.is_empty() {
            return 0.0;
        }
        let found = particles
            .iter()
            .filter(|&p| self.seeds_per_particle.contains_key(p))
            .count();
        found as f64 / particles.len() as f64
    }

    /// Seeds beyond the first per matched particle.
    pub fn duplicates(&self) -> usize {
        self.seeds_per_particle.values().map(|n| n - 1).sum()
    }

    /// Mean number of duplicates per matched particle.
    pub fn duplication_rate(&self) -> f64 {
        if self.seeds_per_particle.is_empty() {
            return 0.0;
        }
        self.duplicates() as f64 / self.seeds_per_particle.len() as f64
    }

    pub fn fake_rate(&self) -> f64 {
        let total = self.matched_seeds + self.fake_seeds;
        if total == 0 {
            return 0.0;
        }
        self.fake_seeds as f64 / total as f64
    }
}

/// Matches seeds of one event to particles.
#[derive(Debug, Clone, Copy)]
pub struct SeedMatcher<'a> {
    spacepoints: &'a SpacepointCollection,
    truth: &'a MeasurementParticleMap,
    policy: MatchPolicy,
}

impl<'a> SeedMatcher<'a> {
    pub fn new(
        spacepoints: &'a SpacepointCollection,
        truth: &'a MeasurementParticleMap,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            spacepoints,
            truth,
            policy,
        }
    }

    /// Particle reconstructed by `seed`, if any.
    pub fn match_seed(&self, seed: &Seed) -> Option<ParticleId> {
        let measurements = seed.measurements(self.spacepoints);
        let leading = *contributing_particles(&measurements, self.truth).first()?;
        let matched = match self.policy {
            MatchPolicy::Majority => 2 * leading.hits > measurements.len(),
            MatchPolicy::Pure => leading.hits == measurements.len(),
        };
        matched.then_some(leading.particle)
    }

    pub fn tally(&self, seeds: &[Seed]) -> MatchSummary {
        let mut summary = MatchSummary::default();
        for seed in seeds {
            match self.match_seed(seed) {
                Some(particle) => {
                    *summary.seeds_per_particle.entry(particle).or_default() += 1;
                    summary.matched_seeds += 1;
                }
                None => summary.fake_seeds += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use common::float_ext::FloatExt;
    use glam::DVec3;

    use super::*;
    use crate::spacepoint::{MeasurementLink, Spacepoint};

    fn collection() -> SpacepointCollection {
        (0..6)
            .map(|i| {
                Spacepoint::new(
                    DVec3::new(10.0 * (i + 1) as f64, 0.0, 0.0),
                    MeasurementLink::Single(MeasurementId(i)),
                )
            })
            .collect()
    }

    fn truth() -> MeasurementParticleMap {
        let mut truth = MeasurementParticleMap::new();
        truth.insert(MeasurementId(0), vec![ParticleId(1)]);
        truth.insert(MeasurementId(1), vec![ParticleId(1)]);
        truth.insert(MeasurementId(2), vec![ParticleId(1)]);
        truth.insert(MeasurementId(3), vec![ParticleId(2)]);
        truth.insert(MeasurementId(4), vec![ParticleId(3)]);
        // 5 is noise
        truth
    }

    fn seed(bottom: usize, middle: usize, top: usize) -> Seed {
        Seed {
            bottom,
            middle,
            top,
            weight: 0.0,
        }
    }

    #[test]
    fn test_contributing_particles_order() {
        let ids = [MeasurementId(3), MeasurementId(0), MeasurementId(4), MeasurementId(1)];
        let counts = contributing_particles(&ids, &truth());
        assert_eq!(
            counts,
            vec![
                ParticleHitCount {
                    particle: ParticleId(1),
                    hits: 2
                },
                ParticleHitCount {
                    particle: ParticleId(2),
                    hits: 1
                },
                ParticleHitCount {
                    particle: ParticleId(3),
                    hits: 1
                },
            ]
        );
    }

    #[test]
    fn test_majority_and_pure_policies() {
        let spacepoints = collection();
        let truth = truth();
        let majority = SeedMatcher::new(&spacepoints, &truth, MatchPolicy::Majority);
        let pure = SeedMatcher::new(&spacepoints, &truth, MatchPolicy::Pure);

        assert_eq!(majority.match_seed(&seed(0, 1, 2)), Some(ParticleId(1)));
        assert_eq!(pure.match_seed(&seed(0, 1, 2)), Some(ParticleId(1)));

        assert_eq!(majority.match_seed(&seed(0, 1, 3)), Some(ParticleId(1)));
        assert_eq!(pure.match_seed(&seed(0, 1, 3)), None);

        assert_eq!(majority.match_seed(&seed(0, 3, 4)), None);
        assert_eq!(majority.match_seed(&seed(0, 4, 5)), None);
    }

    #[test]
    fn test_tally() {
        let spacepoints = collection();
        let truth = truth();
        let matcher = SeedMatcher::new(&spacepoints, &truth, MatchPolicy::Majority);
        let seeds = [seed(0, 1, 2), seed(0, 1, 3), seed(1, 2, 5), seed(3, 4, 5)];

        let summary = matcher.tally(&seeds);
        assert_eq!(summary.seeds_per_particle.get(&ParticleId(1)), Some(&3));
        assert_eq!(summary.matched_seeds, 3);
        assert_eq!(summary.fake_seeds, 1);
        assert_eq!(summary.duplicates(), 2);
        assert!(summary.duplication_rate().relative_eq(2.0, 1e-12));
        assert!(summary.fake_rate().relative_eq(0.25, 1e-12));

        let particles = [ParticleId(1), ParticleId(2), ParticleId(3), ParticleId(4)];
        assert!(summary.efficiency(&particles).relative_eq(0.25, 1e-12));
    }

    #[test]
    fn test_empty_tally() {
        let spacepoints = collection();
        let truth = truth();
        let summary = SeedMatcher::new(&spacepoints, &truth, MatchPolicy::Pure).tally(&[]);
        assert_eq!(summary.efficiency(&[ParticleId(1)]), 0.0);
        assert_eq!(summary.duplication_rate(), 0.0);
        assert_eq!(summary.fake_rate(), 0.0);
    }

    #[test]
    fn test_particle_selection_cuts() {
        let selection = ParticleSelection::default();
        let origin = DVec3::ZERO;
        assert!(selection.accepts(1.0, 2.0, origin));
        assert!(selection.accepts(-1.0, selection.pt_cut, origin));

        // neutral
        assert!(!selection.accepts(0.0, 2.0, origin));
        // below the pT cut
        assert!(!selection.accepts(1.0, 0.9, origin));
        // outside the z window, edges included
        assert!(selection.accepts(1.0, 2.0, DVec3::new(0.0, 0.0, selection.z_max)));
        assert!(!selection.accepts(1.0, 2.0, DVec3::new(0.0, 0.0, selection.z_max + 1.0)));
        assert!(!selection.accepts(1.0, 2.0, DVec3::new(0.0, 0.0, selection.z_min - 1.0)));
        // displaced transversely: r = 250
        assert!(!selection.accepts(1.0, 2.0, DVec3::new(150.0, 200.0, 0.0)));
        assert!(selection.accepts(1.0, 2.0, DVec3::new(120.0, 160.0, 0.0)));
    }
}
