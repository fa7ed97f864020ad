//! Synthetic events: helical tracks from the beam line through a barrel of
//! cylindrical layers, plus optional noise hits.
//!
//! Used by the tests, the benchmark and the example program. Events are
//! reproducible from their seed.

use std::f64::consts::PI;

use glam::DVec3;
use rand::prelude::*;

use crate::config::PT_PER_HELIX_RADIUS_PER_TESLA;
use crate::spacepoint::{MeasurementId, MeasurementLink, Spacepoint, SpacepointCollection};
use crate::truth::{MeasurementParticleMap, ParticleId, ParticleSelection};

/// Barrel layer radii (mm) of an ATLAS-like pixel and strip detector.
pub const DEFAULT_LAYERS: [f64; 7] = [32.0, 72.0, 116.0, 172.0, 260.0, 360.0, 500.0];

/// Configuration for event generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of particles per event
    pub num_particles: usize,
    /// Transverse momentum range (GeV)
    pub pt_range: (f64, f64),
    /// Pseudorapidity range
    pub eta_range: (f64, f64),
    /// Range of the production point along the beam (mm)
    pub z0_range: (f64, f64),
    /// Layer radii (mm)
    pub layers: Vec<f64>,
    /// Hits outside |z| <= half_length are lost
    pub half_length: f64,
    /// Probability that a layer records a crossing
    pub hit_efficiency: f64,
    /// Uniform smearing of each coordinate (mm)
    pub smearing: f64,
    /// Number of noise hits spread over the layers
    pub noise_hits: usize,
    /// Field strength (T)
    pub b_field_in_z: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_particles: 50,
            pt_range: (1.0, 10.0),
            eta_range: (-2.0, 2.0),
            z0_range: (-50.0, 50.0),
            layers: DEFAULT_LAYERS.to_vec(),
            half_length: 2800.0,
            hit_efficiency: 1.0,
            smearing: 0.0,
            noise_hits: 0,
            b_field_in_z: 1.99724,
        }
    }
}

/// Dense event with noise, for throughput measurements.
pub fn busy_event_config() -> GeneratorConfig {
    GeneratorConfig {
        num_particles: 500,
        pt_range: (0.6, 20.0),
        eta_range: (-2.5, 2.5),
        noise_hits: 2000,
        smearing: 0.05,
        ..Default::default()
    }
}

/// Kinematics of a generated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratedParticle {
    pub id: ParticleId,
    pub pt: f64,
    /// Azimuth of the momentum at the production point
    pub phi0: f64,
    pub cot_theta: f64,
    pub z0: f64,
    /// +1 or -1
    pub charge: f64,
    /// Spacepoints left in the detector
    pub hits: usize,
}

impl GeneratedParticle {
    /// Production point on the beam line.
    #[inline]
    pub fn vertex(&self) -> DVec3 {
        DVec3::new(0.0, 0.0, self.z0)
    }
}

/// A generated event with its truth.
#[derive(Debug, Clone)]
pub struct SyntheticEvent {
    pub spacepoints: SpacepointCollection,
    pub particles: Vec<GeneratedParticle>,
    pub truth: MeasurementParticleMap,
}

impl SyntheticEvent {
    /// Particles passing `selection` that left at least
    /// `selection.min_hits` spacepoints.
    pub fn reconstructable(&self, selection: &ParticleSelection) -> Vec<ParticleId> {
        self.particles
            .iter()
            .filter(|p| p.hits >= selection.min_hits)
            .filter(|p| selection.accepts(p.charge, p.pt, p.vertex()))
            .map(|p| p.id)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct EventGenerator {
    config: GeneratorConfig,
}

impl EventGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one event. The same seed always gives the same event.
    pub fn generate(&self, seed: u64) -> SyntheticEvent {
        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut points = Vec::new();
        let mut particles = Vec::with_capacity(config.num_particles);
        let mut truth = MeasurementParticleMap::new();

        for index in 0..config.num_particles {
            let id = ParticleId(index as u64 + 1);
            let mut particle = GeneratedParticle {
                id,
                pt: rng.random_range(config.pt_range.0..=config.pt_range.1),
                phi0: rng.random_range(-PI..PI),
                cot_theta: rng
                    .random_range(config.eta_range.0..=config.eta_range.1)
                    .sinh(),
                z0: rng.random_range(config.z0_range.0..=config.z0_range.1),
                charge: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
                hits: 0,
            };

            let radius = particle.pt / (PT_PER_HELIX_RADIUS_PER_TESLA * config.b_field_in_z);
            for &layer in &config.layers {
                let Some(position) = helix_crossing(&particle, radius, layer) else {
                    break;
                };
                if position.z.abs() > config.half_length {
                    break;
                }
                if !rng.random_bool(config.hit_efficiency) {
                    continue;
                }
                let measurement = MeasurementId(points.len() as u64);
                points.push(Spacepoint::new(
                    smear(&mut rng, position, config.smearing),
                    MeasurementLink::Single(measurement),
                ));
                truth.insert(measurement, vec![id]);
                particle.hits += 1;
            }
            particles.push(particle);
        }

        for _ in 0..config.noise_hits {
            let Some(&layer) = config.layers.choose(&mut rng) else {
                break;
            };
            let phi: f64 = rng.random_range(-PI..PI);
            let z = rng.random_range(-config.half_length..=config.half_length);
            let measurement = MeasurementId(points.len() as u64);
            points.push(Spacepoint::new(
                DVec3::new(layer * phi.cos(), layer * phi.sin(), z),
                MeasurementLink::Single(measurement),
            ));
        }

        SyntheticEvent {
            spacepoints: SpacepointCollection::from_vec(points),
            particles,
            truth,
        }
    }
}

/// Point where a helix from `(0, 0, z0)` crosses the cylinder of radius `r`.
///
/// `None` when the helix curls up before reaching the layer.
fn helix_crossing(particle: &GeneratedParticle, radius: f64, r: f64) -> Option<DVec3> {
    let half_angle = r / (2.0 * radius);
    if half_angle >= 1.0 {
        return None;
    }
    let phi = particle.phi0 - particle.charge * half_angle.asin();
    let arc_length = 2.0 * radius * half_angle.asin();
    Some(DVec3::new(
        r * phi.cos(),
        r * phi.sin(),
        particle.z0 + particle.cot_theta * arc_length,
    ))
}

fn smear(rng: &mut StdRng, position: DVec3, smearing: f64) -> DVec3 {
    if smearing <= 0.0 {
        return position;
    }
    position
        + DVec3::new(
            rng.random_range(-smearing..=smearing),
            rng.random_range(-smearing..=smearing),
            rng.random_range(-smearing..=smearing),
        )
}
