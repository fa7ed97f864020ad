//! Configuration types for seed finding.
//!
//! All thresholds are event-independent and read-only for the duration of a
//! run. Units: millimetres, GeV, tesla, radians.

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeedingError};

/// Transverse momentum (GeV) per millimetre of helix radius per tesla.
pub const PT_PER_HELIX_RADIUS_PER_TESLA: f64 = 2.99792458e-4;

/// Upper bound for derived phi bin counts.
pub const MAX_PHI_BINS: usize = 10_000;

// =============================================================================
// Seed finder configuration
// =============================================================================

/// Geometric and kinematic windows for doublet and triplet finding.
///
/// Defaults describe an ATLAS-like inner tracker in a 2 T solenoid:
/// seeds down to 500 MeV, z-origins within ±250 mm of the nominal
/// interaction point and |eta| < 2.7 (cotTheta = sinh(2.7)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedFinderConfig {
    /// Longitudinal extent of the detector.
    pub z_min: f64,
    pub z_max: f64,
    /// Outer transverse radius of the seeding region.
    pub r_max: f64,
    /// Radial separation window between a middle spacepoint and its partner.
    pub delta_r_min: f64,
    pub delta_r_max: f64,
    /// Maximum |cotTheta| of a doublet.
    pub cot_theta_max: f64,
    /// Allowed z-origin window on the beam axis.
    pub collision_region_min: f64,
    pub collision_region_max: f64,
    /// Minimum transverse momentum of a seed.
    pub min_pt: f64,
    /// Solenoid field strength.
    pub b_field_in_z: f64,
    /// Maximum transverse impact parameter.
    pub impact_max: f64,
    /// Number of sigmas of multiple scattering tolerated between the two
    /// doublet slopes.
    pub sigma_scattering: f64,
    /// Above this pT the scattering tolerance stops shrinking.
    pub max_pt_scattering: f64,
    /// Radiation length traversed between bottom and top spacepoint.
    pub rad_length_per_seed: f64,
    /// Grid bins scanned on each side of the middle spacepoint's bin.
    pub phi_neighbors: usize,
    pub z_neighbors: usize,
}

impl Default for SeedFinderConfig {
    fn default() -> Self {
        Self {
            z_min: -2800.0,
            z_max: 2800.0,
            r_max: 600.0,
            delta_r_min: 5.0,
            delta_r_max: 160.0,
            cot_theta_max: 7.40627,
            collision_region_min: -250.0,
            collision_region_max: 250.0,
            min_pt: 0.5,
            b_field_in_z: 1.99724,
            impact_max: 10.0,
            sigma_scattering: 1.0,
            max_pt_scattering: 10.0,
            rad_length_per_seed: 0.05,
            phi_neighbors: 1,
            z_neighbors: 1,
        }
    }
}

impl SeedFinderConfig {
    /// Transverse momentum per millimetre of helix radius in this field.
    #[inline]
    pub fn pt_per_helix_radius(&self) -> f64 {
        PT_PER_HELIX_RADIUS_PER_TESLA * self.b_field_in_z
    }

    /// Helix radius of a `min_pt` particle.
    #[inline]
    pub fn min_helix_radius(&self) -> f64 {
        self.min_pt / self.pt_per_helix_radius()
    }

    /// Largest curvature (1/R) a seed may have.
    #[inline]
    pub fn max_curvature(&self) -> f64 {
        1.0 / self.min_helix_radius()
    }

    /// Highland multiple-scattering constant (GeV) for `rad_length_per_seed`.
    #[inline]
    pub fn highland(&self) -> f64 {
        let x = self.rad_length_per_seed;
        13.6e-3 * x.sqrt() * (1.0 + 0.038 * x.ln())
    }

    /// Squared scattering angle of a `min_pt` particle.
    #[inline]
    pub fn max_scattering_angle2(&self) -> f64 {
        let angle = self.highland() / self.min_pt;
        angle * angle
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("z_min", self.z_min),
            ("z_max", self.z_max),
            ("r_max", self.r_max),
            ("delta_r_min", self.delta_r_min),
            ("delta_r_max", self.delta_r_max),
            ("cot_theta_max", self.cot_theta_max),
            ("collision_region_min", self.collision_region_min),
            ("collision_region_max", self.collision_region_max),
            ("min_pt", self.min_pt),
            ("b_field_in_z", self.b_field_in_z),
            ("impact_max", self.impact_max),
            ("sigma_scattering", self.sigma_scattering),
            ("max_pt_scattering", self.max_pt_scattering),
            ("rad_length_per_seed", self.rad_length_per_seed),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SeedingError::invalid(format!(
                "{name} must be finite, got {value}"
            )));
        }
        if self.z_min >= self.z_max {
            return Err(SeedingError::invalid(format!(
                "z_min must be < z_max, got ({}, {})",
                self.z_min, self.z_max
            )));
        }
        if self.r_max <= 0.0 {
            return Err(SeedingError::invalid(format!(
                "r_max must be positive, got {}",
                self.r_max
            )));
        }
        if self.delta_r_min <= 0.0 || self.delta_r_min > self.delta_r_max {
            return Err(SeedingError::invalid(format!(
                "delta_r window must satisfy 0 < min <= max, got ({}, {})",
                self.delta_r_min, self.delta_r_max
            )));
        }
        if self.cot_theta_max <= 0.0 {
            return Err(SeedingError::invalid(format!(
                "cot_theta_max must be positive, got {}",
                self.cot_theta_max
            )));
        }
        if self.collision_region_min > self.collision_region_max {
            return Err(SeedingError::invalid(format!(
                "collision region is inverted: ({}, {})",
                self.collision_region_min, self.collision_region_max
            )));
        }
        if self.min_pt <= 0.0 || self.b_field_in_z <= 0.0 {
            return Err(SeedingError::invalid(format!(
                "min_pt and b_field_in_z must be positive, got ({}, {})",
                self.min_pt, self.b_field_in_z
            )));
        }
        if self.impact_max < 0.0 {
            return Err(SeedingError::invalid(format!(
                "impact_max must be non-negative, got {}",
                self.impact_max
            )));
        }
        if self.sigma_scattering < 0.0 {
            return Err(SeedingError::invalid(format!(
                "sigma_scattering must be non-negative, got {}",
                self.sigma_scattering
            )));
        }
        if self.max_pt_scattering < self.min_pt {
            return Err(SeedingError::invalid(format!(
                "max_pt_scattering ({}) must not be below min_pt ({})",
                self.max_pt_scattering, self.min_pt
            )));
        }
        if self.rad_length_per_seed <= 0.0 {
            return Err(SeedingError::invalid(format!(
                "rad_length_per_seed must be positive, got {}",
                self.rad_length_per_seed
            )));
        }
        if self.phi_neighbors > MAX_PHI_BINS || self.z_neighbors > MAX_PHI_BINS {
            return Err(SeedingError::invalid(format!(
                "neighbour radii must not exceed {MAX_PHI_BINS}, got phi_neighbors={}, z_neighbors={}",
                self.phi_neighbors, self.z_neighbors
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Seed filter configuration
// =============================================================================

/// Radius-dependent quality bonuses and the single-seed cut.
///
/// Bottom spacepoints far from the beam line and top spacepoints close to it
/// indicate seeds made of precise pixel hits. A seed whose bottom spacepoint
/// lies beyond `single_seed_bottom_radius` is only kept with at least
/// `single_seed_min_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusQualityCuts {
    pub good_bottom_min_radius: f64,
    pub good_bottom_weight_increase: f64,
    pub good_top_max_radius: f64,
    pub good_top_weight_increase: f64,
    pub single_seed_bottom_radius: f64,
    pub single_seed_min_weight: f64,
}

impl Default for RadiusQualityCuts {
    fn default() -> Self {
        Self {
            good_bottom_min_radius: 150.0,
            good_bottom_weight_increase: 400.0,
            good_top_max_radius: 150.0,
            good_top_weight_increase: 200.0,
            single_seed_bottom_radius: 150.0,
            single_seed_min_weight: 380.0,
        }
    }
}

/// Scoring, ranking and capping of triplets per middle spacepoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedFilterConfig {
    /// Seeds kept per middle spacepoint.
    pub max_seeds_per_middle: usize,
    /// Triplets below this weight are discarded.
    pub min_weight: f64,
    /// Weight per millimetre of impact-parameter headroom below `impact_max`.
    pub impact_weight_factor: f64,
    /// Weight added per supporting triplet.
    pub compat_seed_weight: f64,
    /// Supporting triplets counted at most.
    pub compat_seed_limit: usize,
    /// Inverse helix diameter tolerance (1/mm) for a supporting triplet.
    pub delta_inv_helix_diameter: f64,
    /// Minimum top radius separation between supporting triplets.
    pub delta_r_min: f64,
    /// Partners closer than this (mm) count as duplicates.
    ///
    /// With the default of 0 only partners at identical positions match.
    /// Triplets of one middle rarely share both positions, so duplicate
    /// removal is effectively off until this is positive.
    pub duplicate_tolerance: f64,
    pub radius_quality: Option<RadiusQualityCuts>,
}

impl Default for SeedFilterConfig {
    fn default() -> Self {
        Self {
            max_seeds_per_middle: 5,
            min_weight: 0.0,
            impact_weight_factor: 1.0,
            compat_seed_weight: 200.0,
            compat_seed_limit: 2,
            delta_inv_helix_diameter: 3.0e-5,
            delta_r_min: 5.0,
            duplicate_tolerance: 0.0,
            radius_quality: None,
        }
    }
}

impl SeedFilterConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if self.max_seeds_per_middle == 0 {
            return Err(SeedingError::invalid(
                "max_seeds_per_middle must be at least 1, got 0",
            ));
        }
        let non_negative = [
            ("impact_weight_factor", self.impact_weight_factor),
            ("compat_seed_weight", self.compat_seed_weight),
            ("delta_inv_helix_diameter", self.delta_inv_helix_diameter),
            ("delta_r_min", self.delta_r_min),
            ("duplicate_tolerance", self.duplicate_tolerance),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, v)| v.is_nan() || *v < 0.0) {
            return Err(SeedingError::invalid(format!(
                "{name} must be non-negative, got {value}"
            )));
        }
        if self.min_weight.is_nan() {
            return Err(SeedingError::invalid("min_weight must not be NaN"));
        }
        if let Some(cuts) = &self.radius_quality {
            let values = [
                cuts.good_bottom_min_radius,
                cuts.good_bottom_weight_increase,
                cuts.good_top_max_radius,
                cuts.good_top_weight_increase,
                cuts.single_seed_bottom_radius,
                cuts.single_seed_min_weight,
            ];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(SeedingError::invalid(
                    "radius quality cuts must be finite",
                ));
            }
            if cuts.good_bottom_weight_increase < 0.0 || cuts.good_top_weight_increase < 0.0 {
                return Err(SeedingError::invalid(
                    "radius quality weight increases must be non-negative",
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Grid configuration
// =============================================================================

/// Binning of the (phi, z) spacepoint grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub phi_bins: usize,
    pub z_bins: usize,
    pub z_min: f64,
    pub z_max: f64,
}

impl GridConfig {
    /// Derive the binning from the finder windows.
    ///
    /// A phi bin spans the azimuthal deflection of a `min_pt` helix between
    /// `r_max - delta_r_max` and `r_max`, so all partners of a middle
    /// spacepoint lie in its own or an adjacent phi bin. A z bin spans
    /// `cot_theta_max * delta_r_max`.
    pub fn from_finder(finder: &SeedFinderConfig) -> Self {
        let diameter = 2.0 * finder.min_helix_radius();
        let deflection = |r: f64| (r / diameter).clamp(0.0, 1.0).asin();
        let r_inner = (finder.r_max - finder.delta_r_max).max(0.0);
        let delta_phi = deflection(finder.r_max) - deflection(r_inner);

        let phi_bins = if delta_phi > 0.0 {
            ((2.0 * PI / delta_phi).floor() as usize).clamp(1, MAX_PHI_BINS)
        } else {
            MAX_PHI_BINS
        };

        let z_bin_size = finder.cot_theta_max * finder.delta_r_max;
        let z_bins = (((finder.z_max - finder.z_min) / z_bin_size).floor() as usize).max(1);

        Self {
            phi_bins,
            z_bins,
            z_min: finder.z_min,
            z_max: finder.z_max,
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if self.phi_bins == 0 || self.z_bins == 0 {
            return Err(SeedingError::invalid(format!(
                "grid bin counts must be positive, got phi_bins={}, z_bins={}",
                self.phi_bins, self.z_bins
            )));
        }
        if !(self.z_min.is_finite() && self.z_max.is_finite()) || self.z_min >= self.z_max {
            return Err(SeedingError::invalid(format!(
                "grid z bounds must be finite with z_min < z_max, got ({}, {})",
                self.z_min, self.z_max
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Complete seeding configuration
// =============================================================================

/// Everything a [`SeedFinder`](crate::SeedFinder) needs.
///
/// When `grid` is `None` the binning is derived with
/// [`GridConfig::from_finder`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    pub finder: SeedFinderConfig,
    pub filter: SeedFilterConfig,
    pub grid: Option<GridConfig>,
}

impl SeedingConfig {
    /// Load a configuration from a `.yaml`/`.yml` or `.json` file.
    ///
    /// Missing fields take their default values. The loaded configuration
    /// is validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = common::FileFormat::from_file_name(&path.to_string_lossy())?;
        let text = std::fs::read_to_string(path).map_err(|source| SeedingError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SeedingConfig =
            common::deserialize(&text, format).map_err(|source| SeedingError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn grid_config(&self) -> GridConfig {
        self.grid
            .clone()
            .unwrap_or_else(|| GridConfig::from_finder(&self.finder))
    }

    /// Validate all parts, including the effective grid.
    pub fn validate(&self) -> Result<()> {
        self.finder.validate()?;
        self.filter.validate()?;
        self.grid_config().validate()
    }
}
