use crate::config::SeedFinderConfig;
use crate::doublet::{DoubletKind, LinCircle};
use crate::spacepoint::{Spacepoint, SpacepointCollection};

/// Helix parameters of an accepted triplet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripletFit {
    /// Signed curvature 1/R in the transverse plane.
    pub curvature: f64,
    /// Transverse impact parameter.
    pub impact: f64,
}

impl TripletFit {
    /// Transverse momentum implied by the curvature; infinite for a straight
    /// line.
    pub fn pt(&self, config: &SeedFinderConfig) -> f64 {
        if self.curvature == 0.0 {
            f64::INFINITY
        } else {
            config.pt_per_helix_radius() / self.curvature.abs()
        }
    }
}

/// Test a bottom and a top doublet of the same middle spacepoint.
///
/// The slopes must agree within measurement error plus multiple scattering,
/// first for a `min_pt` particle and then for the pT of the fitted circle.
/// The circle is the line `v = A u + B` through both partners in the
/// conformal plane of the middle spacepoint.
pub fn fit_triplet(
    middle: &Spacepoint,
    bottom: &LinCircle,
    top: &LinCircle,
    config: &SeedFinderConfig,
) -> Option<TripletFit> {
    let i_sin_theta2 = 1.0 + bottom.cot_theta * bottom.cot_theta;
    let sigma2 = config.sigma_scattering * config.sigma_scattering;
    let scattering_in_region2 = config.max_scattering_angle2() * sigma2 * i_sin_theta2;

    let error2 = top.er
        + bottom.er
        + 2.0
            * (bottom.cot_theta * top.cot_theta * middle.var_r() + middle.var_z())
            * bottom.i_delta_r
            * top.i_delta_r;

    let delta_cot = bottom.cot_theta - top.cot_theta;
    let delta_cot2 = delta_cot * delta_cot;
    if delta_cot2 > error2 + scattering_in_region2 {
        return None;
    }

    let delta_u = top.u - bottom.u;
    if delta_u == 0.0 {
        return None;
    }
    let a = (top.v - bottom.v) / delta_u;
    let s2 = 1.0 + a * a;
    let b = bottom.v - a * bottom.u;

    let curvature = 2.0 * b / s2.sqrt();
    if curvature.abs() > config.max_curvature() {
        return None;
    }

    let fit = TripletFit {
        curvature,
        impact: 0.0,
    };
    let seed_pt = fit.pt(config).min(config.max_pt_scattering);
    let scatter = config.highland() / seed_pt;
    let p2_scatter = scatter * scatter * sigma2 * i_sin_theta2;
    if delta_cot2 > error2 + p2_scatter {
        return None;
    }

    let impact = ((a - b * middle.r()) * middle.r()).abs();
    if impact > config.impact_max {
        return None;
    }

    Some(TripletFit { curvature, impact })
}

/// Re-run the triplet test on three spacepoints of an event.
pub fn fit_spacepoints(
    spacepoints: &SpacepointCollection,
    bottom: usize,
    middle: usize,
    top: usize,
    config: &SeedFinderConfig,
) -> Option<TripletFit> {
    let m = &spacepoints[middle];
    let bottom = LinCircle::new(DoubletKind::Bottom, m, &spacepoints[bottom]);
    let top = LinCircle::new(DoubletKind::Top, m, &spacepoints[top]);
    fit_triplet(m, &bottom, &top, config)
}
