use crate::config::SeedFinderConfig;
use crate::spacepoint::Spacepoint;

/// Which side of the middle spacepoint a partner lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubletKind {
    /// Partner at smaller radius.
    Bottom,
    /// Partner at larger radius.
    Top,
}

/// Partner coordinates linearised around the middle spacepoint.
///
/// The frame is centred on the middle spacepoint with its x axis along the
/// middle's radial direction. In the conformal plane `(u, v)` a circle
/// through the middle spacepoint becomes a straight line, so the triplet
/// test reduces to a line fit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinCircle {
    /// Beam-axis intercept of the straight line through both spacepoints.
    pub z_origin: f64,
    /// Slope dz / ds, signed so that both kinds point outward.
    pub cot_theta: f64,
    /// Inverse transverse distance between the spacepoints.
    pub i_delta_r: f64,
    /// Squared cotTheta uncertainty from the position variances.
    pub er: f64,
    pub u: f64,
    pub v: f64,
}

impl LinCircle {
    pub fn new(kind: DoubletKind, middle: &Spacepoint, partner: &Spacepoint) -> Self {
        let cos_phi = middle.x() / middle.r();
        let sin_phi = middle.y() / middle.r();

        let delta_x = partner.x() - middle.x();
        let delta_y = partner.y() - middle.y();
        let delta_z = partner.z() - middle.z();

        let x = delta_x * cos_phi + delta_y * sin_phi;
        let y = delta_y * cos_phi - delta_x * sin_phi;

        let i_delta_r2 = 1.0 / (delta_x * delta_x + delta_y * delta_y);
        let i_delta_r = i_delta_r2.sqrt();

        let direction = match kind {
            DoubletKind::Bottom => -1.0,
            DoubletKind::Top => 1.0,
        };
        let cot_theta = delta_z * i_delta_r * direction;

        let er = ((middle.var_z() + partner.var_z())
            + cot_theta * cot_theta * (middle.var_r() + partner.var_r()))
            * i_delta_r2;

        Self {
            z_origin: middle.z() - middle.r() * cot_theta,
            cot_theta,
            i_delta_r,
            er,
            u: x * i_delta_r2,
            v: y * i_delta_r2,
        }
    }
}

/// Radial, slope and z-origin windows for a middle/partner pair.
pub fn is_compatible(
    kind: DoubletKind,
    middle: &Spacepoint,
    partner: &Spacepoint,
    config: &SeedFinderConfig,
) -> bool {
    let (delta_r, delta_z) = match kind {
        DoubletKind::Bottom => (middle.r() - partner.r(), middle.z() - partner.z()),
        DoubletKind::Top => (partner.r() - middle.r(), partner.z() - middle.z()),
    };
    if delta_r < config.delta_r_min || delta_r > config.delta_r_max {
        return false;
    }

    let cot_theta = delta_z / delta_r;
    if cot_theta.abs() > config.cot_theta_max {
        return false;
    }

    let z_origin = middle.z() - middle.r() * cot_theta;
    z_origin >= config.collision_region_min && z_origin <= config.collision_region_max
}
