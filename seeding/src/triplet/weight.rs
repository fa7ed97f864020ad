use crate::config::SeedFilterConfig;

/// Inputs of the seed quality score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripletFeatures {
    /// `impact_max - impact`, never negative for an accepted triplet.
    pub impact_headroom: f64,
    /// Compatible triplets sharing the bottom doublet.
    pub supporting: usize,
    pub bottom_r: f64,
    pub top_r: f64,
}

/// Quality score of a triplet. Higher is better.
///
/// Monotone in both the impact headroom and the number of supporting
/// triplets.
pub fn seed_weight(features: &TripletFeatures, filter: &SeedFilterConfig) -> f64 {
    let mut weight = filter.impact_weight_factor * features.impact_headroom
        + filter.compat_seed_weight * features.supporting as f64;

    if let Some(cuts) = &filter.radius_quality {
        if features.bottom_r > cuts.good_bottom_min_radius {
            weight += cuts.good_bottom_weight_increase;
        }
        if features.top_r < cuts.good_top_max_radius {
            weight += cuts.good_top_weight_increase;
        }
    }
    weight
}

/// Whether a triplet may stand on its own as a seed.
///
/// Triplets starting beyond `single_seed_bottom_radius` need at least
/// `single_seed_min_weight`. Always true without radius quality cuts.
pub fn passes_single_seed_cut(bottom_r: f64, weight: f64, filter: &SeedFilterConfig) -> bool {
    match &filter.radius_quality {
        Some(cuts) => {
            bottom_r <= cuts.single_seed_bottom_radius || weight >= cuts.single_seed_min_weight
        }
        None => true,
    }
}

/// Number of triplets supporting `candidate` among triplets sharing its
/// bottom doublet.
///
/// `tops[i]` is the top radius and `curvatures[i]` the curvature of triplet
/// `i`. A supporter has a top at least `delta_r_min` away from the
/// candidate's top and from every supporter counted before it, and a helix
/// diameter compatible within `delta_inv_helix_diameter`.
pub fn count_supporting(
    candidate: usize,
    tops: &[f64],
    curvatures: &[f64],
    filter: &SeedFilterConfig,
) -> usize {
    let top_r = tops[candidate];
    let curvature = curvatures[candidate];
    let mut counted: Vec<f64> = Vec::with_capacity(filter.compat_seed_limit);

    for (j, (&other_r, &other_curvature)) in tops.iter().zip(curvatures).enumerate() {
        if counted.len() >= filter.compat_seed_limit {
            break;
        }
        if j == candidate || (other_r - top_r).abs() < filter.delta_r_min {
            continue;
        }
        if 0.5 * (other_curvature - curvature).abs() > filter.delta_inv_helix_diameter {
            continue;
        }
        if counted
            .iter()
            .any(|&r| (r - other_r).abs() < filter.delta_r_min)
        {
            continue;
        }
        counted.push(other_r);
    }
    counted.len()
}
