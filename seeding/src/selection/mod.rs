//! Seed selection per middle spacepoint.
//!
//! Triplets of one middle lane are filtered by weight, ranked, cleaned of
//! duplicates and capped. Ranking uses only total orders on the triplet
//! fields, so the outcome does not depend on the executor.


use std::cmp::Ordering;

use crate::arena::{Arena, count_then_fill};
use crate::config::SeedFilterConfig;
use crate::error::{Result, Stage};
use crate::executor::Executor;
use crate::spacepoint::{MeasurementId, SpacepointCollection};
use crate::triplet::{Triplet, TripletCollection, passes_single_seed_cut};

/// A selected triplet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Seed {
    pub bottom: usize,
    pub middle: usize,
    pub top: usize,
    pub weight: f64,
}

impl Seed {
    /// Spacepoint indices, by ascending radius.
    #[inline]
    pub fn spacepoints(&self) -> [usize; 3] {
        [self.bottom, self.middle, self.top]
    }

    /// Measurement ids behind all three spacepoints.
    pub fn measurements(&self, spacepoints: &SpacepointCollection) -> Vec<MeasurementId> {
        self.spacepoints()
            .iter()
            .flat_map(|&index| spacepoints.measurements(index).iter().copied())
            .collect()
    }
}

impl From<&Triplet> for Seed {
    fn from(triplet: &Triplet) -> Self {
        Self {
            bottom: triplet.bottom,
            middle: triplet.middle,
            top: triplet.top,
            weight: triplet.weight,
        }
    }
}

/// Weight descending, then impact ascending, then bottom and top index.
pub fn compare_rank(a: &Triplet, b: &Triplet) -> Ordering {
    b.weight
        .total_cmp(&a.weight)
        .then(a.impact.total_cmp(&b.impact))
        .then(a.bottom.cmp(&b.bottom))
        .then(a.top.cmp(&b.top))
}

#[inline]
fn same_spacepoint(spacepoints: &SpacepointCollection, a: usize, b: usize, tolerance: f64) -> bool {
    a == b || spacepoints[a].position().distance(spacepoints[b].position()) <= tolerance
}

/// Whether `candidate` repeats `kept`: both bottoms and both tops within
/// `tolerance` of each other.
pub fn is_duplicate(
    spacepoints: &SpacepointCollection,
    kept: &Triplet,
    candidate: &Triplet,
    tolerance: f64,
) -> bool {
    same_spacepoint(spacepoints, kept.bottom, candidate.bottom, tolerance)
        && same_spacepoint(spacepoints, kept.top, candidate.top, tolerance)
}

/// Triplets of one middle lane that become seeds, best first.
pub fn rank_group(
    spacepoints: &SpacepointCollection,
    group: &[Triplet],
    filter: &SeedFilterConfig,
) -> Vec<Triplet> {
    let mut candidates: Vec<&Triplet> = group
        .iter()
        .filter(|t| t.weight >= filter.min_weight)
        .filter(|t| passes_single_seed_cut(spacepoints[t.bottom].r(), t.weight, filter))
        .collect();
    candidates.sort_by(|a, b| compare_rank(a, b));

    let mut kept: Vec<Triplet> = Vec::with_capacity(filter.max_seeds_per_middle.min(candidates.len()));
    for candidate in candidates {
        if kept.len() == filter.max_seeds_per_middle {
            break;
        }
        if kept
            .iter()
            .any(|k| is_duplicate(spacepoints, k, candidate, filter.duplicate_tolerance))
        {
            continue;
        }
        kept.push(*candidate);
    }
    kept
}

/// Select seeds for every middle lane, one arena lane per middle.
pub fn select_seeds<E: Executor>(
    executor: &E,
    spacepoints: &SpacepointCollection,
    triplets: &TripletCollection,
    filter: &SeedFilterConfig,
) -> Result<Arena<Seed>> {
    count_then_fill(
        executor,
        triplets.middle_lanes(),
        Stage::Seeds,
        |lane| rank_group(spacepoints, triplets.for_middle(lane), filter).len(),
        |lane, out| {
            for triplet in rank_group(spacepoints, triplets.for_middle(lane), filter) {
                out.push(Seed::from(&triplet));
            }
        },
    )
}
