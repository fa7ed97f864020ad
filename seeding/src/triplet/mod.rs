//! Triplet finding and scoring.
//!
//! One lane per bottom doublet. A lane combines its bottom doublet with
//! every top doublet of the same middle spacepoint, so the triplets of one
//! middle spacepoint are contiguous in the output.

#[cfg(test)]
mod tests;

mod fit;
mod weight;

pub use fit::{TripletFit, fit_spacepoints, fit_triplet};
pub use weight::{TripletFeatures, count_supporting, passes_single_seed_cut, seed_weight};

use std::ops::Range;

use crate::arena::{Arena, fill_arena};
use crate::config::{SeedFilterConfig, SeedFinderConfig};
use crate::doublet::{Doublet, DoubletCollection};
use crate::error::{Result, Stage};
use crate::executor::Executor;
use crate::spacepoint::SpacepointCollection;

/// Three radius-ordered spacepoints that passed the triplet test.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Triplet {
    pub bottom: usize,
    pub middle: usize,
    pub top: usize,
    /// Index into the bottom doublet arena.
    pub bottom_doublet: usize,
    pub curvature: f64,
    pub impact: f64,
    pub weight: f64,
}

/// Count pass result for one bottom doublet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripletCounter {
    pub bottom_doublet: usize,
    /// Middle lane the bottom doublet belongs to.
    pub middle_lane: usize,
    pub triplets: usize,
}

/// Triplets of one event, one lane per bottom doublet.
#[derive(Debug, Clone)]
pub struct TripletCollection {
    counters: Vec<TripletCounter>,
    triplets: Arena<Triplet>,
    /// `middle_offsets[l]..middle_offsets[l + 1]` are the triplets of
    /// middle lane `l`.
    middle_offsets: Vec<usize>,
}

impl TripletCollection {
    pub fn counters(&self) -> &[TripletCounter] {
        &self.counters
    }

    pub fn triplets(&self) -> &Arena<Triplet> {
        &self.triplets
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triplets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triplets.is_empty()
    }

    #[inline]
    pub fn middle_lanes(&self) -> usize {
        self.middle_offsets.len() - 1
    }

    #[inline]
    pub fn middle_range(&self, lane: usize) -> Range<usize> {
        self.middle_offsets[lane]..self.middle_offsets[lane + 1]
    }

    /// Triplets of one middle lane.
    #[inline]
    pub fn for_middle(&self, lane: usize) -> &[Triplet] {
        &self.triplets.items()[self.middle_range(lane)]
    }
}

/// Combines bottom and top doublets of the same middle spacepoint.
pub struct TripletFinder<'a> {
    spacepoints: &'a SpacepointCollection,
    doublets: &'a DoubletCollection,
    config: &'a SeedFinderConfig,
    /// Middle lane of each bottom doublet.
    middle_lane: Vec<usize>,
}

impl<'a> TripletFinder<'a> {
    pub fn new(
        spacepoints: &'a SpacepointCollection,
        doublets: &'a DoubletCollection,
        config: &'a SeedFinderConfig,
    ) -> Self {
        let bottom = doublets.bottom();
        let middle_lane = (0..bottom.lanes())
            .flat_map(|lane| std::iter::repeat_n(lane, bottom.lane_len(lane)))
            .collect();
        Self {
            spacepoints,
            doublets,
            config,
            middle_lane,
        }
    }

    /// Number of bottom doublet lanes.
    #[inline]
    pub fn lanes(&self) -> usize {
        self.middle_lane.len()
    }

    #[inline]
    pub fn middle_lane_of(&self, bottom_doublet: usize) -> usize {
        self.middle_lane[bottom_doublet]
    }

    /// Call `visit` for every top doublet forming a triplet with the bottom
    /// doublet, in top doublet order.
    pub fn visit_triplets(&self, bottom_doublet: usize, mut visit: impl FnMut(&Doublet, TripletFit)) {
        let bottom = &self.doublets.bottom().items()[bottom_doublet];
        let middle = &self.spacepoints[bottom.middle];
        for top in self.doublets.tops_of(self.middle_lane[bottom_doublet]) {
            if let Some(fit) = fit_triplet(middle, &bottom.circle, &top.circle, self.config) {
                visit(top, fit);
            }
        }
    }

    pub fn count(&self, bottom_doublet: usize) -> usize {
        let mut count = 0;
        self.visit_triplets(bottom_doublet, |_, _| count += 1);
        count
    }
}

/// Count pass: compatible triplets for every bottom doublet.
pub fn count_triplets<E: Executor>(executor: &E, finder: &TripletFinder<'_>) -> Vec<TripletCounter> {
    executor.map(finder.lanes(), |bottom_doublet| TripletCounter {
        bottom_doublet,
        middle_lane: finder.middle_lane_of(bottom_doublet),
        triplets: finder.count(bottom_doublet),
    })
}

/// Fill pass: write the counted triplets with zero weight.
pub fn find_triplets<E: Executor>(
    executor: &E,
    finder: &TripletFinder<'_>,
    counters: Vec<TripletCounter>,
) -> Result<TripletCollection> {
    let counts: Vec<usize> = counters.iter().map(|c| c.triplets).collect();
    let mut triplets = Arena::with_counts(&counts);
    let bottoms = finder.doublets.bottom().items();

    fill_arena(executor, &mut triplets, Stage::Triplets, |bottom_doublet, out| {
        let bottom = &bottoms[bottom_doublet];
        finder.visit_triplets(bottom_doublet, |top, fit| {
            out.push(Triplet {
                bottom: bottom.partner,
                middle: bottom.middle,
                top: top.partner,
                bottom_doublet,
                curvature: fit.curvature,
                impact: fit.impact,
                weight: 0.0,
            });
        });
    })?;

    let middle_offsets = finder
        .doublets
        .bottom()
        .offsets()
        .iter()
        .map(|&first_bottom| triplets.offsets()[first_bottom])
        .collect();

    Ok(TripletCollection {
        counters,
        triplets,
        middle_offsets,
    })
}

/// Weight pass: score every triplet against the others of its bottom
/// doublet.
pub fn weight_triplets<E: Executor>(
    executor: &E,
    spacepoints: &SpacepointCollection,
    collection: &mut TripletCollection,
    finder_config: &SeedFinderConfig,
    filter: &SeedFilterConfig,
) {
    executor.for_each_lane(collection.triplets.lanes_mut(), |_, lane| {
        let tops: Vec<f64> = lane.iter().map(|t| spacepoints[t.top].r()).collect();
        let curvatures: Vec<f64> = lane.iter().map(|t| t.curvature).collect();
        let weights: Vec<f64> = (0..lane.len())
            .map(|i| {
                let features = TripletFeatures {
                    impact_headroom: finder_config.impact_max - lane[i].impact,
                    supporting: count_supporting(i, &tops, &curvatures, filter),
                    bottom_r: spacepoints[lane[i].bottom].r(),
                    top_r: tops[i],
                };
                seed_weight(&features, filter)
            })
            .collect();
        for (triplet, weight) in lane.iter_mut().zip(weights) {
            triplet.weight = weight;
        }
    });
}
