//! Doublet finding: compatible (middle, partner) pairs per middle spacepoint.
//!
//! One lane per middle spacepoint in grid order. The count pass records how
//! many bottom and top partners each middle has; the fill passes write the
//! doublets into exactly sized arenas. Both passes walk the neighbour bins
//! in the same order, so a lane's fill must reproduce its count.


mod geometry;

pub use geometry::{DoubletKind, LinCircle, is_compatible};

use crate::arena::{Arena, fill_arena};
use crate::config::SeedFinderConfig;
use crate::error::{Result, Stage};
use crate::executor::Executor;
use crate::grid::SpacepointGrid;
use crate::spacepoint::SpacepointCollection;

/// A compatible pair of spacepoints.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Doublet {
    pub middle: usize,
    pub partner: usize,
    pub circle: LinCircle,
}

/// Count pass result for one middle lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubletCounter {
    /// Spacepoint index of the middle.
    pub middle: usize,
    pub bottoms: usize,
    pub tops: usize,
}

/// Bottom and top doublets of one event, one lane per middle spacepoint.
#[derive(Debug, Clone)]
pub struct DoubletCollection {
    counters: Vec<DoubletCounter>,
    bottom: Arena<Doublet>,
    top: Arena<Doublet>,
}

impl DoubletCollection {
    #[inline]
    pub fn lanes(&self) -> usize {
        self.counters.len()
    }

    pub fn counters(&self) -> &[DoubletCounter] {
        &self.counters
    }

    pub fn bottom(&self) -> &Arena<Doublet> {
        &self.bottom
    }

    pub fn top(&self) -> &Arena<Doublet> {
        &self.top
    }

    #[inline]
    pub fn bottoms_of(&self, lane: usize) -> &[Doublet] {
        self.bottom.lane(lane)
    }

    #[inline]
    pub fn tops_of(&self, lane: usize) -> &[Doublet] {
        self.top.lane(lane)
    }

    pub fn num_bottom(&self) -> usize {
        self.bottom.len()
    }

    pub fn num_top(&self) -> usize {
        self.top.len()
    }
}

/// Neighbour search for doublets over one grid.
pub struct DoubletFinder<'a> {
    spacepoints: &'a SpacepointCollection,
    grid: &'a SpacepointGrid,
    config: &'a SeedFinderConfig,
    neighbors: Arena<usize>,
}

impl<'a> DoubletFinder<'a> {
    pub fn new(
        spacepoints: &'a SpacepointCollection,
        grid: &'a SpacepointGrid,
        config: &'a SeedFinderConfig,
    ) -> Self {
        Self {
            spacepoints,
            grid,
            config,
            neighbors: grid.neighbor_table(config.phi_neighbors, config.z_neighbors),
        }
    }

    /// Number of middle lanes.
    #[inline]
    pub fn lanes(&self) -> usize {
        self.grid.ordered_spacepoints().len()
    }

    /// Spacepoint index of the middle of `lane`.
    #[inline]
    pub fn middle_of(&self, lane: usize) -> usize {
        self.grid.ordered_spacepoints()[lane]
    }

    /// Call `visit` for every compatible partner of the lane's middle, in
    /// neighbour-bin order and by ascending radius within a bin.
    pub fn visit_partners(&self, lane: usize, kind: DoubletKind, mut visit: impl FnMut(usize)) {
        let middle = self.middle_of(lane);
        let sp = &self.spacepoints[middle];
        let center = self.grid.global_bin(self.grid.bin_of(sp.phi(), sp.z()));

        for &bin in self.neighbors.lane(center) {
            for &partner in self.grid.bin_contents(bin) {
                if partner != middle
                    && is_compatible(kind, sp, &self.spacepoints[partner], self.config)
                {
                    visit(partner);
                }
            }
        }
    }

    pub fn count_partners(&self, lane: usize, kind: DoubletKind) -> usize {
        let mut count = 0;
        self.visit_partners(lane, kind, |_| count += 1);
        count
    }

    pub fn doublet(&self, kind: DoubletKind, middle: usize, partner: usize) -> Doublet {
        Doublet {
            middle,
            partner,
            circle: LinCircle::new(kind, &self.spacepoints[middle], &self.spacepoints[partner]),
        }
    }
}

/// Count pass: compatible bottom and top partners for every middle lane.
pub fn count_doublets<E: Executor>(executor: &E, finder: &DoubletFinder<'_>) -> Vec<DoubletCounter> {
    executor.map(finder.lanes(), |lane| DoubletCounter {
        middle: finder.middle_of(lane),
        bottoms: finder.count_partners(lane, DoubletKind::Bottom),
        tops: finder.count_partners(lane, DoubletKind::Top),
    })
}

/// Fill passes: write the doublets counted in `counters` into exactly sized
/// arenas.
pub fn find_doublets<E: Executor>(
    executor: &E,
    finder: &DoubletFinder<'_>,
    counters: Vec<DoubletCounter>,
) -> Result<DoubletCollection> {
    let bottom_counts: Vec<usize> = counters.iter().map(|c| c.bottoms).collect();
    let top_counts: Vec<usize> = counters.iter().map(|c| c.tops).collect();

    let mut bottom = Arena::with_counts(&bottom_counts);
    fill_arena(executor, &mut bottom, Stage::BottomDoublets, |lane, out| {
        let middle = finder.middle_of(lane);
        finder.visit_partners(lane, DoubletKind::Bottom, |partner| {
            out.push(finder.doublet(DoubletKind::Bottom, middle, partner));
        });
    })?;

    let mut top = Arena::with_counts(&top_counts);
    fill_arena(executor, &mut top, Stage::TopDoublets, |lane, out| {
        let middle = finder.middle_of(lane);
        finder.visit_partners(lane, DoubletKind::Top, |partner| {
            out.push(finder.doublet(DoubletKind::Top, middle, partner));
        });
    })?;

    tracing::trace!(
        middles = counters.len(),
        bottom = bottom.len(),
        top = top.len(),
        "doublets found"
    );

    Ok(DoubletCollection {
        counters,
        bottom,
        top,
    })
}
