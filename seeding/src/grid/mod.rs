//! Spatial (phi, z) binning of spacepoints for neighbour lookup.
//!
//! The phi axis is closed: the first and the last bin are neighbours. The
//! z axis is bounded: spacepoints beyond `z_min`/`z_max` land in the edge
//! bins. Every spacepoint is stored in exactly one bin, and each bin is
//! sorted by ascending radius (ties by index), so the layout is identical
//! for every executor.

#[cfg(test)]
mod tests;

use std::f64::consts::{PI, TAU};

use crate::arena::{Arena, exclusive_prefix_sum};
use crate::config::GridConfig;
use crate::error::Result;
use crate::executor::Executor;
use crate::spacepoint::SpacepointCollection;

/// Bin index along both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinIndex {
    pub phi: usize,
    pub z: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Axes {
    phi_bins: usize,
    z_bins: usize,
    z_min: f64,
    z_max: f64,
}

impl Axes {
    #[inline]
    fn phi_bin(&self, phi: f64) -> usize {
        let bin = ((phi + PI) / TAU * self.phi_bins as f64).floor() as isize;
        bin.rem_euclid(self.phi_bins as isize) as usize
    }

    #[inline]
    fn z_bin(&self, z: f64) -> usize {
        let bin = ((z - self.z_min) / (self.z_max - self.z_min) * self.z_bins as f64).floor();
        (bin.max(0.0) as usize).min(self.z_bins - 1)
    }

    #[inline]
    fn global(&self, bin: BinIndex) -> usize {
        bin.phi * self.z_bins + bin.z
    }
}

/// Immutable per-event spacepoint grid.
///
/// Storage is one flat index buffer with one lane per bin, bins ordered
/// phi-major.
#[derive(Debug, Clone)]
pub struct SpacepointGrid {
    axes: Axes,
    bins: Arena<usize>,
}

impl SpacepointGrid {
    /// Bin every spacepoint of the event.
    pub fn build<E: Executor>(
        executor: &E,
        spacepoints: &SpacepointCollection,
        config: &GridConfig,
    ) -> Result<Self> {
        config.validate()?;
        let axes = Axes {
            phi_bins: config.phi_bins,
            z_bins: config.z_bins,
            z_min: config.z_min,
            z_max: config.z_max,
        };
        let n_bins = axes.phi_bins * axes.z_bins;

        let bin_of_point = executor.map(spacepoints.len(), |i| {
            let sp = &spacepoints[i];
            axes.global(BinIndex {
                phi: axes.phi_bin(sp.phi()),
                z: axes.z_bin(sp.z()),
            })
        });

        let mut counts = vec![0usize; n_bins];
        for &bin in &bin_of_point {
            counts[bin] += 1;
        }

        // Counting sort keeps insertion order stable before the radius sort.
        let mut bins = Arena::with_counts(&counts);
        let mut cursor = exclusive_prefix_sum(&counts);
        let items = bins.items_mut();
        for (index, &bin) in bin_of_point.iter().enumerate() {
            items[cursor[bin]] = index;
            cursor[bin] += 1;
        }

        executor.for_each_lane(bins.lanes_mut(), |_, bin| {
            bin.sort_by(|&a, &b| {
                spacepoints[a]
                    .r()
                    .total_cmp(&spacepoints[b].r())
                    .then(a.cmp(&b))
            });
        });

        tracing::trace!(
            spacepoints = spacepoints.len(),
            phi_bins = axes.phi_bins,
            z_bins = axes.z_bins,
            "spacepoint grid built"
        );

        Ok(Self { axes, bins })
    }

    #[inline]
    pub fn phi_bins(&self) -> usize {
        self.axes.phi_bins
    }

    #[inline]
    pub fn z_bins(&self) -> usize {
        self.axes.z_bins
    }

    /// Whether the grid was binned with `config`.
    pub fn matches(&self, config: &GridConfig) -> bool {
        self.axes.phi_bins == config.phi_bins
            && self.axes.z_bins == config.z_bins
            && self.axes.z_min == config.z_min
            && self.axes.z_max == config.z_max
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.bins.lanes()
    }

    /// Number of spacepoints stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bin a position would be stored in.
    #[inline]
    pub fn bin_of(&self, phi: f64, z: f64) -> BinIndex {
        BinIndex {
            phi: self.axes.phi_bin(phi),
            z: self.axes.z_bin(z),
        }
    }

    #[inline]
    pub fn global_bin(&self, bin: BinIndex) -> usize {
        self.axes.global(bin)
    }

    /// Spacepoint indices in one bin, by ascending radius.
    #[inline]
    pub fn bin(&self, bin: BinIndex) -> &[usize] {
        self.bins.lane(self.axes.global(bin))
    }

    /// All spacepoint indices in grid order (bin by bin).
    #[inline]
    pub fn ordered_spacepoints(&self) -> &[usize] {
        self.bins.items()
    }

    /// Global indices of the bins within `phi_radius`/`z_radius` of `center`.
    ///
    /// Order is phi-major starting from the lowest offset. Phi wraps around;
    /// when the window covers the whole circle every phi bin appears once.
    pub fn neighbor_bins(&self, center: BinIndex, phi_radius: usize, z_radius: usize) -> Vec<usize> {
        let phi_bins = self.axes.phi_bins;
        let phis: Vec<usize> = if phi_radius.saturating_mul(2).saturating_add(1) >= phi_bins {
            (0..phi_bins).collect()
        } else {
            (0..=2 * phi_radius)
                .map(|k| (center.phi + phi_bins + k - phi_radius) % phi_bins)
                .collect()
        };
        let z_lo = center.z.saturating_sub(z_radius);
        let z_hi = center.z.saturating_add(z_radius).min(self.axes.z_bins - 1);

        phis.into_iter()
            .flat_map(|phi| (z_lo..=z_hi).map(move |z| BinIndex { phi, z }))
            .map(|bin| self.axes.global(bin))
            .collect()
    }

    /// Spacepoint indices of every bin in the neighbourhood, bin by bin.
    pub fn neighborhood(
        &self,
        center: BinIndex,
        phi_radius: usize,
        z_radius: usize,
    ) -> impl Iterator<Item = usize> + '_ {
        self.neighbor_bins(center, phi_radius, z_radius)
            .into_iter()
            .flat_map(move |bin| self.bins.lane(bin).iter().copied())
    }

    /// Neighbour bin lists for every bin, one lane per bin.
    pub fn neighbor_table(&self, phi_radius: usize, z_radius: usize) -> Arena<usize> {
        let lists: Vec<Vec<usize>> = (0..self.num_bins())
            .map(|global| {
                let center = BinIndex {
                    phi: global / self.axes.z_bins,
                    z: global % self.axes.z_bins,
                };
                self.neighbor_bins(center, phi_radius, z_radius)
            })
            .collect();

        let counts: Vec<usize> = lists.iter().map(Vec::len).collect();
        let mut table = Arena::with_counts(&counts);
        for (slots, list) in table.lanes_mut().into_iter().zip(&lists) {
            slots.copy_from_slice(list);
        }
        table
    }

    /// Spacepoints stored in a global bin.
    #[inline]
    pub(crate) fn bin_contents(&self, global: usize) -> &[usize] {
        self.bins.lane(global)
    }
}
