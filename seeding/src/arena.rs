//! Exactly-sized output buffers for the count-then-fill protocol.
//!
//! A stage first counts how many items every lane will produce. The
//! exclusive prefix sum of those counts gives each lane a disjoint slot
//! range in one flat buffer, which the fill pass then writes without any
//! locking or resizing.

use std::ops::Range;

use crate::error::{Result, SeedingError, Stage};
use crate::executor::Executor;

/// Exclusive prefix sum with a trailing total: `offsets[i]..offsets[i + 1]`
/// is the range of lane `i`.
pub fn exclusive_prefix_sum(counts: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    let mut total = 0;
    offsets.push(0);
    for &count in counts {
        total += count;
        offsets.push(total);
    }
    offsets
}

/// Split `items` into the disjoint lane slices described by `offsets`.
pub(crate) fn split_lanes<'a, T>(items: &'a mut [T], offsets: &[usize]) -> Vec<&'a mut [T]> {
    debug_assert_eq!(offsets.last().copied().unwrap_or(0), items.len());
    let mut lanes = Vec::with_capacity(offsets.len().saturating_sub(1));
    let mut rest = items;
    for window in offsets.windows(2) {
        let (lane, tail) = std::mem::take(&mut rest).split_at_mut(window[1] - window[0]);
        lanes.push(lane);
        rest = tail;
    }
    lanes
}

/// Flat buffer partitioned into per-lane slot ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena<T> {
    items: Vec<T>,
    offsets: Vec<usize>,
}

impl<T: Clone + Default> Arena<T> {
    /// Allocate exactly `sum(counts)` default-initialised slots.
    pub fn with_counts(counts: &[usize]) -> Self {
        let offsets = exclusive_prefix_sum(counts);
        let total = offsets.last().copied().unwrap_or(0);
        Self {
            items: vec![T::default(); total],
            offsets,
        }
    }
}

impl<T> Arena<T> {
    #[inline]
    pub fn lanes(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn lane_range(&self, lane: usize) -> Range<usize> {
        self.offsets[lane]..self.offsets[lane + 1]
    }

    #[inline]
    pub fn lane(&self, lane: usize) -> &[T] {
        &self.items[self.lane_range(lane)]
    }

    #[inline]
    pub fn lane_len(&self, lane: usize) -> usize {
        self.offsets[lane + 1] - self.offsets[lane]
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub(crate) fn lanes_mut(&mut self) -> Vec<&mut [T]> {
        split_lanes(&mut self.items, &self.offsets)
    }
}

/// Write cursor over one lane's reserved slots.
///
/// Pushes beyond the reservation are counted but never written, so an
/// inconsistent fill pass is detected instead of corrupting a neighbour.
#[derive(Debug)]
pub struct SlotWriter<'a, T> {
    slots: &'a mut [T],
    attempted: usize,
}

impl<'a, T> SlotWriter<'a, T> {
    pub(crate) fn new(slots: &'a mut [T]) -> Self {
        Self { slots, attempted: 0 }
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        if let Some(slot) = self.slots.get_mut(self.attempted) {
            *slot = value;
        }
        self.attempted += 1;
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of pushes so far, including rejected ones.
    #[inline]
    pub fn attempted(&self) -> usize {
        self.attempted
    }
}

/// Run the fill pass of a stage.
///
/// `fill(lane, writer)` must push exactly as many items as the count pass
/// reserved for `lane`. The first lane (in lane order) that pushes a
/// different number is reported as [`SeedingError::CountMismatch`].
pub fn fill_arena<E, T, F>(executor: &E, arena: &mut Arena<T>, stage: Stage, fill: F) -> Result<()>
where
    E: Executor,
    T: Send,
    F: Fn(usize, &mut SlotWriter<'_, T>) + Sync + Send,
{
    let outcomes = executor.for_each_lane(arena.lanes_mut(), |lane, slots| {
        let mut writer = SlotWriter::new(slots);
        fill(lane, &mut writer);
        (writer.capacity(), writer.attempted())
    });

    match outcomes
        .into_iter()
        .enumerate()
        .find(|(_, (counted, written))| counted != written)
    {
        Some((lane, (counted, written))) => Err(SeedingError::CountMismatch {
            stage,
            lane,
            counted,
            written,
        }),
        None => Ok(()),
    }
}

/// Count pass, prefix sum and fill pass over `lanes` lanes.
///
/// `count` and `fill` must traverse their inputs in the same order.
pub fn count_then_fill<E, T, C, F>(
    executor: &E,
    lanes: usize,
    stage: Stage,
    count: C,
    fill: F,
) -> Result<Arena<T>>
where
    E: Executor,
    T: Clone + Default + Send,
    C: Fn(usize) -> usize + Sync + Send,
    F: Fn(usize, &mut SlotWriter<'_, T>) + Sync + Send,
{
    let counts = executor.map(lanes, count);
    let mut arena = Arena::with_counts(&counts);
    fill_arena(executor, &mut arena, stage, fill)?;
    Ok(arena)
}
