//! Minute-granularity time blocks and interval arithmetic.
//!
//! The whole engine works in minutes since midnight; a block never
//! crosses a day boundary (`0 <= start < end <= 1440`).
//!
//! # Conventions
//!
//! Blocks are half-open intervals `[start, end)`. A *set* of blocks is a
//! `Vec<TimeBlock>` kept sorted ascending by start and pairwise
//! non-overlapping. `intersect` emits raw pairwise overlaps without
//! re-sorting; consumers sort or filter as needed. `subtract` always
//! returns a sorted remainder.

use serde::{Deserialize, Serialize};

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: i64 = 1440;

/// A contiguous time interval within one day, minutes since midnight.
///
/// Half-open: includes `start_min`, excludes `end_min`. Immutable value
/// type with structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBlock {
    /// Interval start (minutes, inclusive).
    pub start_min: i64,
    /// Interval end (minutes, exclusive).
    pub end_min: i64,
}

impl TimeBlock {
    /// Creates a new time block.
    pub fn new(start_min: i64, end_min: i64) -> Self {
        Self { start_min, end_min }
    }

    /// Duration of this block (minutes).
    #[inline]
    pub fn duration_min(&self) -> i64 {
        self.end_min - self.start_min
    }

    /// Whether a minute-of-day falls within this block.
    #[inline]
    pub fn contains(&self, minute: i64) -> bool {
        minute >= self.start_min && minute < self.end_min
    }

    /// Whether two blocks overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_min < other.end_min && other.start_min < self.end_min
    }

    /// Whether this block is well-formed: `0 <= start < end <= 1440`.
    pub fn is_well_formed(&self) -> bool {
        0 <= self.start_min && self.start_min < self.end_min && self.end_min <= MINUTES_PER_DAY
    }

    /// Aligns this block to a rounding grid: start rounds up to the next
    /// multiple of `grid_min`, end rounds down to the previous one.
    ///
    /// Returns `None` when rounding collapses the block to zero or
    /// negative length, so callers can `filter_map` collapsed blocks away.
    pub fn snap_to_grid(&self, grid_min: i64) -> Option<TimeBlock> {
        let grid = grid_min.max(1);
        let start = (self.start_min + grid - 1).div_euclid(grid) * grid;
        let end = self.end_min.div_euclid(grid) * grid;
        if end > start {
            Some(TimeBlock::new(start, end))
        } else {
            None
        }
    }
}

/// Pairwise intersection of two block sets.
///
/// Emits `[max(starts), min(ends))` for every overlapping pair. Output
/// order follows the input pair order and is not re-sorted.
pub fn intersect(a: &[TimeBlock], b: &[TimeBlock]) -> Vec<TimeBlock> {
    let mut out = Vec::new();
    for x in a {
        for y in b {
            let start = x.start_min.max(y.start_min);
            let end = x.end_min.min(y.end_min);
            if end > start {
                out.push(TimeBlock::new(start, end));
            }
        }
    }
    out
}

/// Removes `minus` from `base`, splitting base blocks around each removed
/// span.
///
/// Subtraction is sequential: each `minus` block operates on the updated
/// remainder, so overlapping `minus` entries need not be merged first.
/// The remainder is re-sorted by start ascending.
pub fn subtract(base: &[TimeBlock], minus: &[TimeBlock]) -> Vec<TimeBlock> {
    let mut rest = base.to_vec();
    for m in minus {
        let mut next = Vec::with_capacity(rest.len() + 1);
        for b in rest {
            if !b.overlaps(m) {
                next.push(b);
                continue;
            }
            if b.start_min < m.start_min {
                next.push(TimeBlock::new(b.start_min, m.start_min));
            }
            if m.end_min < b.end_min {
                next.push(TimeBlock::new(m.end_min, b.end_min));
            }
        }
        rest = next;
    }
    rest.sort_by_key(|b| b.start_min);
    rest
}

/// Total minutes covered by a block set.
///
/// Assumes the set is non-overlapping (the invariant all sets maintain).
pub fn total_minutes(blocks: &[TimeBlock]) -> i64 {
    blocks.iter().map(TimeBlock::duration_min).sum()
}

/// Fuses exactly-adjacent blocks (`end == next.start`) in a sorted set.
pub fn merge_adjacent(blocks: &[TimeBlock]) -> Vec<TimeBlock> {
    let mut sorted = blocks.to_vec();
    sorted.sort_by_key(|b| b.start_min);

    let mut out: Vec<TimeBlock> = Vec::with_capacity(sorted.len());
    for b in sorted {
        match out.last_mut() {
            Some(prev) if prev.end_min == b.start_min => prev.end_min = b.end_min,
            _ => out.push(b),
        }
    }
    out
}

/// Whether `span` lies entirely within the coverage of a block set.
///
/// Adjacent blocks are fused first, so a span straddling two touching
/// blocks still counts as covered.
pub fn covers(blocks: &[TimeBlock], span: TimeBlock) -> bool {
    merge_adjacent(blocks)
        .iter()
        .any(|b| b.start_min <= span.start_min && span.end_min <= b.end_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_basics() {
        let b = TimeBlock::new(540, 660);
        assert_eq!(b.duration_min(), 120);
        assert!(b.contains(540));
        assert!(b.contains(659));
        assert!(!b.contains(660)); // exclusive end
        assert!(!b.contains(500));
        assert!(b.is_well_formed());
        assert!(!TimeBlock::new(660, 540).is_well_formed());
        assert!(!TimeBlock::new(-10, 30).is_well_formed());
        assert!(!TimeBlock::new(1400, 1500).is_well_formed());
    }

    #[test]
    fn test_overlaps() {
        let a = TimeBlock::new(0, 100);
        let b = TimeBlock::new(50, 150);
        let c = TimeBlock::new(100, 200); // touching, not overlapping
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_intersect_pairwise() {
        let a = vec![TimeBlock::new(540, 660), TimeBlock::new(720, 780)];
        let b = vec![TimeBlock::new(600, 750)];
        let out = intersect(&a, &b);
        assert_eq!(
            out,
            vec![TimeBlock::new(600, 660), TimeBlock::new(720, 750)]
        );
    }

    #[test]
    fn test_intersect_disjoint() {
        let a = vec![TimeBlock::new(0, 60)];
        let b = vec![TimeBlock::new(120, 180)];
        assert!(intersect(&a, &b).is_empty());
    }

    #[test]
    fn test_subtract_splits_around_hole() {
        let base = vec![TimeBlock::new(540, 720)];
        let minus = vec![TimeBlock::new(600, 630)];
        let out = subtract(&base, &minus);
        assert_eq!(
            out,
            vec![TimeBlock::new(540, 600), TimeBlock::new(630, 720)]
        );
    }

    #[test]
    fn test_subtract_sequential() {
        // Two overlapping minus blocks; each applies to the updated remainder.
        let base = vec![TimeBlock::new(0, 200)];
        let minus = vec![TimeBlock::new(50, 120), TimeBlock::new(100, 150)];
        let out = subtract(&base, &minus);
        assert_eq!(out, vec![TimeBlock::new(0, 50), TimeBlock::new(150, 200)]);
    }

    #[test]
    fn test_subtract_swallows_base() {
        let base = vec![TimeBlock::new(60, 120)];
        let minus = vec![TimeBlock::new(0, 300)];
        assert!(subtract(&base, &minus).is_empty());
    }

    #[test]
    fn test_subtract_result_sorted() {
        let base = vec![TimeBlock::new(600, 700), TimeBlock::new(100, 200)];
        let out = subtract(&base, &[]);
        assert_eq!(out[0].start_min, 100);
        assert_eq!(out[1].start_min, 600);
    }

    #[test]
    fn test_snap_to_grid() {
        let b = TimeBlock::new(547, 663);
        assert_eq!(b.snap_to_grid(15), Some(TimeBlock::new(555, 660)));

        // Already aligned: unchanged.
        let b = TimeBlock::new(540, 660);
        assert_eq!(b.snap_to_grid(15), Some(b));
    }

    #[test]
    fn test_snap_collapses_small_block() {
        // [547, 553) rounds to [555, 540) → collapsed.
        assert_eq!(TimeBlock::new(547, 553).snap_to_grid(15), None);
        // Exactly one grid unit survives.
        assert_eq!(
            TimeBlock::new(540, 555).snap_to_grid(15),
            Some(TimeBlock::new(540, 555))
        );
    }

    #[test]
    fn test_total_minutes() {
        let set = vec![TimeBlock::new(0, 60), TimeBlock::new(120, 150)];
        assert_eq!(total_minutes(&set), 90);
        assert_eq!(total_minutes(&[]), 0);
    }

    #[test]
    fn test_merge_adjacent() {
        let set = vec![
            TimeBlock::new(120, 180),
            TimeBlock::new(0, 60),
            TimeBlock::new(60, 120),
        ];
        assert_eq!(merge_adjacent(&set), vec![TimeBlock::new(0, 180)]);

        let gapped = vec![TimeBlock::new(0, 60), TimeBlock::new(90, 120)];
        assert_eq!(merge_adjacent(&gapped), gapped);
    }

    #[test]
    fn test_covers() {
        let set = vec![TimeBlock::new(540, 600), TimeBlock::new(600, 660)];
        // Straddles the touching boundary.
        assert!(covers(&set, TimeBlock::new(570, 630)));
        assert!(!covers(&set, TimeBlock::new(570, 700)));
        assert!(!covers(&[], TimeBlock::new(0, 1)));
    }
}
