//! Schedule polishing: fuse near-adjacent fragments, stretch short blocks.
//!
//! An optional, separately-invoked repair transform over the allocator's
//! output (plus the locked-block set, which it never alters):
//!
//! - **Merge**: within each date, consecutive same-client blocks whose
//!   gap is at most one grid unit are fused, provided neither block is
//!   locked and the gap itself is free supervisor time.
//! - **Stretch**: blocks shorter than a minimum length are extended
//!   rightward into free time, snapped down to the grid, never crossing
//!   the next block on the date.
//!
//! The pass pair repeats until neither changes anything, which makes
//! `polish` idempotent: applying it twice yields the same schedule as
//! applying it once.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use crate::models::block::{covers, subtract};
use crate::models::{
    sort_blocks, spans_on_date, ScheduleRequest, ScheduledBlock, TimeBlock, MIN_GRID_MIN,
};

/// Default minimum block length the stretch pass aims for (minutes).
pub const DEFAULT_MIN_BLOCK_MIN: i64 = 45;

/// Convergence guard for the merge/stretch fixpoint loop.
const POLISH_GUARD: usize = 64;

/// Fragmentation repair over a placed schedule.
#[derive(Debug, Clone)]
pub struct Polisher {
    grid_min: Option<i64>,
    min_block_min: i64,
}

impl Default for Polisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Polisher {
    /// Creates a polisher with the default minimum block length and the
    /// request's own grid.
    pub fn new() -> Self {
        Self {
            grid_min: None,
            min_block_min: DEFAULT_MIN_BLOCK_MIN,
        }
    }

    /// Overrides the grid (minutes) instead of using the supervisor's.
    pub fn with_grid(mut self, grid_min: i64) -> Self {
        self.grid_min = Some(grid_min);
        self
    }

    /// Sets the minimum block length the stretch pass aims for.
    pub fn with_min_block(mut self, minutes: i64) -> Self {
        self.min_block_min = minutes;
        self
    }

    /// Polishes a schedule. Locked blocks are never moved, fused, or
    /// stretched; their spans stay consumed.
    pub fn polish(
        &self,
        request: &ScheduleRequest,
        blocks: Vec<ScheduledBlock>,
        locked: &HashSet<ScheduledBlock>,
    ) -> Vec<ScheduledBlock> {
        let grid = self
            .grid_min
            .unwrap_or_else(|| request.supervisor.effective_grid())
            .max(MIN_GRID_MIN);

        let mut blocks = blocks;
        sort_blocks(&mut blocks);

        for _ in 0..POLISH_GUARD {
            let merged = merge_pass(request, &mut blocks, locked, grid);
            let stretched = stretch_pass(request, &mut blocks, locked, grid, self.min_block_min);
            if !merged && !stretched {
                break;
            }
        }
        blocks
    }
}

/// Fuses consecutive same-client blocks within a date when the gap is at
/// most one grid unit, neither block is locked, and the gap is free.
fn merge_pass(
    request: &ScheduleRequest,
    blocks: &mut Vec<ScheduledBlock>,
    locked: &HashSet<ScheduledBlock>,
    grid: i64,
) -> bool {
    sort_blocks(blocks);
    let mut changed = false;

    let mut free_cache: Option<(NaiveDate, Vec<TimeBlock>)> = None;
    let mut out: Vec<ScheduledBlock> = Vec::with_capacity(blocks.len());

    for b in blocks.drain(..) {
        let mut fuse = false;
        if let Some(prev) = out.last() {
            if prev.date == b.date
                && prev.client_id == b.client_id
                && b.start_min - prev.end_min <= grid
                && !locked.contains(prev)
                && !locked.contains(&b)
            {
                let gap = TimeBlock::new(prev.end_min, b.start_min);
                if gap.duration_min() == 0 {
                    fuse = true;
                } else {
                    // The fused block will cover the gap, so the gap must
                    // be open supervisor time.
                    if free_cache.as_ref().map(|(d, _)| *d) != Some(b.date) {
                        free_cache = Some((b.date, day_free(request, &out, &b, locked, b.date)));
                    }
                    if let Some((_, free)) = &free_cache {
                        fuse = covers(free, gap);
                    }
                }
            }
        }

        if fuse {
            if let Some(prev) = out.last_mut() {
                prev.end_min = b.end_min;
            }
            free_cache = None; // the fusion consumed part of the day
            changed = true;
        } else {
            out.push(b);
        }
    }

    *blocks = out;
    changed
}

/// Extends unlocked blocks shorter than `min_block` rightward into free
/// time, consuming it incrementally.
fn stretch_pass(
    request: &ScheduleRequest,
    blocks: &mut Vec<ScheduledBlock>,
    locked: &HashSet<ScheduledBlock>,
    grid: i64,
    min_block: i64,
) -> bool {
    sort_blocks(blocks);
    let mut changed = false;

    let mut dates: Vec<NaiveDate> = blocks.iter().map(|b| b.date).collect();
    dates.dedup();

    for date in dates {
        let day_idx: Vec<usize> = blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.date == date)
            .map(|(i, _)| i)
            .collect();

        let base = day_base_free(request, locked, date);
        let mut free = subtract(&base, &spans_on_date(blocks, date));

        for (pos, &i) in day_idx.iter().enumerate() {
            let current = blocks[i].clone();
            if current.duration_min() >= min_block || locked.contains(&current) {
                continue;
            }

            // A free segment that begins at or before the block's end and
            // extends past it.
            let Some(segment) = free
                .iter()
                .find(|s| s.start_min <= current.end_min && s.end_min > current.end_min)
                .copied()
            else {
                continue;
            };

            let needed = min_block - current.duration_min();
            let mut extension = needed.min(segment.end_min - current.end_min);
            if let Some(&next) = day_idx.get(pos + 1) {
                extension = extension.min(blocks[next].start_min - current.end_min);
            }
            extension = extension.div_euclid(grid) * grid;
            if extension < grid {
                continue;
            }

            let consumed = TimeBlock::new(current.end_min, current.end_min + extension);
            blocks[i].end_min += extension;
            free = subtract(&free, &[consumed]);
            changed = true;
        }
    }
    changed
}

/// Supervisor time open on a date ignoring placed blocks: availability
/// minus closures, one-offs, and locked spans.
fn day_base_free(
    request: &ScheduleRequest,
    locked: &HashSet<ScheduledBlock>,
    date: NaiveDate,
) -> Vec<TimeBlock> {
    if request.supervisor.unavailable_days.contains(&date) {
        return Vec::new();
    }

    let mut free = request.supervisor.daily_avail.blocks(date.weekday()).to_vec();
    if let Some(one_offs) = request.supervisor.one_off_unavail.get(&date) {
        free = subtract(&free, one_offs);
    }
    let locked_spans: Vec<TimeBlock> = locked
        .iter()
        .filter(|b| b.date == date)
        .map(ScheduledBlock::span)
        .collect();
    subtract(&free, &locked_spans)
}

/// Free time for a merge's gap check: base free minus every block on the
/// date, drawn from both the already-emitted prefix and the candidate.
fn day_free(
    request: &ScheduleRequest,
    emitted: &[ScheduledBlock],
    candidate: &ScheduledBlock,
    locked: &HashSet<ScheduledBlock>,
    date: NaiveDate,
) -> Vec<TimeBlock> {
    let base = day_base_free(request, locked, date);
    let spans: Vec<TimeBlock> = emitted
        .iter()
        .filter(|b| b.date == date)
        .chain(std::iter::once(candidate))
        .map(ScheduledBlock::span)
        .collect();
    subtract(&base, &spans)
}
