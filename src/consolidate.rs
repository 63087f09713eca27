//! Short-session consolidation.
//!
//! The greedy walk can leave a client with several sub-hour fragments on
//! the same date. This pass merges the two shortest fragments of each
//! `(client, date)` group into one block of their combined length when a
//! free window can host it, then normalizes the whole list (sort, fuse
//! exact-adjacent same-client blocks). Total scheduled minutes per client
//! are preserved; only fragmentation changes.
//!
//! Runs up to two passes and stops early when a pass changes nothing; the
//! allocator invokes it on every run's output before returning.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::models::block::{covers, merge_adjacent, subtract};
use crate::models::{sort_blocks, ScheduleRequest, ScheduledBlock, TimeBlock};

const SHORT_SESSION_MIN: i64 = 60;
const MAX_PASSES: usize = 2;

/// Merges sub-hour fragments and normalizes the block list.
///
/// `closed_days` and `one_offs` are the run's merged exception view; the
/// locked set is treated as immovable consumed time.
pub(crate) fn consolidate(
    request: &ScheduleRequest,
    mut blocks: Vec<ScheduledBlock>,
    locked: &HashSet<ScheduledBlock>,
    closed_days: &HashSet<NaiveDate>,
    one_offs: &HashMap<NaiveDate, Vec<TimeBlock>>,
) -> Vec<ScheduledBlock> {
    let grid = request.supervisor.effective_grid();

    for _ in 0..MAX_PASSES {
        let mut changed = false;

        let mut keys: Vec<(String, NaiveDate)> = blocks
            .iter()
            .map(|b| (b.client_id.clone(), b.date))
            .collect();
        keys.sort();
        keys.dedup();

        for (client_id, date) in keys {
            let short_idx: Vec<usize> = blocks
                .iter()
                .enumerate()
                .filter(|(_, b)| {
                    b.client_id == client_id
                        && b.date == date
                        && b.duration_min() < SHORT_SESSION_MIN
                })
                .map(|(i, _)| i)
                .collect();
            if short_idx.len() < 2 {
                continue;
            }

            // The two shortest fragments of the group.
            let mut by_len = short_idx;
            by_len.sort_by_key(|&i| (blocks[i].duration_min(), blocks[i].start_min));
            let (ia, ib) = (by_len[0], by_len[1]);
            let combined = blocks[ia].duration_min() + blocks[ib].duration_min();

            let free = free_around_pair(request, &blocks, date, ia, ib, locked, closed_days, one_offs);

            // First choice: collapse onto the earlier fragment's start.
            let outer_start = blocks[ia].start_min.min(blocks[ib].start_min);
            let collapsed = TimeBlock::new(outer_start, outer_start + combined);
            let merged = if covers(&free, collapsed) {
                Some(collapsed)
            } else {
                // Otherwise any free window large enough, start snapped up
                // to the grid.
                free.iter().find_map(|w| {
                    let start = (w.start_min + grid - 1).div_euclid(grid) * grid;
                    (start + combined <= w.end_min)
                        .then(|| TimeBlock::new(start, start + combined))
                })
            };

            if let Some(span) = merged {
                let (hi, lo) = if ia > ib { (ia, ib) } else { (ib, ia) };
                blocks.remove(hi);
                blocks.remove(lo);
                blocks.push(ScheduledBlock::new(
                    date,
                    client_id.clone(),
                    span.start_min,
                    span.end_min,
                ));
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    normalize(blocks)
}

/// Free time on a date as seen by a merge: supervisor availability minus
/// exceptions, locked spans, and every block except the pair being
/// re-placed (their own spans count as free).
#[allow(clippy::too_many_arguments)]
fn free_around_pair(
    request: &ScheduleRequest,
    blocks: &[ScheduledBlock],
    date: NaiveDate,
    ia: usize,
    ib: usize,
    locked: &HashSet<ScheduledBlock>,
    closed_days: &HashSet<NaiveDate>,
    one_offs: &HashMap<NaiveDate, Vec<TimeBlock>>,
) -> Vec<TimeBlock> {
    if closed_days.contains(&date) {
        return Vec::new();
    }

    let mut free = request.supervisor.daily_avail.blocks(date.weekday()).to_vec();
    if let Some(excluded) = one_offs.get(&date) {
        free = subtract(&free, excluded);
    }

    let locked_spans: Vec<TimeBlock> = locked
        .iter()
        .filter(|b| b.date == date)
        .map(ScheduledBlock::span)
        .collect();
    free = subtract(&free, &locked_spans);

    let occupied: Vec<TimeBlock> = blocks
        .iter()
        .enumerate()
        .filter(|(i, b)| b.date == date && *i != ia && *i != ib)
        .map(|(_, b)| b.span())
        .collect();
    merge_adjacent(&subtract(&free, &occupied))
}

/// Canonical output order plus fusing of exact-adjacent same-client
/// same-date blocks.
fn normalize(mut blocks: Vec<ScheduledBlock>) -> Vec<ScheduledBlock> {
    sort_blocks(&mut blocks);

    let mut out: Vec<ScheduledBlock> = Vec::with_capacity(blocks.len());
    for b in blocks {
        match out.last_mut() {
            Some(prev)
                if prev.date == b.date
                    && prev.client_id == b.client_id
                    && prev.end_min == b.start_min =>
            {
                prev.end_min = b.end_min
            }
            _ => out.push(b),
        }
    }
    out
}
