//! The greedy placement walk.
//!
//! One pass over the run's dates, interleaved round-robin across
//! weekdays so early placements spread evenly instead of exhausting
//! Mondays first. Each date runs a scored primary scan (one placement per
//! iteration, full re-score after each) and then a relaxed fallback fill
//! that trades fairness scoring for leaving no capacity unused.
//!
//! Both scans are bounded by hard iteration guards, so a run always
//! terminates in `dates x clients x guard` steps.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::models::block::{intersect, subtract};
use crate::models::{weekday_index, Client, ScheduleRequest, ScheduledBlock, TimeBlock};

use super::context::RunState;
use super::scoring::{scarcity_boost, CandidateScore};

/// Placement attempts per date in the primary scan.
pub(crate) const PRIMARY_SCAN_GUARD: usize = 80;

/// Sweeps per date in the fallback fill.
pub(crate) const FALLBACK_SCAN_GUARD: usize = 200;

const HOUR_MIN: i64 = 60;

/// Immutable per-run configuration shared by the scan functions.
///
/// `closed_days` and `one_offs` are the merged view of the supervisor's
/// own exceptions and the run's side-channel parameters.
pub(crate) struct RunConfig<'a> {
    pub grid: i64,
    pub bias_longer: bool,
    pub end_date: NaiveDate,
    pub closed_days: &'a HashSet<NaiveDate>,
    pub one_offs: &'a HashMap<NaiveDate, Vec<TimeBlock>>,
    pub locked: &'a HashSet<ScheduledBlock>,
}

/// Outcome of a single placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaceOutcome {
    Placed,
    /// Skipped today in favor of a future date.
    Deferred,
    /// No grid-aligned feasible window right now.
    NoFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    Primary,
    Fallback,
}

/// Orders the run's dates: partition by weekday, then interleave
/// round-robin in canonical Mon..Sun order.
///
/// With a 3-week range this visits first Monday, first Tuesday, ...,
/// first Sunday, second Monday, and so on — spreading early placements
/// across weekdays before any single weekday's capacity is exhausted.
pub(crate) fn interleave_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut by_weekday: [Vec<NaiveDate>; 7] = Default::default();
    let mut d = start;
    while d <= end {
        by_weekday[weekday_index(d.weekday())].push(d);
        let Some(next) = d.succ_opt() else { break };
        d = next;
    }

    let rounds = by_weekday.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Vec::new();
    for round in 0..rounds {
        for dates in &by_weekday {
            if let Some(date) = dates.get(round) {
                out.push(*date);
            }
        }
    }
    out
}

/// Supervisor time still open on a date before any placement: weekday
/// availability, zeroed on closed dates, minus one-offs and locked spans.
pub(crate) fn free_time(
    request: &ScheduleRequest,
    cfg: &RunConfig<'_>,
    date: NaiveDate,
) -> Vec<TimeBlock> {
    if cfg.closed_days.contains(&date) {
        return Vec::new();
    }

    let mut free = request.supervisor.daily_avail.blocks(date.weekday()).to_vec();
    if let Some(one_offs) = cfg.one_offs.get(&date) {
        free = subtract(&free, one_offs);
    }

    let locked_spans: Vec<TimeBlock> = cfg
        .locked
        .iter()
        .filter(|b| b.date == date)
        .map(ScheduledBlock::span)
        .collect();
    subtract(&free, &locked_spans)
}

/// Runs both scans for one date, consuming `free` as blocks land.
pub(crate) fn run_date(
    request: &ScheduleRequest,
    cfg: &RunConfig<'_>,
    state: &mut RunState,
    date: NaiveDate,
    free: &mut Vec<TimeBlock>,
) {
    primary_scan(request, cfg, state, date, free);
    if !free.is_empty() {
        fallback_fill(request, cfg, state, date, free);
    }
}

/// The scored scan: each iteration re-scores all remaining candidates and
/// places the best one that fits. A deferred or unfittable top candidate
/// falls through to the next in score order; an iteration that places
/// nothing ends the scan.
fn primary_scan(
    request: &ScheduleRequest,
    cfg: &RunConfig<'_>,
    state: &mut RunState,
    date: NaiveDate,
    free: &mut Vec<TimeBlock>,
) {
    let weekday = date.weekday();

    for _ in 0..PRIMARY_SCAN_GUARD {
        if free.is_empty() {
            return;
        }

        let mut scored: Vec<(usize, CandidateScore)> = Vec::new();
        for (idx, client) in request.clients.iter().enumerate() {
            if state.remaining(&client.id) <= 0 {
                continue;
            }
            if !client.windows.has_day(weekday) {
                continue;
            }
            if !state.under_caps(client, date) {
                continue;
            }
            let score = CandidateScore {
                preferred_day: client.prefers_day(weekday),
                can_place_hour: cfg.bias_longer && can_place_hour(client, cfg, state, free, weekday),
                scarcity: scarcity_boost(client),
                weekday_load: state.weekday_load(date),
                own_weekday_load: state.client_weekday_load(&client.id, date),
                back_to_back: state.placed_yesterday(&client.id, date),
                remaining_min: state.remaining(&client.id),
                jitter: state.jitter(),
            };
            scored.push((idx, score));
        }
        scored.sort_by(|a, b| a.1.cmp_priority(&b.1));

        let mut placed = false;
        for (idx, _) in &scored {
            let client = &request.clients[*idx];
            if try_place(request, cfg, state, date, client, free, ScanMode::Primary)
                == PlaceOutcome::Placed
            {
                placed = true;
                break;
            }
        }
        if !placed {
            return;
        }
    }
}

/// The relaxed pass after the primary scan stalls: no slot-preference or
/// scarcity ordering, no deferral lookahead — clients in input order,
/// first feasible window each, so leftover capacity gets used.
fn fallback_fill(
    request: &ScheduleRequest,
    cfg: &RunConfig<'_>,
    state: &mut RunState,
    date: NaiveDate,
    free: &mut Vec<TimeBlock>,
) {
    let weekday = date.weekday();

    for _ in 0..FALLBACK_SCAN_GUARD {
        if free.is_empty() {
            return;
        }

        let mut placed_any = false;
        for client in &request.clients {
            if free.is_empty() {
                break;
            }
            if state.remaining(&client.id) <= 0 {
                continue;
            }
            if !client.windows.has_day(weekday) {
                continue;
            }
            if !state.under_caps(client, date) {
                continue;
            }
            if try_place(request, cfg, state, date, client, free, ScanMode::Fallback)
                == PlaceOutcome::Placed
            {
                placed_any = true;
            }
        }
        if !placed_any {
            return;
        }
    }
}

/// Whether the client could receive a full hour right now.
fn can_place_hour(
    client: &Client,
    cfg: &RunConfig<'_>,
    state: &RunState,
    free: &[TimeBlock],
    weekday: chrono::Weekday,
) -> bool {
    if state.remaining(&client.id) < HOUR_MIN {
        return false;
    }
    intersect(client.windows.blocks(weekday), free)
        .into_iter()
        .filter_map(|b| b.snap_to_grid(cfg.grid))
        .any(|b| b.duration_min() >= HOUR_MIN)
}

/// Attempts one placement for a client on a date.
fn try_place(
    request: &ScheduleRequest,
    cfg: &RunConfig<'_>,
    state: &mut RunState,
    date: NaiveDate,
    client: &Client,
    free: &mut Vec<TimeBlock>,
    mode: ScanMode,
) -> PlaceOutcome {
    let weekday = date.weekday();

    let mut feasible: Vec<TimeBlock> = intersect(client.windows.blocks(weekday), free)
        .into_iter()
        .filter_map(|b| b.snap_to_grid(cfg.grid))
        .collect();
    feasible.sort_by_key(|b| b.start_min);
    if feasible.is_empty() {
        return PlaceOutcome::NoFit;
    }

    let remaining = state.remaining(&client.id);
    let min_session = client.min_session();
    let window = match mode {
        ScanMode::Primary => pick_window(&feasible, min_session),
        ScanMode::Fallback => feasible[0],
    };
    let window_len = window.duration_min();
    let mut take = remaining.min(window_len);

    if cfg.bias_longer && take < HOUR_MIN && window_len >= HOUR_MIN && remaining >= HOUR_MIN {
        take = HOUR_MIN;
    }

    if client.prefer_no_sub_hour && take < HOUR_MIN {
        match mode {
            ScanMode::Primary => {
                if remaining >= HOUR_MIN && has_future_window(request, cfg, client, date) {
                    return PlaceOutcome::Deferred;
                }
            }
            // The relaxed pass bumps to an hour without the lookahead:
            // leftover capacity here is use-it-or-lose-it.
            ScanMode::Fallback => {
                if remaining >= HOUR_MIN && window_len >= HOUR_MIN {
                    take = HOUR_MIN;
                }
            }
        }
    }

    if remaining >= min_session && take < min_session {
        if window_len >= min_session {
            take = min_session;
        } else if mode == ScanMode::Primary && has_future_window(request, cfg, client, date) {
            return PlaceOutcome::Deferred;
        }
        // Otherwise place the largest grid-aligned chunk that fits today.
    }

    take = take.div_euclid(cfg.grid) * cfg.grid;
    if take < cfg.grid {
        return PlaceOutcome::NoFit;
    }

    let span = TimeBlock::new(window.start_min, window.start_min + take);
    state.record_placement(&client.id, date, span);
    *free = subtract(free, &[span]);
    PlaceOutcome::Placed
}

/// Prefers the largest feasible window that can host the minimum session;
/// falls back to the largest window overall. Ties go to the earliest.
fn pick_window(feasible: &[TimeBlock], min_session: i64) -> TimeBlock {
    let mut best: Option<TimeBlock> = None;
    for w in feasible {
        if w.duration_min() >= min_session
            && best.is_none_or(|b| w.duration_min() > b.duration_min())
        {
            best = Some(*w);
        }
    }
    if let Some(found) = best {
        return found;
    }

    let mut largest = feasible[0];
    for w in &feasible[1..] {
        if w.duration_min() > largest.duration_min() {
            largest = *w;
        }
    }
    largest
}

/// Side-effect-free lookahead: does the client have any usable window on
/// a later date of the run?
fn has_future_window(
    request: &ScheduleRequest,
    cfg: &RunConfig<'_>,
    client: &Client,
    date: NaiveDate,
) -> bool {
    let mut d = date;
    while let Some(next) = d.succ_opt() {
        if next > cfg.end_date {
            return false;
        }
        d = next;
        if cfg.closed_days.contains(&d) {
            continue;
        }
        let weekday = d.weekday();
        if client.windows.has_day(weekday) && request.supervisor.daily_avail.has_day(weekday) {
            return true;
        }
    }
    false
}
