//! Property tests over whole allocation runs.
//!
//! Random rosters and date ranges go through the full pipeline; every
//! output is checked against the structural guarantees the engine makes
//! regardless of input: blocks are well-formed and grid-aligned, stay
//! inside supervisor availability, never overlap, never exceed resolved
//! targets or daily caps, and the run is reproducible per seed.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use proptest::prelude::*;

use supalloc::models::block::subtract;
use supalloc::{Client, GreedyAllocator, Polisher, ScheduleRequest, ScheduledBlock, Supervisor};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const GRID: i64 = 15;

/// A grid-aligned window somewhere in the working day.
fn window() -> impl Strategy<Value = (i64, i64)> {
    (32i64..60, 4i64..16).prop_map(|(slot, len)| {
        let start = slot * GRID;
        (start, (start + len * GRID).min(1080))
    })
}

fn client(idx: usize) -> impl Strategy<Value = Client> {
    (
        proptest::sample::subsequence(WEEKDAYS.to_vec(), 1..=3),
        window(),
        10.0f64..=100.0,
        proptest::option::of(1u32..=2),
        proptest::option::of(1u32..=3),
    )
        .prop_map(move |(days, (start, end), percent, daily_cap, weekly_cap)| {
            let mut c = Client::new(format!("c{idx}")).with_sup_percent(percent);
            if let Some(cap) = daily_cap {
                c = c.with_max_per_day(cap);
            }
            if let Some(cap) = weekly_cap {
                c = c.with_max_per_week(cap);
            }
            for day in days {
                c = c.with_window(day, start, end);
            }
            c
        })
}

fn request() -> impl Strategy<Value = ScheduleRequest> {
    let clients = (1usize..=4).prop_flat_map(|n| (0..n).map(client).collect::<Vec<_>>());
    let supervisor_days = proptest::sample::subsequence(WEEKDAYS[..5].to_vec(), 1..=5);
    let range = (0u64..7, 6u64..21);

    (clients, supervisor_days, range).prop_map(|(clients, days, (offset, len))| {
        let mut supervisor = Supervisor::new();
        for day in days {
            supervisor = supervisor.with_availability(day, 480, 1080);
        }
        // 2025-03-03 is a Monday.
        let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap() + Days::new(offset);
        ScheduleRequest::new(start, start + Days::new(len), clients, supervisor)
    })
}

/// Monday of the week containing `date`.
fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Resolved target for a client, mirroring the engine's derivation.
fn expected_target(request: &ScheduleRequest, client: &Client) -> i64 {
    let authorized: i64 = request
        .dates()
        .iter()
        .map(|d| {
            client
                .windows
                .blocks(d.weekday())
                .iter()
                .map(|w| w.end_min - w.start_min)
                .sum::<i64>()
        })
        .sum();
    let computed = (authorized as f64 * client.percent() / 100.0).round() as i64;
    if computed == 0 {
        client.min_session()
    } else {
        computed
    }
}

fn check_structure(
    request: &ScheduleRequest,
    out: &[ScheduledBlock],
    check_targets: bool,
) -> Result<(), TestCaseError> {
    let mut per_client: HashMap<&str, i64> = HashMap::new();
    let mut per_client_day: HashMap<(&str, NaiveDate), u32> = HashMap::new();
    let mut per_client_week: HashMap<(&str, NaiveDate), u32> = HashMap::new();

    for (i, b) in out.iter().enumerate() {
        prop_assert!(b.start_min < b.end_min, "inside-out block {b:?}");
        prop_assert_eq!(b.start_min % GRID, 0);
        prop_assert_eq!(b.end_min % GRID, 0);
        prop_assert!(b.date >= request.start_date && b.date <= request.end_date);

        // The block must sit entirely inside supervisor availability.
        let avail = request.supervisor.daily_avail.blocks(b.date.weekday());
        prop_assert!(
            subtract(&[b.span()], avail).is_empty(),
            "block {b:?} escapes availability"
        );

        for other in &out[i + 1..] {
            if other.date == b.date {
                prop_assert!(
                    !b.span().overlaps(&other.span()),
                    "overlap between {b:?} and {other:?}"
                );
            }
        }

        *per_client.entry(b.client_id.as_str()).or_insert(0) += b.duration_min();
        *per_client_day
            .entry((b.client_id.as_str(), b.date))
            .or_insert(0) += 1;
        *per_client_week
            .entry((b.client_id.as_str(), monday_of(b.date)))
            .or_insert(0) += 1;
    }

    if check_targets {
        for client in &request.clients {
            let delivered = per_client.get(client.id.as_str()).copied().unwrap_or(0);
            prop_assert!(
                delivered <= expected_target(request, client),
                "client {} over-delivered",
                client.id
            );
        }
    }

    // Consolidation only ever reduces the block count of a day, so the
    // placed-block count bounds the session count from above.
    for ((id, date), count) in &per_client_day {
        let client = request.client(id).unwrap();
        if let Some(cap) = client.max_sessions_per_day {
            prop_assert!(count <= &cap, "daily cap broken for {id} on {date}");
        }
    }
    for ((id, week), count) in &per_client_week {
        let client = request.client(id).unwrap();
        if let Some(cap) = client.max_sessions_per_week {
            prop_assert!(count <= &cap, "weekly cap broken for {id} in week of {week}");
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn allocation_structural_invariants((request, seed) in (request(), 0u64..1000)) {
        let out = GreedyAllocator::new(seed).allocate(&request).unwrap();
        check_structure(&request, &out, true)?;

        // Same seed, same schedule.
        let again = GreedyAllocator::new(seed).allocate(&request).unwrap();
        prop_assert_eq!(out, again);
    }

    #[test]
    fn polish_keeps_invariants_and_converges((request, seed) in (request(), 0u64..1000)) {
        let raw = GreedyAllocator::new(seed).allocate(&request).unwrap();
        let raw_total: i64 = raw.iter().map(ScheduledBlock::duration_min).sum();

        let locked = HashSet::new();
        let polisher = Polisher::new();
        // Stretching may exceed a client's target; that is the point of
        // the pass, so only the structural checks apply here.
        let polished = polisher.polish(&request, raw, &locked);
        check_structure(&request, &polished, false)?;

        // Polishing only adds minutes (gap fusion, stretching).
        let polished_total: i64 = polished.iter().map(ScheduledBlock::duration_min).sum();
        prop_assert!(polished_total >= raw_total);

        // And it is idempotent.
        let twice = polisher.polish(&request, polished.clone(), &locked);
        prop_assert_eq!(twice, polished);
    }
}
