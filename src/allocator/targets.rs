//! Per-client target-minute resolution.
//!
//! The target is the total session time the run attempts to schedule for
//! a client. By default it is a percentage of the client's *authorized
//! attendance* across the date range — the client's own windows, not the
//! supervisor's capacity. An explicit per-run override replaces the
//! computed default entirely.

use chrono::{Datelike, NaiveDate};

use crate::models::block::total_minutes;
use crate::models::Client;

/// Resolves the target minutes for one client over the run's dates.
///
/// 1. An explicit override wins outright (floored at zero).
/// 2. Otherwise: sum the client's window minutes over every date whose
///    weekday matches one of the client's window days, multiply by
///    `percent / 100`, round to the nearest minute.
/// 3. A zero result falls back to the client's minimum session length,
///    so any client with a window gets at least one sessionable target.
pub(crate) fn resolve_target(client: &Client, dates: &[NaiveDate], override_min: Option<i64>) -> i64 {
    if let Some(minutes) = override_min {
        return minutes.max(0);
    }

    let authorized: i64 = dates
        .iter()
        .map(|d| total_minutes(client.windows.blocks(d.weekday())))
        .sum();

    let computed = (authorized as f64 * client.percent() / 100.0).round().max(0.0) as i64;
    if computed == 0 {
        client.min_session()
    } else {
        computed
    }
}
