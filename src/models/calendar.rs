//! Weekly availability plans and the supervisor calendar.
//!
//! Availability is keyed by weekday, not by date: a [`WeekPlan`] holds one
//! block list per weekday (Monday-first), and the engine intersects it
//! against the concrete dates of a run. Date-level exceptions (one-off
//! exclusions, fully closed days) live on the [`Supervisor`] and are
//! applied after the weekday lookup.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::block::TimeBlock;

/// Default rounding grid (minutes).
pub const DEFAULT_GRID_MIN: i64 = 15;

/// Smallest grid the engine supports (minutes).
pub const MIN_GRID_MIN: i64 = 5;

/// Index into Monday-first weekday arrays.
#[inline]
pub(crate) fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

/// Per-weekday time block lists, Monday-first.
///
/// Used for both the supervisor's daily availability and a client's
/// authorized windows. Blocks within a day are kept sorted by start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    days: [Vec<TimeBlock>; 7],
}

impl WeekPlan {
    /// Creates an empty plan (no availability on any day).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block on a weekday.
    pub fn with_block(mut self, day: Weekday, start_min: i64, end_min: i64) -> Self {
        self.add_block(day, TimeBlock::new(start_min, end_min));
        self
    }

    /// Replaces the block list for a weekday.
    pub fn with_day(mut self, day: Weekday, mut blocks: Vec<TimeBlock>) -> Self {
        blocks.sort_by_key(|b| b.start_min);
        self.days[weekday_index(day)] = blocks;
        self
    }

    /// Adds a block on a weekday, keeping the day sorted.
    pub fn add_block(&mut self, day: Weekday, block: TimeBlock) {
        let list = &mut self.days[weekday_index(day)];
        list.push(block);
        list.sort_by_key(|b| b.start_min);
    }

    /// Blocks for a weekday (sorted by start).
    pub fn blocks(&self, day: Weekday) -> &[TimeBlock] {
        &self.days[weekday_index(day)]
    }

    /// Whether the weekday has any blocks.
    pub fn has_day(&self, day: Weekday) -> bool {
        !self.blocks(day).is_empty()
    }

    /// Number of distinct weekdays with at least one block.
    pub fn distinct_day_count(&self) -> usize {
        self.days.iter().filter(|d| !d.is_empty()).count()
    }

    /// Whether the plan has no blocks at all.
    pub fn is_empty(&self) -> bool {
        self.distinct_day_count() == 0
    }

    /// Iterates `(weekday, blocks)` pairs in Monday-first order.
    pub fn iter_days(&self) -> impl Iterator<Item = (Weekday, &[TimeBlock])> {
        const ORDER: [Weekday; 7] = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        ORDER.into_iter().zip(self.days.iter().map(Vec::as_slice))
    }
}

/// The supervisor's calendar: recurring weekly availability plus
/// date-level exceptions and the rounding grid for placed blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supervisor {
    /// Recurring availability per weekday.
    #[serde(default)]
    pub daily_avail: WeekPlan,
    /// Rounding grid for block boundaries (minutes). Clamped to a floor
    /// of 5 by [`Supervisor::effective_grid`].
    #[serde(default = "default_grid")]
    pub rounding_min: i64,
    /// Concrete-date exclusions carved out of that date's availability.
    #[serde(default)]
    pub one_off_unavail: HashMap<NaiveDate, Vec<TimeBlock>>,
    /// Concrete dates with no availability at all.
    #[serde(default)]
    pub unavailable_days: HashSet<NaiveDate>,
}

fn default_grid() -> i64 {
    DEFAULT_GRID_MIN
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// Creates a supervisor with no availability and the default grid.
    pub fn new() -> Self {
        Self {
            daily_avail: WeekPlan::new(),
            rounding_min: DEFAULT_GRID_MIN,
            one_off_unavail: HashMap::new(),
            unavailable_days: HashSet::new(),
        }
    }

    /// Adds a recurring availability block on a weekday.
    pub fn with_availability(mut self, day: Weekday, start_min: i64, end_min: i64) -> Self {
        self.daily_avail
            .add_block(day, TimeBlock::new(start_min, end_min));
        self
    }

    /// Sets the rounding grid (minutes).
    pub fn with_rounding_min(mut self, grid_min: i64) -> Self {
        self.rounding_min = grid_min;
        self
    }

    /// Adds a one-off exclusion on a concrete date.
    pub fn with_one_off(mut self, date: NaiveDate, block: TimeBlock) -> Self {
        self.one_off_unavail.entry(date).or_default().push(block);
        self
    }

    /// Marks a concrete date fully closed.
    pub fn with_closed_day(mut self, date: NaiveDate) -> Self {
        self.unavailable_days.insert(date);
        self
    }

    /// The grid actually used for placement: `rounding_min` with a floor
    /// of 5 minutes.
    pub fn effective_grid(&self) -> i64 {
        self.rounding_min.max(MIN_GRID_MIN)
    }
}
