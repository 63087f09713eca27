//! Per-run allocation state.
//!
//! Every counter the allocator consults — remaining targets, weekly and
//! daily session counts, weekday load, last-placed dates — lives in one
//! [`RunState`] built fresh at the start of a run and discarded with it.
//! No ambient state crosses run boundaries; determinism for a given seed
//! depends on that.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::models::{weekday_index, Client, ScheduledBlock, TimeBlock};

/// Monday of the week containing `date` (weekly caps are Monday-start).
pub(crate) fn week_start(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Mutable state threaded through one allocation run.
pub(crate) struct RunState {
    /// Remaining target minutes per client.
    remaining: HashMap<String, i64>,
    /// Placed session count per (client, Monday-start week).
    weekly: HashMap<(String, NaiveDate), u32>,
    /// Placed session count per (client, date).
    daily: HashMap<(String, NaiveDate), u32>,
    /// Placement events per weekday, across all clients.
    weekday_load: [u32; 7],
    /// Placement events per weekday, per client.
    client_weekday_load: HashMap<String, [u32; 7]>,
    /// Last date each client received a placement.
    last_placed: HashMap<String, NaiveDate>,
    /// Seeded jitter source for final tie-breaks.
    rng: SmallRng,
    /// Blocks placed so far this run.
    pub blocks: Vec<ScheduledBlock>,
}

impl RunState {
    /// Builds fresh state for a run from resolved targets.
    pub fn new(seed: u64, targets: HashMap<String, i64>) -> Self {
        Self {
            remaining: targets,
            weekly: HashMap::new(),
            daily: HashMap::new(),
            weekday_load: [0; 7],
            client_weekday_load: HashMap::new(),
            last_placed: HashMap::new(),
            rng: SmallRng::seed_from_u64(seed),
            blocks: Vec::new(),
        }
    }

    /// Remaining target minutes for a client.
    pub fn remaining(&self, client_id: &str) -> i64 {
        self.remaining.get(client_id).copied().unwrap_or(0)
    }

    /// Whether the client's weekly and daily caps both leave room on `date`.
    pub fn under_caps(&self, client: &Client, date: NaiveDate) -> bool {
        if let Some(cap) = client.max_sessions_per_day {
            let placed = self
                .daily
                .get(&(client.id.clone(), date))
                .copied()
                .unwrap_or(0);
            if placed >= cap {
                return false;
            }
        }
        if let Some(cap) = client.max_sessions_per_week {
            let placed = self
                .weekly
                .get(&(client.id.clone(), week_start(date)))
                .copied()
                .unwrap_or(0);
            if placed >= cap {
                return false;
            }
        }
        true
    }

    /// Global placement events so far on a weekday.
    pub fn weekday_load(&self, date: NaiveDate) -> u32 {
        self.weekday_load[weekday_index(date.weekday())]
    }

    /// One client's placement events so far on a weekday.
    pub fn client_weekday_load(&self, client_id: &str, date: NaiveDate) -> u32 {
        self.client_weekday_load
            .get(client_id)
            .map(|per_day| per_day[weekday_index(date.weekday())])
            .unwrap_or(0)
    }

    /// Whether the client was placed on the immediately preceding date.
    pub fn placed_yesterday(&self, client_id: &str, date: NaiveDate) -> bool {
        match (self.last_placed.get(client_id), date.pred_opt()) {
            (Some(last), Some(prev)) => *last == prev,
            _ => false,
        }
    }

    /// Draws the next deterministic jitter value.
    pub fn jitter(&mut self) -> f64 {
        self.rng.random()
    }

    /// Records a placement of `span` for a client on a date.
    ///
    /// Extends an existing block in place when one ends exactly where the
    /// new span starts; cap counters only move when a new block appears,
    /// since an extension does not create a session.
    pub fn record_placement(&mut self, client_id: &str, date: NaiveDate, span: TimeBlock) {
        let extended = self
            .blocks
            .iter_mut()
            .find(|b| b.date == date && b.client_id == client_id && b.end_min == span.start_min);

        match extended {
            Some(block) => block.end_min = span.end_min,
            None => {
                self.blocks.push(ScheduledBlock::new(
                    date,
                    client_id,
                    span.start_min,
                    span.end_min,
                ));
                *self
                    .daily
                    .entry((client_id.to_string(), date))
                    .or_insert(0) += 1;
                *self
                    .weekly
                    .entry((client_id.to_string(), week_start(date)))
                    .or_insert(0) += 1;
            }
        }

        let day = weekday_index(date.weekday());
        self.weekday_load[day] += 1;
        self.client_weekday_load
            .entry(client_id.to_string())
            .or_insert([0; 7])[day] += 1;
        self.last_placed.insert(client_id.to_string(), date);

        if let Some(rem) = self.remaining.get_mut(client_id) {
            *rem -= span.duration_min();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn state_for(client_id: &str, target: i64) -> RunState {
        RunState::new(7, HashMap::from([(client_id.to_string(), target)]))
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2025-03-03 is a Monday.
        assert_eq!(week_start(date(3)), date(3));
        assert_eq!(week_start(date(6)), date(3)); // Thursday
        assert_eq!(week_start(date(9)), date(3)); // Sunday
        assert_eq!(week_start(date(10)), date(10)); // next Monday
    }

    #[test]
    fn test_record_placement_updates_counters() {
        let mut state = state_for("c1", 120);
        state.record_placement("c1", date(3), TimeBlock::new(540, 600));

        assert_eq!(state.remaining("c1"), 60);
        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.weekday_load(date(10)), 1); // same weekday, later week
        assert_eq!(state.client_weekday_load("c1", date(3)), 1);
        assert!(state.placed_yesterday("c1", date(4)));
        assert!(!state.placed_yesterday("c1", date(5)));
    }

    #[test]
    fn test_extension_merges_into_existing_block() {
        let mut state = state_for("c1", 120);
        state.record_placement("c1", date(3), TimeBlock::new(540, 600));
        state.record_placement("c1", date(3), TimeBlock::new(600, 660));

        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.blocks[0].end_min, 660);
        assert_eq!(state.remaining("c1"), 0);
    }

    #[test]
    fn test_extension_does_not_consume_caps() {
        let client = Client::new("c1").with_max_per_day(1).with_max_per_week(1);
        let mut state = state_for("c1", 120);

        state.record_placement("c1", date(3), TimeBlock::new(540, 600));
        // A new session today or this week would exceed the caps...
        assert!(!state.under_caps(&client, date(3)));
        assert!(!state.under_caps(&client, date(5)));
        // ...but next week is open again.
        assert!(state.under_caps(&client, date(10)));

        // The extension above kept the block count at one.
        state.record_placement("c1", date(3), TimeBlock::new(600, 660));
        assert_eq!(state.blocks.len(), 1);
    }

    #[test]
    fn test_uncapped_client_never_blocked() {
        let client = Client::new("c1");
        let mut state = state_for("c1", 600);
        for _ in 0..5 {
            assert!(state.under_caps(&client, date(3)));
            let start = 540 + 60 * state.blocks.len() as i64;
            state.record_placement("c1", date(3), TimeBlock::new(start, start + 30));
        }
    }

    #[test]
    fn test_jitter_deterministic_per_seed() {
        let mut a = state_for("c1", 0);
        let mut b = state_for("c1", 0);
        let seq_a: Vec<f64> = (0..4).map(|_| a.jitter()).collect();
        let seq_b: Vec<f64> = (0..4).map(|_| b.jitter()).collect();
        assert_eq!(seq_a, seq_b);
    }
}
