//! Placed supervision blocks (the engine's output).
//!
//! A [`ScheduledBlock`] has no surrogate id: its identity is the full
//! `(date, client_id, start, end)` tuple, with structural equality and
//! hashing. Locked-set membership tests and the consolidation pass's
//! "remove originals" step both rely on exact structural match.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::block::TimeBlock;

/// One placed supervision session on a concrete date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduledBlock {
    /// Calendar date of the session.
    pub date: NaiveDate,
    /// Client receiving the session.
    pub client_id: String,
    /// Start (minutes since midnight, inclusive).
    pub start_min: i64,
    /// End (minutes since midnight, exclusive).
    pub end_min: i64,
}

impl ScheduledBlock {
    /// Creates a new scheduled block.
    pub fn new(date: NaiveDate, client_id: impl Into<String>, start_min: i64, end_min: i64) -> Self {
        Self {
            date,
            client_id: client_id.into(),
            start_min,
            end_min,
        }
    }

    /// Session length (minutes).
    #[inline]
    pub fn duration_min(&self) -> i64 {
        self.end_min - self.start_min
    }

    /// The block's time span, detached from date and client.
    #[inline]
    pub fn span(&self) -> TimeBlock {
        TimeBlock::new(self.start_min, self.end_min)
    }
}

/// Sorts blocks into canonical output order: date, then start, then client.
pub fn sort_blocks(blocks: &mut [ScheduledBlock]) {
    blocks.sort_by(|a, b| {
        (a.date, a.start_min, &a.client_id).cmp(&(b.date, b.start_min, &b.client_id))
    });
}

/// Time spans of all blocks on a date, across clients.
pub fn spans_on_date(blocks: &[ScheduledBlock], date: NaiveDate) -> Vec<TimeBlock> {
    blocks
        .iter()
        .filter(|b| b.date == date)
        .map(ScheduledBlock::span)
        .collect()
}

/// Total scheduled minutes for one client across all dates.
pub fn total_minutes_for(blocks: &[ScheduledBlock], client_id: &str) -> i64 {
    blocks
        .iter()
        .filter(|b| b.client_id == client_id)
        .map(ScheduledBlock::duration_min)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_identity_is_the_tuple() {
        let a = ScheduledBlock::new(date(10), "c1", 540, 600);
        let b = ScheduledBlock::new(date(10), "c1", 540, 600);
        let c = ScheduledBlock::new(date(10), "c1", 540, 615);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_sort_blocks_canonical() {
        let mut blocks = vec![
            ScheduledBlock::new(date(11), "c1", 540, 600),
            ScheduledBlock::new(date(10), "c2", 600, 660),
            ScheduledBlock::new(date(10), "c1", 540, 600),
        ];
        sort_blocks(&mut blocks);
        assert_eq!(blocks[0].client_id, "c1");
        assert_eq!(blocks[0].date, date(10));
        assert_eq!(blocks[1].start_min, 600);
        assert_eq!(blocks[2].date, date(11));
    }

    #[test]
    fn test_query_helpers() {
        let blocks = vec![
            ScheduledBlock::new(date(10), "c1", 540, 600),
            ScheduledBlock::new(date(10), "c2", 600, 660),
            ScheduledBlock::new(date(11), "c1", 540, 630),
        ];
        assert_eq!(spans_on_date(&blocks, date(10)).len(), 2);
        assert_eq!(total_minutes_for(&blocks, "c1"), 150);
        assert_eq!(total_minutes_for(&blocks, "c3"), 0);
    }
}
