//! Candidate priority scoring for the greedy allocator.
//!
//! Each scan iteration scores every remaining candidate and places the
//! best one, so scores are recomputed after every placement. The score is
//! an ordered tie-break chain, primary first:
//!
//! 1. preferred-day-slot membership for this weekday (higher wins)
//! 2. ability to place a >= 60-minute block right now — only consulted
//!    when bias-toward-longer is enabled (higher wins)
//! 3. scarcity boost, `1 + 1/distinct-window-weekdays` (higher wins)
//! 4. global placements so far on this weekday (lower wins)
//! 5. this client's placements so far on this weekday (lower wins)
//! 6. back-to-back penalty: placed on the preceding date (lower wins)
//! 7. remaining target minutes (higher wins)
//! 8. seeded jitter (reproducible final tie-break)

use std::cmp::Ordering;

use crate::models::Client;

/// One candidate's score for a scan iteration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CandidateScore {
    pub preferred_day: bool,
    pub can_place_hour: bool,
    pub scarcity: f64,
    pub weekday_load: u32,
    pub own_weekday_load: u32,
    pub back_to_back: bool,
    pub remaining_min: i64,
    pub jitter: f64,
}

impl CandidateScore {
    /// Orders two scores; `Less` means `self` places first.
    pub fn cmp_priority(&self, other: &Self) -> Ordering {
        other
            .preferred_day
            .cmp(&self.preferred_day)
            .then(other.can_place_hour.cmp(&self.can_place_hour))
            .then(
                other
                    .scarcity
                    .partial_cmp(&self.scarcity)
                    .unwrap_or(Ordering::Equal),
            )
            .then(self.weekday_load.cmp(&other.weekday_load))
            .then(self.own_weekday_load.cmp(&other.own_weekday_load))
            .then(self.back_to_back.cmp(&other.back_to_back))
            .then(other.remaining_min.cmp(&self.remaining_min))
            .then(
                self.jitter
                    .partial_cmp(&other.jitter)
                    .unwrap_or(Ordering::Equal),
            )
    }
}

/// Scarcity boost: clients with fewer available weekdays score higher.
pub(crate) fn scarcity_boost(client: &Client) -> f64 {
    1.0 + 1.0 / client.windows.distinct_day_count().max(1) as f64
}
