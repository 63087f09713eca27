//! Client roster model.
//!
//! A client record carries its authorized weekly windows (attendance
//! capacity, independent of supervisor availability), the percentage of
//! that capacity the supervisor should cover, session-length and
//! frequency constraints, and placement preferences.
//!
//! Optional fields are deliberately permissive: the engine substitutes
//! defaults rather than rejecting incomplete records (absent percentage
//! defaults to 10, absent minimum session to 60, absent caps to
//! unbounded).

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::calendar::WeekPlan;

/// Default supervision percentage for incomplete records.
pub const DEFAULT_SUP_PERCENT: f64 = 10.0;

/// Default minimum session length (minutes).
pub const DEFAULT_MIN_SESSION_MIN: i64 = 60;

/// Hard floor for the minimum session length (minutes).
pub const MIN_SESSION_FLOOR_MIN: i64 = 15;

/// A supervised client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier.
    pub id: String,
    /// Percentage (0-100) of authorized attendance minutes to supervise.
    #[serde(default)]
    pub sup_percent: Option<f64>,
    /// Floor for any non-final placement (minutes, >= 15).
    #[serde(default)]
    pub min_session_min: Option<i64>,
    /// Cap on sessions per Monday-start week. `None` = unbounded.
    #[serde(default)]
    pub max_sessions_per_week: Option<u32>,
    /// Cap on sessions per calendar date. `None` = unbounded.
    #[serde(default)]
    pub max_sessions_per_day: Option<u32>,
    /// Defer sub-60-minute placements when a later opportunity exists.
    #[serde(default)]
    pub prefer_no_sub_hour: bool,
    /// Ordered groups of weekdays; membership in any group raises
    /// placement priority on that weekday.
    #[serde(default)]
    pub preferred_day_slots: Vec<Vec<Weekday>>,
    /// Authorized attendance windows per weekday.
    #[serde(default)]
    pub windows: WeekPlan,
}

impl Client {
    /// Creates a client with permissive defaults everywhere.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sup_percent: None,
            min_session_min: None,
            max_sessions_per_week: None,
            max_sessions_per_day: None,
            prefer_no_sub_hour: false,
            preferred_day_slots: Vec::new(),
            windows: WeekPlan::new(),
        }
    }

    /// Sets the supervision percentage.
    pub fn with_sup_percent(mut self, percent: f64) -> Self {
        self.sup_percent = Some(percent);
        self
    }

    /// Sets the minimum session length (minutes).
    pub fn with_min_session(mut self, minutes: i64) -> Self {
        self.min_session_min = Some(minutes);
        self
    }

    /// Sets the weekly session cap.
    pub fn with_max_per_week(mut self, sessions: u32) -> Self {
        self.max_sessions_per_week = Some(sessions);
        self
    }

    /// Sets the daily session cap.
    pub fn with_max_per_day(mut self, sessions: u32) -> Self {
        self.max_sessions_per_day = Some(sessions);
        self
    }

    /// Marks this client as preferring no sub-hour sessions.
    pub fn with_no_sub_hour(mut self) -> Self {
        self.prefer_no_sub_hour = true;
        self
    }

    /// Adds a preferred-day-slot group.
    pub fn with_preferred_days(mut self, days: Vec<Weekday>) -> Self {
        self.preferred_day_slots.push(days);
        self
    }

    /// Adds an authorized window on a weekday.
    pub fn with_window(mut self, day: Weekday, start_min: i64, end_min: i64) -> Self {
        self.windows = self.windows.with_block(day, start_min, end_min);
        self
    }

    /// Effective supervision percentage, clamped to 0-100.
    pub fn percent(&self) -> f64 {
        self.sup_percent.unwrap_or(DEFAULT_SUP_PERCENT).clamp(0.0, 100.0)
    }

    /// Effective minimum session length (minutes), floored at 15.
    pub fn min_session(&self) -> i64 {
        self.min_session_min
            .unwrap_or(DEFAULT_MIN_SESSION_MIN)
            .max(MIN_SESSION_FLOOR_MIN)
    }

    /// Whether any preferred-day-slot group contains this weekday.
    pub fn prefers_day(&self, day: Weekday) -> bool {
        self.preferred_day_slots
            .iter()
            .any(|group| group.contains(&day))
    }
}
