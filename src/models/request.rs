//! The immutable allocation request.
//!
//! A [`ScheduleRequest`] is a snapshot of the roster and the supervisor's
//! calendar over an inclusive date range. The engine never mutates it;
//! every run rebuilds its own counters from scratch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::Supervisor;
use super::client::Client;

/// Input container for one allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// First date of the run (inclusive).
    pub start_date: NaiveDate,
    /// Last date of the run (inclusive).
    pub end_date: NaiveDate,
    /// Client roster.
    pub clients: Vec<Client>,
    /// Supervisor calendar.
    pub supervisor: Supervisor,
}

impl ScheduleRequest {
    /// Creates a new request.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        clients: Vec<Client>,
        supervisor: Supervisor,
    ) -> Self {
        Self {
            start_date,
            end_date,
            clients,
            supervisor,
        }
    }

    /// All dates of the run in calendar order (inclusive on both ends).
    ///
    /// Empty when the range is inverted.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        let mut d = self.start_date;
        while d <= self.end_date {
            out.push(d);
            let Some(next) = d.succ_opt() else { break };
            d = next;
        }
        out
    }

    /// Looks up a client by id.
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }
}

/// Parses an ISO `YYYY-MM-DD` date, falling back to the epoch
/// (1970-01-01) on malformed input.
///
/// Callers building requests from untrusted strings use this so one bad
/// date never halts a whole run.
pub fn parse_date_lenient(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").unwrap_or_default()
}
