//! Structural input validation for allocation requests.
//!
//! The engine is defensive about *values* (missing percentages, absent
//! caps, undersized grids all get permissive defaults), but *structural*
//! problems — duplicate client ids, inside-out time blocks, an inverted
//! date range — fail the run up front. A failed run produces no output
//! rather than a partially populated one.
//!
//! All detected problems are collected and reported together, not just
//! the first.

use std::collections::HashSet;

use chrono::{NaiveDate, Weekday};
use thiserror::Error;

use crate::models::{ScheduleRequest, TimeBlock};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A structural problem in a schedule request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Two clients share the same id.
    #[error("duplicate client id '{0}'")]
    DuplicateClientId(String),

    /// A client window violates `0 <= start < end <= 1440`.
    #[error("client '{client_id}' has a malformed {day} window {start_min}..{end_min}")]
    MalformedClientWindow {
        client_id: String,
        day: Weekday,
        start_min: i64,
        end_min: i64,
    },

    /// A supervisor availability block violates `0 <= start < end <= 1440`.
    #[error("supervisor has a malformed {day} availability block {start_min}..{end_min}")]
    MalformedAvailability {
        day: Weekday,
        start_min: i64,
        end_min: i64,
    },

    /// A one-off exclusion violates `0 <= start < end <= 1440`.
    #[error("supervisor has a malformed one-off exclusion on {date}: {start_min}..{end_min}")]
    MalformedOneOff {
        date: NaiveDate,
        start_min: i64,
        end_min: i64,
    },

    /// The date range ends before it starts.
    #[error("date range ends before it starts: {start_date} > {end_date}")]
    InvertedDateRange {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

/// Validates a schedule request before allocation.
///
/// Checks:
/// 1. The date range is not inverted
/// 2. No duplicate client ids
/// 3. Every client window is well-formed
/// 4. Every supervisor availability block is well-formed
/// 5. Every one-off exclusion is well-formed
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_request(request: &ScheduleRequest) -> ValidationResult {
    let mut errors = Vec::new();

    if request.start_date > request.end_date {
        errors.push(ValidationError::InvertedDateRange {
            start_date: request.start_date,
            end_date: request.end_date,
        });
    }

    let mut seen = HashSet::new();
    for client in &request.clients {
        if !seen.insert(client.id.as_str()) {
            errors.push(ValidationError::DuplicateClientId(client.id.clone()));
        }

        for (day, blocks) in client.windows.iter_days() {
            for block in malformed(blocks) {
                errors.push(ValidationError::MalformedClientWindow {
                    client_id: client.id.clone(),
                    day,
                    start_min: block.start_min,
                    end_min: block.end_min,
                });
            }
        }
    }

    for (day, blocks) in request.supervisor.daily_avail.iter_days() {
        for block in malformed(blocks) {
            errors.push(ValidationError::MalformedAvailability {
                day,
                start_min: block.start_min,
                end_min: block.end_min,
            });
        }
    }

    let mut one_off_dates: Vec<&NaiveDate> = request.supervisor.one_off_unavail.keys().collect();
    one_off_dates.sort();
    for date in one_off_dates {
        for block in malformed(&request.supervisor.one_off_unavail[date]) {
            errors.push(ValidationError::MalformedOneOff {
                date: *date,
                start_min: block.start_min,
                end_min: block.end_min,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn malformed(blocks: &[TimeBlock]) -> impl Iterator<Item = &TimeBlock> {
    blocks.iter().filter(|b| !b.is_well_formed())
}
