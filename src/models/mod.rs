//! Allocation domain models.
//!
//! Core data types for supervision scheduling: minute-granularity time
//! blocks and their interval arithmetic, weekly availability plans, the
//! client roster, the immutable run request, and the placed-block output
//! type.
//!
//! # Time Model
//!
//! All times are minutes since midnight on a single calendar date; no
//! block spans a day boundary. Dates are `chrono::NaiveDate`, weekdays
//! are `chrono::Weekday` in canonical Monday-first order.

pub mod block;
mod calendar;
mod client;
mod request;
mod schedule;

pub(crate) use calendar::weekday_index;

pub use block::{TimeBlock, MINUTES_PER_DAY};
pub use calendar::{Supervisor, WeekPlan, DEFAULT_GRID_MIN, MIN_GRID_MIN};
pub use client::{Client, DEFAULT_MIN_SESSION_MIN, DEFAULT_SUP_PERCENT, MIN_SESSION_FLOOR_MIN};
pub use request::{parse_date_lenient, ScheduleRequest};
pub use schedule::{sort_blocks, spans_on_date, total_minutes_for, ScheduledBlock};
