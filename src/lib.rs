//! # supalloc
//!
//! A deterministic time-block allocation engine for supervision
//! schedules. Given a supervisor's weekly availability and a roster of
//! clients with authorized attendance windows, it places supervision
//! blocks over a date range: per-client target minutes are derived from
//! a percentage of authorized time, a greedy scored walk spreads
//! placements fairly across weekdays and clients, and repair passes
//! reduce fragmentation afterwards.
//!
//! All times are minutes since midnight on a half-open `[start, end)`
//! scale; all placements land on a configurable rounding grid.
//!
//! ## Modules
//! - [`models`] — time blocks, weekly plans, the roster, and requests.
//! - [`validation`] — structural request checks, every problem reported.
//! - [`allocator`] — the greedy placement engine.
//! - [`polish`] — optional merge/stretch repair over a placed schedule.
//!
//! ## Example
//! ```
//! use chrono::{NaiveDate, Weekday};
//! use supalloc::{Client, GreedyAllocator, ScheduleRequest, Supervisor};
//!
//! let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
//! let request = ScheduleRequest::new(
//!     monday,
//!     monday,
//!     vec![Client::new("c1")
//!         .with_window(Weekday::Mon, 540, 660)
//!         .with_sup_percent(100.0)],
//!     Supervisor::new().with_availability(Weekday::Mon, 540, 720),
//! );
//!
//! let blocks = GreedyAllocator::new(1).allocate(&request).unwrap();
//! assert_eq!(blocks.len(), 1);
//! assert_eq!(blocks[0].duration_min(), 120);
//! ```

pub mod allocator;
mod consolidate;
pub mod models;
pub mod polish;
pub mod validation;

pub use allocator::{AllocOptions, AllocationError, GreedyAllocator};
pub use models::{
    Client, ScheduleRequest, ScheduledBlock, Supervisor, TimeBlock, WeekPlan,
};
pub use polish::Polisher;
pub use validation::{validate_request, ValidationError};
