//! Greedy time-block allocation.
//!
//! [`GreedyAllocator`] turns a [`ScheduleRequest`] into a list of
//! [`ScheduledBlock`]s in a single forward pass: per-client target
//! minutes are resolved up front, the run's dates are visited in a
//! weekday-interleaved order, and each date runs a scored scan followed
//! by a relaxed fallback fill. A consolidation pass then merges sub-hour
//! fragments before the result is returned.
//!
//! The allocator is deterministic per seed. Two runs with the same seed
//! over the same request produce identical output; the seed only feeds
//! the final tie-break between otherwise equally scored candidates.
//!
//! # Reference
//! Pinedo, M. L. (2016). Scheduling: Theory, Algorithms, and Systems
//! (5th ed.), ch. 2 — list scheduling and priority-rule dispatch.

mod context;
mod engine;
mod scoring;
mod targets;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use thiserror::Error;

use crate::consolidate::consolidate;
use crate::models::{ScheduleRequest, ScheduledBlock, TimeBlock};
use crate::validation::{validate_request, ValidationError};

use context::RunState;
use engine::{free_time, interleave_dates, run_date, RunConfig};
use targets::resolve_target;

/// Knobs that change placement behavior without changing the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocOptions {
    /// Prefer candidates that can receive a full hour right now.
    pub bias_longer: bool,
}

/// A request the allocator refuses to run on.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The request failed structural validation; every problem found is
    /// carried, not just the first.
    #[error("invalid schedule request ({} problem(s))", .0.len())]
    InvalidRequest(Vec<ValidationError>),
}

/// The allocation engine. Build one per run configuration; `allocate`
/// takes `&self` and never mutates it, so one allocator can serve many
/// requests.
#[derive(Debug, Clone)]
pub struct GreedyAllocator {
    seed: u64,
    options: AllocOptions,
    locked: HashSet<ScheduledBlock>,
    target_overrides: HashMap<String, i64>,
    closed_days: HashSet<NaiveDate>,
    one_off_exclusions: HashMap<NaiveDate, Vec<TimeBlock>>,
}

impl GreedyAllocator {
    /// Creates an allocator with the given jitter seed and defaults
    /// everywhere else.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            options: AllocOptions::default(),
            locked: HashSet::new(),
            target_overrides: HashMap::new(),
            closed_days: HashSet::new(),
            one_off_exclusions: HashMap::new(),
        }
    }

    /// Sets all options at once.
    pub fn with_options(mut self, options: AllocOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables or disables the bias toward hour-capable candidates.
    pub fn with_bias_longer(mut self, bias: bool) -> Self {
        self.options.bias_longer = bias;
        self
    }

    /// Adds immovable pre-existing blocks. Their spans are excluded from
    /// free time on their dates and they never appear in the output.
    pub fn with_locked_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = ScheduledBlock>,
    {
        self.locked.extend(blocks);
        self
    }

    /// Replaces the derived target for one client with a fixed number of
    /// minutes. Negative values clamp to zero.
    pub fn with_target_override(mut self, client_id: impl Into<String>, minutes: i64) -> Self {
        self.target_overrides.insert(client_id.into(), minutes);
        self
    }

    /// Marks a date fully closed, on top of the supervisor's own
    /// unavailable days.
    pub fn with_closed_day(mut self, date: NaiveDate) -> Self {
        self.closed_days.insert(date);
        self
    }

    /// Marks several dates fully closed.
    pub fn with_closed_days<I>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.closed_days.extend(dates);
        self
    }

    /// Carves a one-off exclusion out of a single date, on top of the
    /// supervisor's own one-offs.
    pub fn with_one_off_exclusion(mut self, date: NaiveDate, block: TimeBlock) -> Self {
        self.one_off_exclusions.entry(date).or_default().push(block);
        self
    }

    /// Runs the allocation and returns the placed blocks in canonical
    /// order (date, start, client).
    ///
    /// # Errors
    ///
    /// [`AllocationError::InvalidRequest`] when the request fails
    /// structural validation.
    pub fn allocate(
        &self,
        request: &ScheduleRequest,
    ) -> Result<Vec<ScheduledBlock>, AllocationError> {
        validate_request(request).map_err(AllocationError::InvalidRequest)?;

        let dates = request.dates();
        let targets: HashMap<String, i64> = request
            .clients
            .iter()
            .map(|c| {
                let over = self.target_overrides.get(&c.id).copied();
                (c.id.clone(), resolve_target(c, &dates, over))
            })
            .collect();

        // Merge the supervisor's own exceptions with the run's.
        let mut closed = self.closed_days.clone();
        closed.extend(request.supervisor.unavailable_days.iter().copied());
        let mut one_offs = request.supervisor.one_off_unavail.clone();
        for (date, blocks) in &self.one_off_exclusions {
            one_offs.entry(*date).or_default().extend(blocks.iter().copied());
        }

        let cfg = RunConfig {
            grid: request.supervisor.effective_grid(),
            bias_longer: self.options.bias_longer,
            end_date: request.end_date,
            closed_days: &closed,
            one_offs: &one_offs,
            locked: &self.locked,
        };

        let mut state = RunState::new(self.seed, targets);
        for date in interleave_dates(request.start_date, request.end_date) {
            let mut free = free_time(request, &cfg, date);
            if free.is_empty() {
                continue;
            }
            run_date(request, &cfg, &mut state, date, &mut free);
        }

        Ok(consolidate(
            request,
            state.blocks,
            &self.locked,
            &closed,
            &one_offs,
        ))
    }
}
