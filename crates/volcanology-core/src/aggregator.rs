//! One scan cycle: categorize, update cross-cycle state, gate, reduce.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::business_hours::{BusinessHoursGate, GateDecision};
use crate::category::{categorize, CategorizedSet, JobReport, StatusCodeMap};
use crate::error::Result;
use crate::feed::JobFeed;
use crate::holiday::HolidayCalendar;
use crate::obs;
use crate::scan_state::ScanState;
use crate::status::AggregateStatus;

/// Streak threshold used when none is configured.
pub const DEFAULT_STREAK_THRESHOLD: u32 = 6;

/// Result of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Sequence number, starting at 1. Aborted cycles consume a number too.
    pub cycle: u64,
    pub status: AggregateStatus,
    pub gate: GateDecision,
    /// This cycle's categorization.
    pub jobs: CategorizedSet,
    /// Jobs failed and not yet succeeded again, after this cycle.
    pub persisted_failures: BTreeSet<String>,
    /// Job whose streak fired, when `status` is `SuccessStreak`.
    pub streak_job: Option<String>,
}

/// Owns the scan state and reduces each cycle's reports to a status.
///
/// Cycles take `&mut self`, so two can never run at once.
pub struct Aggregator {
    code_map: StatusCodeMap,
    gate: BusinessHoursGate,
    calendar: Box<dyn HolidayCalendar>,
    streak_threshold: u32,
    state: ScanState,
    last_jobs: CategorizedSet,
    cycles: u64,
}

impl Aggregator {
    pub fn new(
        code_map: StatusCodeMap,
        gate: BusinessHoursGate,
        calendar: Box<dyn HolidayCalendar>,
        streak_threshold: u32,
    ) -> Self {
        Self {
            code_map,
            gate,
            calendar,
            streak_threshold,
            state: ScanState::new(),
            last_jobs: CategorizedSet::default(),
            cycles: 0,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Categorization of the last completed cycle.
    pub fn last_jobs(&self) -> &CategorizedSet {
        &self.last_jobs
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn streak_threshold(&self) -> u32 {
        self.streak_threshold
    }

    /// Fetch from `feed` and run a cycle. A fetch error aborts the cycle
    /// before any state is touched.
    pub async fn scan(&mut self, feed: &dyn JobFeed, now: NaiveDateTime) -> Result<CycleReport> {
        let cycle = self.begin_cycle();
        let reports = match feed.fetch_jobs().await {
            Ok(reports) => reports,
            Err(e) => {
                obs::emit_cycle_aborted(cycle, &e);
                return Err(e);
            }
        };
        Ok(self.run_cycle(cycle, &reports, now))
    }

    /// Run a cycle over an already fetched snapshot.
    pub fn apply(&mut self, reports: &[JobReport], now: NaiveDateTime) -> CycleReport {
        let cycle = self.begin_cycle();
        self.run_cycle(cycle, reports, now)
    }

    fn begin_cycle(&mut self) -> u64 {
        self.cycles += 1;
        obs::emit_cycle_started(self.cycles);
        self.cycles
    }

    fn run_cycle(&mut self, cycle: u64, reports: &[JobReport], now: NaiveDateTime) -> CycleReport {
        let _span = obs::CycleSpan::enter(cycle);

        let previous_building = std::mem::take(&mut self.last_jobs.building);
        let jobs = categorize(reports, &self.code_map);

        self.state.observe_transitions(&previous_building, &jobs);
        self.state.update_failures(&jobs);

        // Any outstanding failure wipes streak memory, whether or not the
        // gate is open.
        let failing = self.state.reset_streaks_if_failing();

        let gate = self.gate.evaluate(now, self.calendar.as_ref());
        let mut streak_job = None;
        let status = if gate != GateDecision::Live {
            obs::emit_gate_closed(gate);
            AggregateStatus::Off
        } else if failing {
            obs::emit_failures_outstanding(self.state.failed());
            AggregateStatus::Failure
        } else {
            debug!(building = ?jobs.building, "nothing failed");
            match self.state.take_streak(self.streak_threshold) {
                Some(job) => {
                    obs::emit_streak_detected(&job, self.streak_threshold);
                    streak_job = Some(job);
                    AggregateStatus::SuccessStreak
                }
                None => AggregateStatus::Success,
            }
        };

        obs::emit_cycle_finished(cycle, status, &jobs, self.state.failed().len());
        self.last_jobs = jobs.clone();

        CycleReport {
            cycle,
            status,
            gate,
            jobs,
            persisted_failures: self.state.failed().clone(),
            streak_job,
        }
    }
}
