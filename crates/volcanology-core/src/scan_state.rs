//! Cross-cycle memory: persisted failures and per-job success streaks.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::category::CategorizedSet;

/// State carried from one scan cycle to the next.
///
/// A job that fails stays failed until a cycle reports it as a success;
/// dropping out of the report does not clear it. Streak counters track
/// consecutive `Building -> Success` transitions per job.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    failed: BTreeSet<String>,
    success_counts: BTreeMap<String, u32>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record completed builds.
    ///
    /// For each job that was building last cycle and is not building now:
    /// a success increments its counter, anything else resets it to 0.
    pub fn observe_transitions(
        &mut self,
        previous_building: &BTreeSet<String>,
        current: &CategorizedSet,
    ) {
        for job in previous_building.difference(&current.building) {
            if current.success.contains(job) {
                let count = self.success_counts.entry(job.clone()).or_insert(0);
                *count += 1;
                debug!(job = %job, count = *count, "incremented success count");
            } else {
                self.success_counts.insert(job.clone(), 0);
            }
        }
    }

    /// Add this cycle's failing jobs, then clear those reported as success.
    pub fn update_failures(&mut self, current: &CategorizedSet) {
        self.failed.extend(current.failing.iter().cloned());
        self.failed.retain(|job| !current.success.contains(job));
    }

    /// Drop all streak memory if any job is still failed. Returns whether
    /// anything is failed.
    pub fn reset_streaks_if_failing(&mut self) -> bool {
        if self.failed.is_empty() {
            return false;
        }
        self.success_counts.clear();
        true
    }

    /// Fire at most one streak.
    ///
    /// Returns false (and clears every counter) while any job is failed.
    /// Otherwise the first job, in name order, whose counter is strictly
    /// above `threshold` has its counter reset to 0 and true is returned.
    pub fn detect_streak(&mut self, threshold: u32) -> bool {
        self.take_streak(threshold).is_some()
    }

    /// Like [`detect_streak`](Self::detect_streak) but reports which job fired.
    pub fn take_streak(&mut self, threshold: u32) -> Option<String> {
        if self.reset_streaks_if_failing() {
            return None;
        }
        let (job, count) = self
            .success_counts
            .iter_mut()
            .find(|(_, count)| **count > threshold)?;
        *count = 0;
        Some(job.clone())
    }

    pub fn failed(&self) -> &BTreeSet<String> {
        &self.failed
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn success_count(&self, job: &str) -> Option<u32> {
        self.success_counts.get(job).copied()
    }

    pub fn success_counts(&self) -> &BTreeMap<String, u32> {
        &self.success_counts
    }
}
