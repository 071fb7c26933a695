//! Structured observability hooks for the scan cycle.
//!
//! Every emitter logs an `event = "..."` field so cycles can be followed in
//! JSON output (`--json`). Verbosity is controlled through `RUST_LOG`.

use tracing::{debug, info, warn};

use crate::business_hours::GateDecision;
use crate::category::CategorizedSet;
use crate::status::AggregateStatus;

/// RAII guard that tags everything logged during one cycle with its sequence
/// number.
pub struct CycleSpan {
    _span: tracing::span::EnteredSpan,
}

impl CycleSpan {
    pub fn enter(cycle: u64) -> Self {
        let span = tracing::info_span!("volcanology.cycle", cycle = cycle);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_cycle_started(cycle: u64) {
    debug!(event = "cycle.started", cycle = cycle);
}

/// The feed failed; nothing was updated this cycle.
pub fn emit_cycle_aborted(cycle: u64, error: &dyn std::fmt::Display) {
    warn!(event = "cycle.aborted", cycle = cycle, error = %error);
}

pub fn emit_cycle_finished(
    cycle: u64,
    status: AggregateStatus,
    jobs: &CategorizedSet,
    persisted_failures: usize,
) {
    info!(
        event = "cycle.finished",
        cycle = cycle,
        status = %status,
        failing = jobs.failing.len(),
        success = jobs.success.len(),
        building = jobs.building.len(),
        other = jobs.other.len(),
        persisted_failures = persisted_failures,
    );
}

pub fn emit_gate_closed(decision: GateDecision) {
    info!(event = "gate.closed", reason = decision.as_str());
}

pub fn emit_failures_outstanding(failed: &std::collections::BTreeSet<String>) {
    info!(event = "jobs.failed", jobs = ?failed);
}

pub fn emit_streak_detected(job: &str, threshold: u32) {
    info!(event = "streak.detected", job = %job, threshold = threshold);
}

pub fn emit_indicator_dispatched(device: &str, action: &str) {
    debug!(event = "indicator.dispatched", device = %device, action = %action);
}

pub fn emit_indicator_failed(device: &str, error: &dyn std::fmt::Display) {
    warn!(event = "indicator.failed", device = %device, error = %error);
}
