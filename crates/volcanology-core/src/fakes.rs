//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `ScriptedFeed`, `RecordingSwitch`, `RecordingTracker` and
//! `FixedClock`, which satisfy the trait contracts without any I/O.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::category::JobReport;
use crate::error::{Result, ScanError};
use crate::feed::{Clock, JobFeed};
use crate::indicator::{StatusTracker, Switch};
use crate::status::AggregateStatus;

// ---------------------------------------------------------------------------
// ScriptedFeed
// ---------------------------------------------------------------------------

/// Feed that replays a queue of snapshots. Once the queue is drained every
/// fetch fails.
#[derive(Debug, Default)]
pub struct ScriptedFeed {
    script: Mutex<VecDeque<Result<Vec<JobReport>>>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot of `(name, code)` pairs.
    pub fn push_jobs(&self, jobs: &[(&str, &str)]) {
        let reports = jobs
            .iter()
            .map(|(name, code)| JobReport::new(*name, *code))
            .collect();
        self.script.lock().unwrap().push_back(Ok(reports));
    }

    /// Queue a fetch failure.
    pub fn push_failure(&self, reason: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(ScanError::Fetch(reason.to_string())));
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl JobFeed for ScriptedFeed {
    async fn fetch_jobs(&self) -> Result<Vec<JobReport>> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ScanError::Fetch("script exhausted".to_string())))
    }
}

// ---------------------------------------------------------------------------
// RecordingSwitch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    Unknown,
    On,
    Off,
}

/// Switch that remembers its last commanded state.
#[derive(Debug)]
pub struct RecordingSwitch {
    name: String,
    fail: bool,
    state: Mutex<SwitchState>,
    commands: Mutex<usize>,
}

impl RecordingSwitch {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail: false,
            state: Mutex::new(SwitchState::Unknown),
            commands: Mutex::new(0),
        }
    }

    /// A switch whose every command errors.
    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn state(&self) -> SwitchState {
        *self.state.lock().unwrap()
    }

    pub fn commands(&self) -> usize {
        *self.commands.lock().unwrap()
    }

    fn set(&self, state: SwitchState) -> Result<()> {
        *self.commands.lock().unwrap() += 1;
        if self.fail {
            return Err(ScanError::Device {
                device: self.name.clone(),
                reason: "unreachable".to_string(),
            });
        }
        *self.state.lock().unwrap() = state;
        Ok(())
    }
}

#[async_trait]
impl Switch for RecordingSwitch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn turn_on(&self) -> Result<()> {
        self.set(SwitchState::On)
    }

    async fn turn_off(&self) -> Result<()> {
        self.set(SwitchState::Off)
    }
}

// ---------------------------------------------------------------------------
// RecordingTracker
// ---------------------------------------------------------------------------

/// Tracker that keeps every status it was sent.
#[derive(Debug)]
pub struct RecordingTracker {
    name: String,
    statuses: Mutex<Vec<AggregateStatus>>,
}

impl RecordingTracker {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            statuses: Mutex::new(Vec::new()),
        }
    }

    pub fn statuses(&self) -> Vec<AggregateStatus> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusTracker for RecordingTracker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn update_status(&self, status: AggregateStatus) -> Result<()> {
        self.statuses.lock().unwrap().push(status);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FixedClock
// ---------------------------------------------------------------------------

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}
