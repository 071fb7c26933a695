//! Fan-out of the aggregate status to indicator devices.
//!
//! Two kinds of device exist. A [`Switch`] is on/off (a lamp on a smart
//! outlet) and is assigned the failure role, the success role, or both.
//! A [`StatusTracker`] receives the status value itself.
//!
//! Routing:
//! - `Failure`: failure switches on, success switches off
//! - `Success` / `SuccessStreak`: success switches on, failure switches off
//! - `Off`: every switch off
//!
//! Trackers receive every status, including `Off`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ScanError};
use crate::obs;
use crate::status::AggregateStatus;

/// An on/off indicator.
#[async_trait]
pub trait Switch: Send + Sync {
    fn name(&self) -> &str;
    async fn turn_on(&self) -> Result<()>;
    async fn turn_off(&self) -> Result<()>;
}

/// A device that is told the status value.
#[async_trait]
pub trait StatusTracker: Send + Sync {
    fn name(&self) -> &str;
    async fn update_status(&self, status: AggregateStatus) -> Result<()>;
}

/// Role a device plays in routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    SignalsFailure,
    SignalsSuccess,
    TracksStatus,
}

/// What one dispatch did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub turned_on: Vec<String>,
    pub turned_off: Vec<String>,
    pub tracked: Vec<String>,
    /// Devices whose command failed.
    pub failed: Vec<String>,
    /// True when the master switch was off and nothing was touched.
    pub skipped: bool,
}

impl DispatchSummary {
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Routes an [`AggregateStatus`] to the configured devices.
pub struct IndicatorRouter {
    enabled: bool,
    switches: BTreeMap<String, Arc<dyn Switch>>,
    failure: Vec<Arc<dyn Switch>>,
    success: Vec<Arc<dyn Switch>>,
    trackers: Vec<Arc<dyn StatusTracker>>,
}

impl IndicatorRouter {
    pub fn builder() -> IndicatorRouterBuilder {
        IndicatorRouterBuilder::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub fn tracker_count(&self) -> usize {
        self.trackers.len()
    }

    /// Send `status` to every device. Device errors are logged and collected;
    /// they never stop the remaining devices from being updated.
    pub async fn dispatch(&self, status: AggregateStatus) -> DispatchSummary {
        info!(status = %status, "indicating overall status");
        let mut summary = DispatchSummary::default();

        if !self.enabled {
            info!("indicators disabled");
            summary.skipped = true;
            return summary;
        }

        if status == AggregateStatus::Off {
            let all: Vec<Arc<dyn Switch>> = self.switches.values().cloned().collect();
            switch_all(&all, false, &mut summary).await;
        } else if status.is_success() {
            switch_all(&self.success, true, &mut summary).await;
            switch_all(&self.failure, false, &mut summary).await;
        } else {
            switch_all(&self.failure, true, &mut summary).await;
            switch_all(&self.success, false, &mut summary).await;
        }

        for tracker in &self.trackers {
            match tracker.update_status(status).await {
                Ok(()) => {
                    obs::emit_indicator_dispatched(tracker.name(), status.as_str());
                    summary.tracked.push(tracker.name().to_string());
                }
                Err(e) => {
                    obs::emit_indicator_failed(tracker.name(), &e);
                    summary.failed.push(tracker.name().to_string());
                }
            }
        }

        summary
    }
}

async fn switch_all(switches: &[Arc<dyn Switch>], on: bool, summary: &mut DispatchSummary) {
    for switch in switches {
        let result = if on {
            switch.turn_on().await
        } else {
            switch.turn_off().await
        };
        let name = switch.name().to_string();
        match result {
            Ok(()) => {
                obs::emit_indicator_dispatched(&name, if on { "on" } else { "off" });
                if on {
                    summary.turned_on.push(name);
                } else {
                    summary.turned_off.push(name);
                }
            }
            Err(e) => {
                obs::emit_indicator_failed(&name, &e);
                summary.failed.push(name);
            }
        }
    }
}

/// Collects devices and role assignments, then validates them.
#[derive(Default)]
pub struct IndicatorRouterBuilder {
    enabled: bool,
    switches: BTreeMap<String, Arc<dyn Switch>>,
    trackers: BTreeMap<String, Arc<dyn StatusTracker>>,
    failure: Vec<String>,
    success: Vec<String>,
    status: Option<Vec<String>>,
}

impl IndicatorRouterBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn switch(mut self, switch: Arc<dyn Switch>) -> Self {
        self.switches.insert(switch.name().to_string(), switch);
        self
    }

    pub fn tracker(mut self, tracker: Arc<dyn StatusTracker>) -> Self {
        self.trackers.insert(tracker.name().to_string(), tracker);
        self
    }

    /// Give the named device a role.
    pub fn assign(mut self, name: impl Into<String>, role: DeviceRole) -> Self {
        let name = name.into();
        match role {
            DeviceRole::SignalsFailure => self.failure.push(name),
            DeviceRole::SignalsSuccess => self.success.push(name),
            DeviceRole::TracksStatus => self.status.get_or_insert_with(Vec::new).push(name),
        }
        self
    }

    /// Restrict status updates to the named trackers. Without this every
    /// registered tracker is updated.
    pub fn status_trackers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Fails when a role names a device that was never registered.
    pub fn build(self) -> Result<IndicatorRouter> {
        let resolve = |names: &[String], role: &str| -> Result<Vec<Arc<dyn Switch>>> {
            names
                .iter()
                .map(|name| {
                    self.switches.get(name).cloned().ok_or_else(|| {
                        ScanError::Configuration(format!(
                            "{} indicator '{}' is not a configured switch",
                            role, name
                        ))
                    })
                })
                .collect()
        };
        let failure = resolve(&self.failure, "failure")?;
        let success = resolve(&self.success, "success")?;

        let trackers = match &self.status {
            None => self.trackers.values().cloned().collect(),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.trackers.get(name).cloned().ok_or_else(|| {
                        ScanError::Configuration(format!(
                            "status indicator '{}' is not a configured tracker",
                            name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(IndicatorRouter {
            enabled: self.enabled,
            switches: self.switches,
            failure,
            success,
            trackers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{RecordingSwitch, RecordingTracker, SwitchState};

    fn router() -> (
        IndicatorRouter,
        Arc<RecordingSwitch>,
        Arc<RecordingSwitch>,
        Arc<RecordingTracker>,
    ) {
        let red = Arc::new(RecordingSwitch::new("red"));
        let green = Arc::new(RecordingSwitch::new("green"));
        let bubbles = Arc::new(RecordingTracker::new("bubbles"));
        let router = IndicatorRouter::builder()
            .enabled(true)
            .switch(red.clone())
            .switch(green.clone())
            .tracker(bubbles.clone())
            .assign("red", DeviceRole::SignalsFailure)
            .assign("green", DeviceRole::SignalsSuccess)
            .build()
            .unwrap();
        (router, red, green, bubbles)
    }

    #[tokio::test]
    async fn test_failure_routing() {
        let (router, red, green, bubbles) = router();
        let summary = router.dispatch(AggregateStatus::Failure).await;
        assert_eq!(red.state(), SwitchState::On);
        assert_eq!(green.state(), SwitchState::Off);
        assert_eq!(bubbles.statuses(), vec![AggregateStatus::Failure]);
        assert!(summary.all_ok());
    }

    #[tokio::test]
    async fn test_streak_routes_like_success_but_tracks_distinct_value() {
        let (router, red, green, bubbles) = router();
        router.dispatch(AggregateStatus::SuccessStreak).await;
        assert_eq!(green.state(), SwitchState::On);
        assert_eq!(red.state(), SwitchState::Off);
        assert_eq!(bubbles.statuses(), vec![AggregateStatus::SuccessStreak]);
    }

    #[tokio::test]
    async fn test_off_turns_everything_off() {
        let (router, red, green, bubbles) = router();
        router.dispatch(AggregateStatus::Failure).await;
        let summary = router.dispatch(AggregateStatus::Off).await;
        assert_eq!(red.state(), SwitchState::Off);
        assert_eq!(green.state(), SwitchState::Off);
        assert_eq!(summary.turned_off.len(), 2);
        assert_eq!(bubbles.statuses().last(), Some(&AggregateStatus::Off));
    }

    #[tokio::test]
    async fn test_disabled_router_touches_nothing() {
        let red = Arc::new(RecordingSwitch::new("red"));
        let router = IndicatorRouter::builder()
            .enabled(false)
            .switch(red.clone())
            .assign("red", DeviceRole::SignalsFailure)
            .build()
            .unwrap();
        assert!(!router.is_enabled());
        let summary = router.dispatch(AggregateStatus::Failure).await;
        assert!(summary.skipped);
        assert_eq!(red.state(), SwitchState::Unknown);
        assert_eq!(red.commands(), 0);
    }

    #[tokio::test]
    async fn test_failing_device_does_not_stop_others() {
        let red = Arc::new(RecordingSwitch::failing("red"));
        let green = Arc::new(RecordingSwitch::new("green"));
        let router = IndicatorRouter::builder()
            .enabled(true)
            .switch(red.clone())
            .switch(green.clone())
            .assign("red", DeviceRole::SignalsFailure)
            .assign("green", DeviceRole::SignalsSuccess)
            .build()
            .unwrap();
        let summary = router.dispatch(AggregateStatus::Failure).await;
        assert_eq!(summary.failed, vec!["red".to_string()]);
        assert_eq!(red.commands(), 1);
        assert_eq!(green.state(), SwitchState::Off);
    }

    #[test]
    fn test_unknown_role_target_is_rejected() {
        let result = IndicatorRouter::builder()
            .enabled(true)
            .assign("ghost", DeviceRole::SignalsFailure)
            .build();
        let err = result.err().expect("ghost is not configured");
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn test_status_trackers_can_be_restricted() {
        let a = Arc::new(RecordingTracker::new("a"));
        let b = Arc::new(RecordingTracker::new("b"));
        let router = IndicatorRouter::builder()
            .enabled(true)
            .tracker(a.clone())
            .tracker(b.clone())
            .status_trackers(["b"])
            .build()
            .unwrap();
        router.dispatch(AggregateStatus::Success).await;
        assert!(a.statuses().is_empty());
        assert_eq!(b.statuses(), vec![AggregateStatus::Success]);
    }
}
