//! The single signal produced by each scan cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Aggregate status of the whole job fleet for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateStatus {
    /// Outside business hours; all indicators dark.
    #[serde(rename = "off")]
    Off,
    /// At least one job has failed and not yet succeeded again.
    #[serde(rename = "failure")]
    Failure,
    /// Nothing failed.
    #[serde(rename = "success")]
    Success,
    /// Nothing failed and a job just completed a run of successful builds.
    #[serde(rename = "successStreak")]
    SuccessStreak,
}

impl AggregateStatus {
    /// Wire value sent to status trackers.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateStatus::Off => "off",
            AggregateStatus::Failure => "failure",
            AggregateStatus::Success => "success",
            AggregateStatus::SuccessStreak => "successStreak",
        }
    }

    /// `SuccessStreak` counts as success for on/off devices.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            AggregateStatus::Success | AggregateStatus::SuccessStreak
        )
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(AggregateStatus::SuccessStreak.as_str(), "successStreak");
        assert_eq!(
            serde_json::to_string(&AggregateStatus::SuccessStreak).unwrap(),
            "\"successStreak\""
        );
        assert_eq!(AggregateStatus::Off.to_string(), "off");
    }

    #[test]
    fn test_streak_is_success() {
        assert!(AggregateStatus::SuccessStreak.is_success());
        assert!(AggregateStatus::Success.is_success());
        assert!(!AggregateStatus::Failure.is_success());
        assert!(!AggregateStatus::Off.is_success());
    }
}
