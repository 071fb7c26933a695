//! Business-hours gate: indicators are only live on working days, within
//! the configured hours.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::holiday::HolidayCalendar;

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Live,
    Holiday,
    Weekend,
    OutsideHours,
}

impl GateDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateDecision::Live => "live",
            GateDecision::Holiday => "holiday",
            GateDecision::Weekend => "weekend",
            GateDecision::OutsideHours => "outside_hours",
        }
    }
}

/// Inclusive `[start_hour, end_hour]` window on weekdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursGate {
    start_hour: u32,
    end_hour: u32,
}

impl BusinessHoursGate {
    pub fn new(start_hour: u32, end_hour: u32) -> crate::Result<Self> {
        if start_hour > 23 || end_hour > 23 {
            return Err(ScanError::Configuration(format!(
                "business hours must be within 0..=23, got {}..={}",
                start_hour, end_hour
            )));
        }
        if start_hour > end_hour {
            return Err(ScanError::Configuration(format!(
                "business hours start {} is after end {}",
                start_hour, end_hour
            )));
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Classify `now`. Holidays take precedence over weekends, which take
    /// precedence over the hour window.
    pub fn evaluate(&self, now: NaiveDateTime, calendar: &dyn HolidayCalendar) -> GateDecision {
        if calendar.is_holiday(now.date()) {
            return GateDecision::Holiday;
        }
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return GateDecision::Weekend;
        }
        let hour = now.hour();
        if hour < self.start_hour || hour > self.end_hour {
            return GateDecision::OutsideHours;
        }
        GateDecision::Live
    }

    pub fn is_live(&self, now: NaiveDateTime, calendar: &dyn HolidayCalendar) -> bool {
        self.evaluate(now, calendar) == GateDecision::Live
    }
}
