//! Volcanology Core - CI status aggregation engine
//!
//! Reduces a Jenkins view's job states into a single signal and routes it
//! to indicator devices:
//! - Classify each job report (`category`)
//! - Remember failures and success streaks across cycles (`scan_state`)
//! - Gate on business hours and holidays (`business_hours`, `holiday`)
//! - Reduce to an [`AggregateStatus`] (`aggregator`)
//! - Fan out to switches and status trackers (`indicator`)
//!
//! I/O lives behind the [`JobFeed`], [`Switch`], [`StatusTracker`] and
//! [`Clock`] traits; concrete adapters are in `volcanology-devices`.

pub mod aggregator;
pub mod business_hours;
pub mod category;
mod error;
pub mod fakes;
pub mod feed;
pub mod holiday;
pub mod indicator;
pub mod obs;
pub mod scan_state;
pub mod scanner;
pub mod status;
pub mod telemetry;

pub use aggregator::{Aggregator, CycleReport, DEFAULT_STREAK_THRESHOLD};
pub use business_hours::{BusinessHoursGate, GateDecision};
pub use category::{categorize, CategorizedSet, Category, JobReport, StatusCodeMap};
pub use error::{Result, ScanError};
pub use feed::{Clock, JobFeed, SystemClock};
pub use holiday::{CombinedCalendar, DateSet, HolidayCalendar, NoHolidays, UsFederalHolidays};
pub use indicator::{
    DeviceRole, DispatchSummary, IndicatorRouter, IndicatorRouterBuilder, StatusTracker, Switch,
};
pub use scan_state::ScanState;
pub use scanner::{CycleOutcome, Scanner, DEFAULT_POLL_INTERVAL};
pub use status::AggregateStatus;
