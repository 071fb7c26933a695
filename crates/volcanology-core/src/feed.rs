//! Collaborators the aggregation engine reads from: the job feed and the clock.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use crate::category::JobReport;
use crate::error::Result;

/// Source of job reports, one full snapshot per call.
///
/// Implementations return [`ScanError::Fetch`](crate::ScanError::Fetch) when
/// the upstream is unreachable or its response cannot be read. A partial
/// snapshot must never be returned as `Ok`.
#[async_trait]
pub trait JobFeed: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<JobReport>>;
}

/// Wall-clock source, injectable for tests.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
