//! Timed driver: run a cycle, dispatch the result, repeat.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::aggregator::{Aggregator, CycleReport};
use crate::error::Result;
use crate::feed::{Clock, JobFeed};
use crate::indicator::{DispatchSummary, IndicatorRouter};

/// Polling period used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// A completed cycle and what the indicators did with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub report: CycleReport,
    pub dispatch: DispatchSummary,
}

/// Couples the aggregator with its feed, indicators and clock.
pub struct Scanner {
    aggregator: Aggregator,
    feed: Arc<dyn JobFeed>,
    router: Arc<IndicatorRouter>,
    clock: Arc<dyn Clock>,
}

impl Scanner {
    pub fn new(
        aggregator: Aggregator,
        feed: Arc<dyn JobFeed>,
        router: Arc<IndicatorRouter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            aggregator,
            feed,
            router,
            clock,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Run one cycle. When the feed fails nothing is dispatched and the
    /// error is returned.
    pub async fn tick(&mut self) -> Result<CycleOutcome> {
        let now = self.clock.now();
        let report = self.aggregator.scan(self.feed.as_ref(), now).await?;
        let dispatch = self.router.dispatch(report.status).await;
        Ok(CycleOutcome { report, dispatch })
    }

    /// Tick every `period` until `shutdown` resolves. A failed cycle is
    /// logged and the loop carries on. Returns the number of cycles started.
    pub async fn run<F>(&mut self, period: Duration, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(period_secs = period.as_secs(), "scanner started");
        let started = self.aggregator.cycles();
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("scanner shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        error!(error = %e, "exception in scan cycle");
                    }
                }
            }
        }
        self.aggregator.cycles() - started
    }
}
