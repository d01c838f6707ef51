//! Periodic refresh of every tracked repository.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use super::engine::Tracker;
use super::types::DEFAULT_REFRESH_INTERVAL;

/// Runs [`Tracker::refresh_all_tracked`] on a fixed interval until cancelled.
///
/// Passes never overlap: a pass that outlasts the interval delays the next
/// tick instead of queueing a burst.
pub struct RefreshScheduler {
    tracker: Arc<Tracker>,
    interval: Duration,
    run_immediately: bool,
    cancel: CancellationToken,
}

impl RefreshScheduler {
    pub fn new(tracker: Arc<Tracker>, cancel: CancellationToken) -> Self {
        Self {
            tracker,
            interval: DEFAULT_REFRESH_INTERVAL,
            run_immediately: false,
            cancel,
        }
    }

    /// Set the interval between passes. A zero interval keeps the default.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            tracing::warn!("Ignoring zero refresh interval");
        } else {
            self.interval = interval;
        }
        self
    }

    /// Run the first pass right away instead of after one interval.
    #[must_use]
    pub fn run_immediately(mut self, yes: bool) -> Self {
        self.run_immediately = yes;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until the cancellation token fires. Returns the number of
    /// completed passes.
    pub async fn run(self) -> usize {
        let start = if self.run_immediately {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            run_immediately = self.run_immediately,
            "Refresh scheduler started"
        );

        let mut passes = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!(passes, "Refresh scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let summary = self.tracker.refresh_all_tracked().await;
            passes += 1;
            tracing::debug!(
                pass = passes,
                refreshed = summary.refreshed,
                failed = summary.failed,
                "Scheduled refresh finished"
            );
        }

        passes
    }

    pub fn spawn(self) -> JoinHandle<usize> {
        tokio::spawn(self.run())
    }
}
