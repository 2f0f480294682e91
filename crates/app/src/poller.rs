//! Periodic poll ticks.
//!
//! The [`Poller`] only submits [`Job::Poll`] to the worker queue; the poll
//! cycle itself runs on the worker, serialized with inbound messages.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::worker::Job;

/// Shortest accepted poll interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(60);

/// Convert a poll interval in minutes, clamped to [`MIN_INTERVAL`].
#[must_use]
pub fn interval_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60)).max(MIN_INTERVAL)
}

/// Background task submitting a poll job at a configurable interval.
pub struct Poller {
    jobs: mpsc::Sender<Job>,
    interval: watch::Receiver<Duration>,
}

impl Poller {
    /// Spawn the poller. The first tick fires immediately.
    ///
    /// The task stops when the worker queue is closed.
    pub fn start(jobs: mpsc::Sender<Job>, interval: watch::Receiver<Duration>) -> JoinHandle<()> {
        let poller = Self { jobs, interval };
        tokio::spawn(poller.run())
    }

    async fn run(mut self) {
        let mut period = (*self.interval.borrow_and_update()).max(MIN_INTERVAL);
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut follow_changes = true;
        tracing::info!(period_secs = period.as_secs(), "poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.jobs.send(Job::Poll).await.is_err() {
                        tracing::debug!("worker queue closed, stopping poller");
                        return;
                    }
                }
                changed = self.interval.changed(), if follow_changes => {
                    if changed.is_err() {
                        // sender dropped, the current period stays
                        follow_changes = false;
                        continue;
                    }
                    let next = (*self.interval.borrow_and_update()).max(MIN_INTERVAL);
                    if next != period {
                        period = next;
                        ticker = time::interval_at(Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        tracing::info!(period_secs = period.as_secs(), "poll interval changed");
                    }
                }
            }
        }
    }
}
