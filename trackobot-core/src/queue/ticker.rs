//! Cancellable repeating timers driven by the queue's event loop

use std::time::Duration;

use tokio::time::Instant;

/// A repeating timer that can be started, restarted and stopped.
///
/// A ticker never fires on its own. The owning loop waits on
/// [`Ticker::deadline`] and calls [`Ticker::rearm`] once it has handled the
/// tick, so a tick can never interrupt other work.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    deadline: Option<Instant>,
}

impl Ticker {
    /// A stopped ticker
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    /// Start the ticker, or restart it if already active
    pub fn start(&mut self) {
        self.deadline = Some(Instant::now() + self.period);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// When the ticker next fires, if active
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Schedule the next tick one period after the current deadline
    pub fn rearm(&mut self) {
        if let Some(deadline) = self.deadline {
            let next = deadline + self.period;
            // After a long stall, skip missed ticks instead of firing a burst
            self.deadline = Some(next.max(Instant::now()));
        }
    }
}

/// Sleep until `deadline`, or forever if there is none
pub async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
