//! Periodic background tasks
//!
//! Each task owns a tokio interval loop. Every tick runs as its own tokio
//! task, so a panicking tick is logged and the loop carries on. Dropping the
//! handle aborts the loop and the tick it has in flight.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Smallest period accepted; `tokio::time::interval` rejects zero
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// When a periodic task first fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    /// Fire as soon as the task starts
    Immediate,
    /// Fire one period after the task starts
    AfterPeriod,
}

/// Handle to a spawned periodic task, aborted on drop
pub struct PeriodicTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `tick` every `period` on the current runtime
    ///
    /// A tick that overruns its period delays the next one rather than
    /// bursting to catch up.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, first: FirstTick, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);

        let handle = tokio::spawn(async move {
            let start = match first {
                FirstTick::Immediate => Instant::now(),
                FirstTick::AfterPeriod => Instant::now() + period,
            };
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(task = name, period_ms = period.as_millis() as u64, "Periodic task started");
            loop {
                interval.tick().await;

                let mut current = AbortOnDrop(tokio::spawn(tick()));
                if let Err(e) = (&mut current.0).await {
                    if e.is_panic() {
                        tracing::error!(task = name, error = %e, "Periodic tick panicked");
                    }
                }
            }
        });

        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Aborts the wrapped tick when the loop owning it is aborted
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!(task = self.name, "Periodic task stopped");
    }
}
