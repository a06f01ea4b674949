use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::utils::clock::Clock;

use super::{event::TrackerEvent, reducer::Action, state::TrackerState};

/// Turns the passage of time into [TrackerEvent::Elapsed] events, once per `period`.
pub struct TickDriver {
    next: mpsc::Sender<TrackerEvent>,
    shutdown: CancellationToken,
    period: Duration,
    /// Wall-clock moment up to which time has been credited. Only moves in whole seconds, so
    /// fractions left over by one firing count towards the next. Kept on the wall clock because
    /// the monotonic one stands still while the machine sleeps.
    last_tick: DateTime<Utc>,
    time_provider: Box<dyn Clock>,
}

impl TickDriver {
    pub fn new(
        next: mpsc::Sender<TrackerEvent>,
        shutdown: CancellationToken,
        period: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            shutdown,
            period,
            last_tick: time_provider.time(),
            time_provider,
        }
    }

    /// Whole seconds between the last credited moment and `now`. Credits them when there are any.
    /// A clock that went backwards credits nothing until it catches up again.
    pub fn fire(&mut self, now: DateTime<Utc>) -> u64 {
        let elapsed = (now - self.last_tick).num_seconds();
        if elapsed <= 0 {
            return 0;
        }
        self.last_tick += TimeDelta::seconds(elapsed);
        elapsed as u64
    }

    /// Executes the tick loop until `shutdown` is cancelled or the tracker stops listening.
    pub async fn run(mut self) -> Result<()> {
        let mut firing_point = self.time_provider.instant();
        loop {
            firing_point += self.period;

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(firing_point) => ()
            }

            let now = self.time_provider.instant();
            if firing_point < now {
                // Woken late. Missed firings are not replayed, the next one credits the whole gap.
                firing_point = now;
            }

            let elapsed = self.fire(self.time_provider.time());
            if elapsed == 0 {
                continue;
            }
            trace!("Crediting {elapsed}s");
            if self.next.send(TrackerEvent::Elapsed(elapsed)).await.is_err() {
                debug!("Tracker stopped listening for ticks");
                return Ok(());
            }
        }
    }
}

/// Increments owed to the running departments of the current date for `elapsed` seconds.
pub fn tick_actions(state: &TrackerState, elapsed: u64) -> Vec<Action> {
    let active = state.active_departments().cloned().collect::<Vec<_>>();
    if active.len() > 1 {
        warn!("More than one department is running: {active:?}");
    }
    active
        .into_iter()
        .flat_map(|department| (0..elapsed).map(move |_| Action::Increment(department.clone())))
        .collect()
}
