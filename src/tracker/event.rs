use std::future::Future;

use anyhow::Result;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

use crate::config::Departments;

use super::{
    reducer::Direction,
    state::{Department, TrackerState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
    Today,
}

/// Everything that can reach the tracker through its queue. Ticks and user input share the queue,
/// so they are applied strictly one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// Whole seconds that passed since the previous credited tick.
    Elapsed(u64),
    Toggle(Department),
    Adjust(Department, Direction),
    Navigate(Navigation),
    /// Asks the presentation to draw the current state again.
    Refresh,
}

impl TrackerEvent {
    /// Whether the event comes from a person looking at the screen, which is when the board is
    /// redrawn.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, TrackerEvent::Elapsed(_))
    }
}

/// Draws tracker state. Called after every interactive event.
pub trait Presenter {
    fn present(&mut self, state: &TrackerState, departments: &Departments);
}

/// Produces user events, e.g. from a terminal. Cancelling `shutdown` from inside stops the whole
/// tracker.
pub trait CommandSource {
    fn run(
        self,
        sender: Sender<TrackerEvent>,
        shutdown: CancellationToken,
    ) -> impl Future<Output = Result<()>>;
}
