use anyhow::Result;
use tokio::sync::watch::{self, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::tracker::state::TrackerState;

use super::StateStore;

/// Creates the link between the tracker, which schedules saves, and the [SaveModule] that
/// performs them.
pub fn save_channel() -> (SaveHandle, Receiver<Option<TrackerState>>) {
    let (sender, receiver) = watch::channel(None);
    (SaveHandle { sender }, receiver)
}

/// Sending side of the save queue. The queue holds a single slot: scheduling never waits and
/// replaces a snapshot that was not written yet, so the pending one is always the newest.
pub struct SaveHandle {
    sender: Sender<Option<TrackerState>>,
}

impl SaveHandle {
    pub fn schedule(&self, state: &TrackerState) {
        if self.sender.send(Some(state.clone())).is_err() {
            warn!("Save queue is closed, snapshot is not saved");
        }
    }

    /// Hands over the last snapshot and closes the queue. The [SaveModule] writes it before it
    /// stops.
    pub fn flush(self, state: TrackerState) {
        if self.sender.send(Some(state)).is_err() {
            warn!("Save queue is closed, final snapshot is not saved");
        }
    }
}

/// Writes snapshots received from the tracker into a [StateStore]. Failures are logged and the
/// module keeps going: the next snapshot is another attempt.
pub struct SaveModule<S> {
    receiver: Receiver<Option<TrackerState>>,
    store: S,
}

impl<S: StateStore> SaveModule<S> {
    pub fn new(receiver: Receiver<Option<TrackerState>>, store: S) -> Self {
        Self { receiver, store }
    }

    /// Runs until the [SaveHandle] is dropped and its last snapshot is written.
    pub async fn run(mut self) -> Result<()> {
        while self.receiver.changed().await.is_ok() {
            let Some(state) = self.receiver.borrow_and_update().clone() else {
                continue;
            };
            match self.store.save(&state).await {
                Ok(_) => debug!("Saved state for {}", state.current_date),
                Err(e) => error!("Error saving state {e:?}"),
            }
        }
        info!("Save queue closed");
        Ok(())
    }
}
