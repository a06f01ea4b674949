use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    event::{Presenter, TrackerEvent},
    store::TrackerStore,
};

/// Single consumer of the tracker queue. Each event is applied completely before the next one is
/// received.
pub struct TrackerModule<P> {
    receiver: Receiver<TrackerEvent>,
    store: TrackerStore,
    presenter: P,
    shutdown: CancellationToken,
}

impl<P: Presenter> TrackerModule<P> {
    pub fn new(
        receiver: Receiver<TrackerEvent>,
        store: TrackerStore,
        presenter: P,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            store,
            presenter,
            shutdown,
        }
    }

    pub fn store(&self) -> &TrackerStore {
        &self.store
    }

    pub async fn run(mut self) -> Result<()> {
        self.presenter
            .present(self.store.snapshot(), self.store.departments());
        loop {
            let event = tokio::select! {
                biased;
                // Nothing is applied once shutdown was requested, even if events are queued.
                _ = self.shutdown.cancelled() => break,
                event = self.receiver.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            debug!("Processing event {:?}", event);
            let interactive = event.is_interactive();
            self.store.handle(event);
            if interactive {
                self.presenter
                    .present(self.store.snapshot(), self.store.departments());
            }
        }

        info!("Tracker loop finished");
        self.receiver.close();
        self.store.close();
        Ok(())
    }
}
