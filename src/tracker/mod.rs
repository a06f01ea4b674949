//! The tracker: state, the rules that change it, and the loop that feeds it.

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    config::TrackerConfig,
    storage::{
        json_store::JsonFileStore,
        restore_snapshot,
        saver::{save_channel, SaveHandle, SaveModule},
        StateStore,
    },
    utils::clock::{Clock, DefaultClock},
};

use dispatch::TrackerModule;
use event::{CommandSource, Presenter, TrackerEvent};
use store::TrackerStore;
use tick::TickDriver;

pub mod dispatch;
pub mod event;
pub mod lifecycle;
pub mod reducer;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod tick;

const EVENT_QUEUE_CAPACITY: usize = 64;

/// Represents the starting point for an interactive tracking session. Returns once `commands`
/// finishes or the process is interrupted, after the final state was written.
pub async fn start_tracker(
    dir: PathBuf,
    config: TrackerConfig,
    presenter: impl Presenter,
    commands: impl CommandSource,
) -> Result<()> {
    let storage = JsonFileStore::new(dir)?;
    let shutdown_token = CancellationToken::new();

    let (sender, receiver) = mpsc::channel::<TrackerEvent>(EVENT_QUEUE_CAPACITY);
    let (saves, save_receiver) = save_channel();

    let tracker = create_tracker(
        &storage,
        receiver,
        presenter,
        saves,
        &shutdown_token,
        &config,
        DefaultClock,
    )
    .await;
    let ticker = create_ticker(sender.clone(), &shutdown_token, &config, DefaultClock);
    let saver = SaveModule::new(save_receiver, storage);

    let command_shutdown = shutdown_token.clone();
    let commands = async move {
        let result = commands.run(sender, command_shutdown.clone()).await;
        command_shutdown.cancel();
        result
    };

    let (_, tick_result, command_result, tracker_result, save_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        ticker.run(),
        commands,
        tracker.run(),
        saver.run(),
    );

    if let Err(tick_result) = tick_result {
        error!("Tick driver got an error {:?}", tick_result);
    }

    if let Err(command_result) = command_result {
        error!("Command input got an error {:?}", command_result);
    }

    if let Err(tracker_result) = tracker_result {
        error!("Tracker got an error {:?}", tracker_result);
    }

    if let Err(save_result) = save_result {
        error!("Saving module got an error {:?}", save_result);
    }

    Ok(())
}

fn create_ticker(
    sender: mpsc::Sender<TrackerEvent>,
    shutdown_token: &CancellationToken,
    config: &TrackerConfig,
    clock: impl Clock,
) -> TickDriver {
    TickDriver::new(
        sender,
        shutdown_token.clone(),
        config.tick_interval(),
        Box::new(clock),
    )
}

async fn create_tracker<P: Presenter>(
    storage: &impl StateStore,
    receiver: mpsc::Receiver<TrackerEvent>,
    presenter: P,
    saves: SaveHandle,
    shutdown_token: &CancellationToken,
    config: &TrackerConfig,
    clock: impl Clock,
) -> TrackerModule<P> {
    let snapshot = restore_snapshot(storage).await;
    let store = TrackerStore::new(snapshot, config, Box::new(clock), saves);
    TrackerModule::new(receiver, store, presenter, shutdown_token.clone())
}
