use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancels `cancellation` on ctrl-c. Returns as soon as the token is cancelled, whoever did it.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down");
            cancellation.cancel();
        },
        _ = cancellation.cancelled() => (),
    };
}
