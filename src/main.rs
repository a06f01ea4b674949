use std::time::Duration;

use anyhow::Result;
use deptime::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::error;

/// Reading stdin parks a blocking thread that never finishes on its own.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(200);

fn main() -> Result<()> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli());
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);

    result.inspect_err(|e| {
        error!("Error running cli {e:?}");
    })
}
