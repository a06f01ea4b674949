//! Persistence of [TrackerState].
//!  - The whole state lives in a single JSON file, rewritten after transitions.
//!  - Storage is best effort. Nothing in here is allowed to stop the tracker: a state that can't
//!    be loaded means starting fresh, and a failed save is retried with the next transition.

pub mod json_store;
pub mod saver;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use crate::tracker::state::TrackerState;

/// Interface for abstracting the place tracker state is kept in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Returns the last saved state, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<TrackerState>>;

    async fn save(&self, state: &TrackerState) -> Result<()>;
}

/// Loads the last snapshot, treating any failure as if there was none.
pub async fn restore_snapshot(store: &impl StateStore) -> Option<TrackerState> {
    match store.load().await {
        Ok(Some(v)) => Some(v),
        Ok(None) => {
            info!("No saved state found");
            None
        }
        Err(e) => {
            error!("Failed to load saved state, starting fresh {e:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::NaiveDate;

    use super::{restore_snapshot, MockStateStore};
    use crate::tracker::state::TrackerState;

    #[tokio::test]
    async fn failed_load_is_no_snapshot() {
        let mut store = MockStateStore::new();
        store
            .expect_load()
            .returning(|| Err(anyhow!("storage unavailable")));
        assert_eq!(restore_snapshot(&store).await, None);
    }

    #[tokio::test]
    async fn successful_load_is_passed_through() {
        let state = TrackerState::fresh(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let returned = state.clone();
        let mut store = MockStateStore::new();
        store
            .expect_load()
            .returning(move || Ok(Some(returned.clone())));
        assert_eq!(restore_snapshot(&store).await, Some(state));
    }
}
