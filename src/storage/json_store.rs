use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, warn};

use crate::tracker::state::TrackerState;

use super::StateStore;

pub const STATE_FILE_NAME: &str = "state.json";
const LOCK_FILE_NAME: &str = "state.lock";
const TEMP_SUFFIX: &str = "tmp";
const CORRUPT_SUFFIX: &str = "corrupt";

/// The main realization of [StateStore]. State is written to a temporary file and renamed over
/// `state.json`, so readers see either the old or the new state. A separate lock file keeps two
/// tracker processes from interleaving.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE_NAME)
    }

    async fn open_lock(&self) -> Result<File, std::io::Error> {
        File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE_NAME))
            .await
    }

    async fn read_state(path: &Path) -> Result<Option<String>, std::io::Error> {
        match tokio::fs::read_to_string(path).await {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_state(path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
        let temp_path = path.with_extension(format!("json.{TEMP_SUFFIX}"));
        let mut file = File::create(&temp_path).await?;
        file.write_all(content).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, path).await
    }

    /// Keeps an unreadable state file around for inspection instead of letting the next save
    /// overwrite it.
    async fn move_aside(path: &Path) {
        let target = path.with_extension(format!("json.{CORRUPT_SUFFIX}"));
        match tokio::fs::rename(path, &target).await {
            Ok(_) => warn!("Moved unreadable state to {target:?}"),
            Err(e) => warn!("Failed to move unreadable state {path:?} aside {e}"),
        }
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<Option<TrackerState>> {
        let path = self.state_path();
        debug!("Loading {path:?}");
        let lock = self.open_lock().await?;
        lock.lock_shared()?;
        let content = Self::read_state(&path).await;
        lock.unlock_async().await?;

        let Some(content) = content? else {
            return Ok(None);
        };
        match serde_json::from_str::<TrackerState>(&content) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!("State file {path:?} is not valid: {e}");
                Self::move_aside(&path).await;
                Err(e.into())
            }
        }
    }

    async fn save(&self, state: &TrackerState) -> Result<()> {
        let buffer = serde_json::to_vec_pretty(state)?;
        let lock = self.open_lock().await?;
        // Semi-safe acquire-release for a file
        lock.lock_exclusive()?;
        let result = Self::write_state(&self.state_path(), &buffer).await;
        lock.unlock_async().await?;
        result?;
        debug!("Saved state for {} days", state.timers.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::{JsonFileStore, STATE_FILE_NAME};
    use crate::{
        storage::StateStore,
        tracker::state::{Department, TimerRecord, TrackerState},
    };

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_state() -> TrackerState {
        let mut state = TrackerState::fresh(date(2));
        state.timers.entry(date(1)).or_default().insert(
            Department::from("Public Safety"),
            TimerRecord {
                is_active: false,
                time: 3600,
            },
        );
        state.timers.entry(date(2)).or_default().insert(
            Department::from("E&E"),
            TimerRecord {
                is_active: true,
                time: 17,
            },
        );
        state
    }

    #[tokio::test]
    async fn saved_state_loads_back() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        let state = sample_state();

        store.save(&state).await?;
        let loaded = store.load().await?.expect("state was saved");

        assert_eq!(loaded.timers, state.timers);
        Ok(())
    }

    #[tokio::test]
    async fn later_saves_replace_earlier_ones() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        store.save(&sample_state()).await?;

        let newer = TrackerState::fresh(date(3));
        store.save(&newer).await?;

        assert_eq!(store.load().await?, Some(newer));
        Ok(())
    }

    #[tokio::test]
    async fn missing_state_is_none() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("nested"))?;
        assert_eq!(store.load().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_state_is_moved_aside() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        std::fs::write(dir.path().join(STATE_FILE_NAME), "{\"currentDate\": 12")?;

        assert!(store.load().await.is_err());
        assert!(!dir.path().join(STATE_FILE_NAME).exists());
        assert!(dir.path().join("state.json.corrupt").exists());
        assert_eq!(store.load().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn reads_state_written_by_hand() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        std::fs::write(
            dir.path().join(STATE_FILE_NAME),
            r#"{"currentDate":"2023-12-31","timers":{"2023-12-31":{"CVCC":{"isActive":false,"time":905}}}}"#,
        )?;

        let loaded = store.load().await?.expect("state exists");
        assert_eq!(
            loaded.timers[&NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()][&Department::from("CVCC")]
                .time,
            905
        );
        Ok(())
    }
}
