use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Name of a department timers are kept for. The configured set is closed (see
/// [Departments](crate::config::Departments)), but the identifier itself is not: any name forms a
/// valid key, and callers that care about typos check against the configured set first.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Department(Arc<str>);

impl Department {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Department {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Accumulated seconds for one department on one day.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub time: u64,
}

pub type DayTimers = BTreeMap<Department, TimerRecord>;

/// Everything the tracker knows. Serialized as is into the state file.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub current_date: NaiveDate,
    #[serde(default)]
    pub timers: BTreeMap<NaiveDate, DayTimers>,
}

impl TrackerState {
    /// State for a first run: nothing recorded yet.
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            current_date: today,
            timers: BTreeMap::new(),
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayTimers> {
        self.timers.get(&date)
    }

    pub fn current_day(&self) -> Option<&DayTimers> {
        self.day(self.current_date)
    }

    /// Record for `department` on the current date. Missing records read as zero and inactive.
    pub fn record(&self, department: &Department) -> TimerRecord {
        self.current_day()
            .and_then(|day| day.get(department))
            .copied()
            .unwrap_or_default()
    }

    /// Departments currently running on the current date. Holds at most one entry as long as
    /// state only changes through [transition](super::reducer::transition).
    pub fn active_departments(&self) -> impl Iterator<Item = &Department> {
        self.current_day()
            .into_iter()
            .flat_map(|day| day.iter())
            .filter(|(_, record)| record.is_active)
            .map(|(department, _)| department)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Department, TimerRecord, TrackerState};

    #[test]
    fn state_uses_camel_case_and_date_keys() -> anyhow::Result<()> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut state = TrackerState::fresh(date);
        state.timers.entry(date).or_default().insert(
            Department::from("DCE"),
            TimerRecord {
                is_active: true,
                time: 42,
            },
        );

        let value = serde_json::to_value(&state)?;
        assert_eq!(
            value,
            serde_json::json!({
                "currentDate": "2024-01-01",
                "timers": { "2024-01-01": { "DCE": { "isActive": true, "time": 42 } } }
            })
        );
        Ok(())
    }

    #[test]
    fn partial_records_default_missing_fields() -> anyhow::Result<()> {
        let state: TrackerState = serde_json::from_str(
            r#"{"currentDate":"2024-01-01","timers":{"2024-01-01":{"DCE":{"time":5}}}}"#,
        )?;
        assert_eq!(
            state.record(&"DCE".into()),
            TimerRecord {
                is_active: false,
                time: 5
            }
        );
        assert_eq!(state.record(&"ACCESS".into()), TimerRecord::default());
        Ok(())
    }
}
