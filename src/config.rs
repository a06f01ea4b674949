//! Configuration of a tracker installation. Read once at start from `config.json` in the
//! application directory; a missing file means the defaults below.

use std::{collections::HashSet, io::ErrorKind, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tracker::state::Department;

pub const CONFIG_FILE_NAME: &str = "config.json";

const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

const DEFAULT_DEPARTMENTS: [(&str, &str); 12] = [
    ("Homelessness", "#3D3520"),
    ("Public Safety", "#3D2320"),
    ("E&E", "#203D20"),
    ("Housing First", "#20203D"),
    ("DCE", "#3D2E20"),
    ("I-REN", "#2E203D"),
    ("Transportation", "#20303D"),
    ("ACCESS", "#3D2037"),
    ("Arts & Music", "#3D203D"),
    ("CV Link", "#203D2E"),
    ("CV Sync", "#203D3A"),
    ("CVCC", "#3D2626"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentConfig {
    pub name: Department,
    /// `#RRGGBB`, used by the terminal board.
    #[serde(default)]
    pub color: Option<String>,
}

/// The closed, ordered set of departments. Position `i` is bound to function key `F(i + 1)`, so
/// the order has to stay stable between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Departments(Vec<DepartmentConfig>);

impl Departments {
    pub fn new(entries: Vec<DepartmentConfig>) -> Result<Self> {
        if entries.is_empty() {
            bail!("At least one department has to be configured");
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.name().to_lowercase()) {
                bail!("Department {} is configured twice", entry.name);
            }
        }
        Ok(Self(entries))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Department> {
        self.0.iter().map(|v| &v.name)
    }

    pub fn entries(&self) -> &[DepartmentConfig] {
        &self.0
    }

    pub fn contains(&self, department: &Department) -> bool {
        self.0.iter().any(|v| &v.name == department)
    }

    /// Department toggled by `F<key>`. Keys start at 1; anything outside the configured range
    /// maps to nothing.
    pub fn by_function_key(&self, key: usize) -> Option<&Department> {
        key.checked_sub(1)
            .and_then(|index| self.0.get(index))
            .map(|v| &v.name)
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&Department> {
        self.0
            .iter()
            .find(|v| v.name.name().eq_ignore_ascii_case(name))
            .map(|v| &v.name)
    }

    pub fn color(&self, department: &Department) -> Option<&str> {
        self.0
            .iter()
            .find(|v| &v.name == department)
            .and_then(|v| v.color.as_deref())
    }
}

impl Default for Departments {
    fn default() -> Self {
        Self(
            DEFAULT_DEPARTMENTS
                .iter()
                .map(|(name, color)| DepartmentConfig {
                    name: Department::from(*name),
                    color: Some(color.to_string()),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerConfig {
    pub departments: Departments,
    /// Zone all civil dates are computed in.
    pub timezone: Tz,
    pub tick_interval_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            departments: Departments::default(),
            timezone: chrono_tz::America::Los_Angeles,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl TrackerConfig {
    /// Reads `config.json` from `dir`. Only a missing file falls back to defaults; a file that
    /// exists but can't be used is an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {path:?}, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {path:?}")),
        };
        let config = Self::parse(&content).with_context(|| format!("Invalid config {path:?}"))?;
        info!(
            "Loaded config with {} departments in {}",
            config.departments.len(),
            config.timezone
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: TrackerConfig = serde_json::from_str(content)?;
        let departments = Departments::new(config.departments.0)?;
        if config.tick_interval_ms == 0 {
            bail!("tickIntervalMs has to be positive");
        }
        Ok(Self {
            departments,
            ..config
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
