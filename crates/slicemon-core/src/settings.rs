// ── Settings persistence ──
//
// The monitor never touches disk on its own. Callers inject a key-value
// `SettingsStore`; the monitor serializes its user-adjustable state into it.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{AutomatedActionRule, CustomMetricDefinition, ThresholdSet};

/// Key under which [`MonitorSettings`] are stored.
pub const SETTINGS_KEY: &str = "monitor.settings";

/// Minimal string key-value store.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
}

/// User-adjustable monitor state that survives restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub thresholds: ThresholdSet,
    pub auto_alert: bool,
    #[serde(default)]
    pub custom_metrics: Vec<CustomMetricDefinition>,
    #[serde(default)]
    pub action_rules: Vec<AutomatedActionRule>,
}

// ── MemoryStore ─────────────────────────────────────────────────────

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// ── JsonFileStore ───────────────────────────────────────────────────

/// Store backed by a single JSON object on disk, one string value per key.
///
/// Each `set` rewrites the whole file through a temporary sibling and a
/// rename. Concurrent writers from different processes are not coordinated.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<serde_json::Map<String, serde_json::Value>, CoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(serde_json::Map::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let map = self.read_all()?;
        match map.get(key) {
            None => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(CoreError::Storage {
                message: format!(
                    "{}: key '{key}' holds {other}, expected a string",
                    self.path.display()
                ),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut map = self.read_all()?;
        map.insert(key.to_owned(), serde_json::Value::String(value.to_owned()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_values() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn file_store_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert_eq!(store.get(SETTINGS_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_keeps_other_keys_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));
        store.set("theme", "dark").unwrap();
        store.set(SETTINGS_KEY, "{}").unwrap();

        let reopened = JsonFileStore::new(store.path());
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(reopened.get(SETTINGS_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn file_store_rejects_non_string_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"k": 1}"#).unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).get("k"),
            Err(CoreError::Storage { .. })
        ));
    }
}
