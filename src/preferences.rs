use anyhow::{anyhow, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// How many upcoming events the dashboard lists.
pub const SHOW_COUNT_EVENTS_KEY: &str = "showCountEventsOnStudentsDashboard";
const DEFAULT_SHOW_COUNT_EVENTS: usize = 1;

// ─── Store ───────────────────────────────────────────────────────────────────

/// String key/value preferences that outlive a session.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Preferences kept as a flat JSON object on disk. Every `set` rewrites the
/// file.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferenceStore {
    /// Open the store in the user's config directory.
    pub fn open_default() -> Result<Self> {
        let path = preferences_path().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(Self::open(path))
    }

    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: PathBuf) -> Self {
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();
        Self { path, values }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write preferences at {}", self.path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn preferences_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("student-dashboard").join("preferences.json"))
}

// ─── Event count ─────────────────────────────────────────────────────────────

/// Stored event count; absent, unparseable or zero falls back to 1.
pub fn show_count_events_on_students_dashboard(store: &dyn PreferenceStore) -> usize {
    store
        .get(SHOW_COUNT_EVENTS_KEY)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(DEFAULT_SHOW_COUNT_EVENTS)
}

pub fn set_show_count_events_on_students_dashboard(
    store: &mut dyn PreferenceStore,
    count: usize,
) -> Result<()> {
    store.set(SHOW_COUNT_EVENTS_KEY, &count.max(1).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("student-dashboard-test-{}-{name}", std::process::id()))
            .join("preferences.json")
    }

    #[test]
    fn absent_key_defaults_to_one() {
        let store = MemoryPreferenceStore::default();
        assert_eq!(show_count_events_on_students_dashboard(&store), 1);
    }

    #[test]
    fn stored_value_is_parsed() {
        let mut store = MemoryPreferenceStore::default();
        store.set(SHOW_COUNT_EVENTS_KEY, "4").unwrap();
        assert_eq!(show_count_events_on_students_dashboard(&store), 4);
    }

    #[test]
    fn invalid_values_fall_back() {
        let mut store = MemoryPreferenceStore::default();
        for bad in ["", "abc", "0", "-2"] {
            store.set(SHOW_COUNT_EVENTS_KEY, bad).unwrap();
            assert_eq!(show_count_events_on_students_dashboard(&store), 1, "value {bad:?}");
        }
    }

    #[test]
    fn setter_clamps_to_one() {
        let mut store = MemoryPreferenceStore::default();
        set_show_count_events_on_students_dashboard(&mut store, 0).unwrap();
        assert_eq!(store.get(SHOW_COUNT_EVENTS_KEY).as_deref(), Some("1"));
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let path = temp_path("roundtrip");
        let _ = std::fs::remove_file(&path);

        let mut store = FilePreferenceStore::open(path.clone());
        assert_eq!(show_count_events_on_students_dashboard(&store), 1);
        set_show_count_events_on_students_dashboard(&mut store, 3).unwrap();

        let reopened = FilePreferenceStore::open(path.clone());
        assert_eq!(show_count_events_on_students_dashboard(&reopened), 3);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let store = FilePreferenceStore::open(path.clone());
        assert_eq!(store.get(SHOW_COUNT_EVENTS_KEY), None);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
