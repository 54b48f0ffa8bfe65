//! Durable JSON store for groups, monitor state and alert history.
//!
//! Layout under the store root:
//!
//! ```text
//! groups/<group_id>.json
//! monitors/<group_id>/<symbol_key>.json
//! alerts_history/<YYYY-MM-DD>.jsonl
//! ```
//!
//! Every single-file write is atomic (write to `<path>.tmp`, then rename),
//! so concurrent readers always see a complete document. The alert history
//! is append-only, one JSON object per line.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::model::group::{Group, SymbolConfig};

pub struct GroupStore {
    root: PathBuf,
    groups: BTreeMap<String, Group>,
}

impl GroupStore {
    /// Open (or initialize) a store rooted at `root` and load every group.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("groups"))?;
        fs::create_dir_all(root.join("monitors"))?;
        fs::create_dir_all(root.join("alerts_history"))?;

        let mut groups = BTreeMap::new();
        for entry in fs::read_dir(root.join("groups"))? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match Self::read_json::<Group>(&path) {
                    Ok(group) => {
                        groups.insert(group.id.clone(), group);
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable group file"),
                }
            }
        }
        debug!(count = groups.len(), root = %root.display(), "group store loaded");
        Ok(Self { root, groups })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ---- group CRUD -------------------------------------------------------

    pub fn create_group(&mut self, name: &str, description: &str) -> Result<Group> {
        let id = Uuid::new_v4().simple().to_string()[..8].to_string();
        self.create_group_with_id(&id, name, description)
    }

    pub fn create_group_with_id(&mut self, id: &str, name: &str, description: &str) -> Result<Group> {
        if self.groups.contains_key(id) {
            return Err(EngineError::Persistence(format!("group `{id}` already exists")));
        }
        let group = Group::new(id, name, description);
        self.persist_group(&group)?;
        self.groups.insert(id.to_string(), group.clone());
        Ok(group)
    }

    pub fn get(&self, id: &str) -> Result<&Group> {
        self.groups
            .get(id)
            .ok_or_else(|| EngineError::NotFound(format!("group `{id}`")))
    }

    pub fn list(&self) -> Vec<&Group> {
        self.groups.values().collect()
    }

    /// Mutate a group through `apply` and persist the result atomically.
    /// The in-memory copy stays authoritative if the flush fails.
    pub fn update_group<F>(&mut self, id: &str, apply: F) -> Result<&Group>
    where
        F: FnOnce(&mut Group),
    {
        let group = self
            .groups
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("group `{id}`")))?;
        apply(group);
        group.touch();
        let snapshot = group.clone();
        if let Err(e) = self.persist_group(&snapshot) {
            warn!(group = id, error = %e, "group flush failed; in-memory state kept");
        }
        self.get(id)
    }

    /// Delete a group together with its members' monitor state.
    pub fn delete_group(&mut self, id: &str) -> Result<()> {
        if self.groups.remove(id).is_none() {
            return Err(EngineError::NotFound(format!("group `{id}`")));
        }
        let group_file = self.root.join("groups").join(format!("{id}.json"));
        if group_file.exists() {
            fs::remove_file(&group_file)?;
        }
        let monitors_dir = self.root.join("monitors").join(id);
        if monitors_dir.exists() {
            fs::remove_dir_all(&monitors_dir)?;
        }
        Ok(())
    }

    // ---- symbol membership ------------------------------------------------

    pub fn add_symbol(&mut self, group_id: &str, symbol_key: &str, config: SymbolConfig) -> Result<()> {
        let key = symbol_key.to_ascii_lowercase();
        self.update_group(group_id, |group| group.add_member(key, config))?;
        Ok(())
    }

    pub fn remove_symbol(&mut self, group_id: &str, symbol_key: &str) -> Result<()> {
        let mut removed = false;
        self.update_group(group_id, |group| removed = group.remove_member(symbol_key))?;
        if !removed {
            return Err(EngineError::NotFound(format!(
                "symbol `{symbol_key}` in group `{group_id}`"
            )));
        }
        let state_file = self.monitor_path(group_id, symbol_key);
        if state_file.exists() {
            fs::remove_file(&state_file)?;
        }
        Ok(())
    }

    pub fn set_symbol_enabled(&mut self, group_id: &str, symbol_key: &str, enabled: bool) -> Result<()> {
        let mut found = false;
        self.update_group(group_id, |group| {
            if let Some(member) = group.members.get_mut(symbol_key) {
                member.enabled = enabled;
                found = true;
            }
        })?;
        if found {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!(
                "symbol `{symbol_key}` in group `{group_id}`"
            )))
        }
    }

    // ---- export / import --------------------------------------------------

    pub fn export_group(&self, id: &str, path: &Path) -> Result<()> {
        let group = self.get(id)?;
        Self::write_json_atomic(path, group)
    }

    /// Import a group from a standalone JSON file. Fails if the id is taken.
    pub fn import_group(&mut self, path: &Path) -> Result<String> {
        let group: Group = Self::read_json(path)?;
        if self.groups.contains_key(&group.id) {
            return Err(EngineError::Persistence(format!("group `{}` already exists", group.id)));
        }
        self.persist_group(&group)?;
        let id = group.id.clone();
        self.groups.insert(id.clone(), group);
        Ok(id)
    }

    // ---- monitor state ----------------------------------------------------

    pub fn save_monitor<T: Serialize>(&self, group_id: &str, symbol_key: &str, state: &T) -> Result<()> {
        let path = self.monitor_path(group_id, symbol_key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::write_json_atomic(&path, state)
    }

    pub fn load_monitor<T: DeserializeOwned>(&self, group_id: &str, symbol_key: &str) -> Result<Option<T>> {
        let path = self.monitor_path(group_id, symbol_key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_json(&path)?))
    }

    // ---- alert history ----------------------------------------------------

    /// Append one emitted event to the day's history file.
    pub fn append_alert<T: Serialize>(&self, timestamp: DateTime<Utc>, event: &T) -> Result<()> {
        let path = self.history_path(timestamp.date_naive());
        let line = serde_json::to_string(event)?;
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Raw history lines for a day, oldest first. Missing day → empty.
    pub fn read_alert_history(&self, day: NaiveDate) -> Result<Vec<String>> {
        let path = self.history_path(day);
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(path)?
            .lines()
            .map(|l| l.to_string())
            .collect())
    }

    // ---- internals --------------------------------------------------------

    fn persist_group(&self, group: &Group) -> Result<()> {
        let path = self.root.join("groups").join(format!("{}.json", group.id));
        Self::write_json_atomic(&path, group)
    }

    fn monitor_path(&self, group_id: &str, symbol_key: &str) -> PathBuf {
        self.root
            .join("monitors")
            .join(group_id)
            .join(format!("{symbol_key}.json"))
    }

    fn history_path(&self, day: NaiveDate) -> PathBuf {
        self.root
            .join("alerts_history")
            .join(format!("{}.jsonl", day.format("%Y-%m-%d")))
    }

    fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            EngineError::Persistence(format!("atomic rename failed for {}: {e}", path.display()))
        })
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let body = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AssetClass, Interval, Period};
    use crate::model::resolver::resolve;
    use tempfile::TempDir;

    fn store() -> (TempDir, GroupStore) {
        let dir = TempDir::new().unwrap();
        let store = GroupStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn create_and_reload_group() {
        let (dir, mut store) = store();
        let group = store.create_group_with_id("fx", "Majors", "FX majors").unwrap();
        store
            .add_symbol(
                "fx",
                "eurusd",
                SymbolConfig::new("eurusd", AssetClass::Forex, Interval::H1, Period::P7d),
            )
            .unwrap();

        let reloaded = GroupStore::open(dir.path()).unwrap();
        let loaded = reloaded.get("fx").unwrap();
        assert_eq!(loaded.name, group.name);
        assert!(loaded.member("eurusd").is_some());
    }

    #[test]
    fn persisted_group_resolves_identically() {
        let (dir, mut store) = store();
        store.create_group_with_id("g", "Test", "").unwrap();
        store
            .update_group("g", |group| {
                group.defaults.indicators.rsi_period = Some(9);
                group.defaults.alert_policy.enabled = Some(true);
            })
            .unwrap();
        store
            .add_symbol(
                "g",
                "aapl",
                SymbolConfig::new("AAPL", AssetClass::Stocks, Interval::M30, Period::P5d),
            )
            .unwrap();

        let before = resolve(store.get("g").unwrap(), "aapl").unwrap();
        let reloaded = GroupStore::open(dir.path()).unwrap();
        let after = resolve(reloaded.get("g").unwrap(), "aapl").unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn delete_group_removes_monitor_state() {
        let (dir, mut store) = store();
        store.create_group_with_id("g", "Test", "").unwrap();
        store.save_monitor("g", "btc", &serde_json::json!({"consecutive_failures": 0})).unwrap();
        assert!(dir.path().join("monitors/g/btc.json").exists());

        store.delete_group("g").unwrap();
        assert!(!dir.path().join("monitors/g").exists());
        assert!(!dir.path().join("groups/g.json").exists());
        assert!(matches!(store.get("g"), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn duplicate_group_id_is_rejected() {
        let (_dir, mut store) = store();
        store.create_group_with_id("g", "One", "").unwrap();
        assert!(store.create_group_with_id("g", "Two", "").is_err());
    }

    #[test]
    fn monitor_state_round_trips() {
        let (_dir, store) = store();
        let state = serde_json::json!({"consecutive_failures": 2, "alerts_emitted_today": 1});
        store.save_monitor("g", "eth", &state).unwrap();
        let loaded: Option<serde_json::Value> = store.load_monitor("g", "eth").unwrap();
        assert_eq!(loaded.unwrap(), state);
    }

    #[test]
    fn alert_history_appends_one_line_per_event() {
        let (_dir, store) = store();
        let now = Utc::now();
        store.append_alert(now, &serde_json::json!({"condition": "sentiment_flip"})).unwrap();
        store.append_alert(now, &serde_json::json!({"condition": "new_crossover"})).unwrap();
        let lines = store.read_alert_history(now.date_naive()).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("sentiment_flip"));
    }

    #[test]
    fn export_import_round_trip() {
        let (dir, mut store) = store();
        store.create_group_with_id("g", "Exportable", "desc").unwrap();
        let path = dir.path().join("export.json");
        store.export_group("g", &path).unwrap();

        let other_dir = TempDir::new().unwrap();
        let mut other = GroupStore::open(other_dir.path()).unwrap();
        let id = other.import_group(&path).unwrap();
        assert_eq!(id, "g");
        assert_eq!(other.get("g").unwrap().name, "Exportable");
    }
}
