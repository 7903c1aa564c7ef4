//! Task collection adapter over a key-value store.
//!
//! # Responsibility
//! - Serialize the whole task collection as one JSON array under `tasks`.
//! - Restore it once at startup, degrading to an empty collection.
//!
//! # Invariants
//! - `save` always writes the full collection, never a delta.
//! - `load` never returns two tasks with the same id.

use super::kv::KeyValueStore;
use super::StorageResult;
use crate::model::task::Task;
use log::{info, warn};
use std::collections::HashSet;

/// Fixed key the collection is stored under.
pub const TASKS_KEY: &str = "tasks";

/// Loads and saves the task collection through a `KeyValueStore`.
pub struct TaskStorage<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> TaskStorage<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Reads the persisted collection.
    ///
    /// A missing entry yields an empty list. Read or parse failures are
    /// logged and also yield an empty list.
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => {
                info!(
                    "event=tasks_load module=storage status=ok count={}",
                    tasks.len()
                );
                tasks
            }
            Err(err) => {
                warn!(
                    "event=tasks_load module=storage status=error fallback=empty error={}",
                    err
                );
                Vec::new()
            }
        }
    }

    /// Strict variant of `load` that surfaces read and parse errors.
    pub fn try_load(&self) -> StorageResult<Vec<Task>> {
        let Some(raw) = self.kv.get(TASKS_KEY)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = serde_json::from_str(&raw)?;
        Ok(dedupe_ids(tasks))
    }

    /// Writes the full collection.
    pub fn save(&self, tasks: &[Task]) -> StorageResult<()> {
        let payload = serde_json::to_string(tasks)?;
        self.kv.set(TASKS_KEY, &payload)
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }
}

fn dedupe_ids(tasks: Vec<Task>) -> Vec<Task> {
    let total = tasks.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<Task> = tasks
        .into_iter()
        .filter(|task| seen.insert(task.id))
        .collect();

    if unique.len() != total {
        warn!(
            "event=tasks_load module=storage status=repaired dropped_duplicates={}",
            total - unique.len()
        );
    }
    unique
}
