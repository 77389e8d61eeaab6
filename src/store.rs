// Task store: in-memory collection with write-through persistence

use crate::clock::{self, Clock, SystemClock};
use crate::config::Config;
use crate::events::{Listeners, Subscription};
use crate::query::{self, SortKey, SortOrder, TaskQuery};
use crate::stats::TaskStats;
use crate::storage::Storage;
use crate::task::{DEFAULT_CATEGORY, NewTask, Priority, Task, TaskPatch};
use crate::transfer::{self, ExportData};
use eyre::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Ordered task collection persisted under a single storage key
///
/// Newest tasks come first. Every mutation rewrites the whole collection to
/// storage and then notifies subscribers with the full list. Persistence
/// failures are logged rather than returned: the in-memory change stands,
/// subscribers are not told, and the store is marked dirty until a later
/// write succeeds.
pub struct TaskStore {
    tasks: Vec<Task>,
    listeners: Listeners,
    storage: Box<dyn Storage>,
    key: String,
    clock: Box<dyn Clock>,
    dirty: bool,
}

impl TaskStore {
    /// Open a store over `storage`, hydrating from `key`
    ///
    /// A missing key gives an empty store. So does an unreadable or
    /// unparsable value; that case is logged and not reported to the caller.
    pub fn open(storage: Box<dyn Storage>, key: impl Into<String>) -> Self {
        Self::with_clock(storage, key, Box::new(SystemClock))
    }

    pub fn with_clock(storage: Box<dyn Storage>, key: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        let key = key.into();
        let tasks = Self::load(storage.as_ref(), &key);

        Self {
            tasks,
            listeners: Listeners::new(),
            storage,
            key,
            clock,
            dirty: false,
        }
    }

    /// Open the storage backend and key named by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = config.open_storage().context("Failed to open task storage")?;
        Ok(Self::open(storage, config.key.clone()))
    }

    /// Flush pending changes and drop every subscriber
    pub fn close(mut self) -> Result<()> {
        let result = if self.dirty { self.flush() } else { Ok(()) };
        self.listeners.clear();
        debug!(key = %self.key, "Closed task store");
        result
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// True when the last write to storage failed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Retry writing the collection to storage
    ///
    /// Subscribers missed the changes that failed to persist, so a flush that
    /// clears the dirty flag notifies them with the now-saved collection.
    pub fn flush(&mut self) -> Result<()> {
        self.save()?;
        if self.dirty {
            self.dirty = false;
            self.listeners.notify(&self.tasks);
        }
        Ok(())
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a listener called with the full collection after each mutation
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[Task]) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a task and put it at the front of the collection
    pub fn add_task(&mut self, new: NewTask) -> Task {
        let now = self.clock.now();
        let task = Task {
            id: Uuid::now_v7().to_string(),
            title: new.title,
            description: new.description.unwrap_or_default(),
            priority: new.priority.unwrap_or_default(),
            category: new.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            completed: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %task.id, title = %task.title, "add_task");
        self.tasks.insert(0, task.clone());
        self.commit();
        task
    }

    /// Merge `patch` into the task with `id`, refreshing `updatedAt`
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Option<Task> {
        let index = self.position(id)?;
        let updated_at = clock::next_after(self.clock.as_ref(), self.tasks[index].updated_at);

        let task = &mut self.tasks[index];
        patch.apply_to(task);
        task.updated_at = updated_at;
        let task = task.clone();

        debug!(id, "update_task");
        self.commit();
        Some(task)
    }

    /// Flip `completed` on the task with `id`
    pub fn toggle_task(&mut self, id: &str) -> Option<Task> {
        let completed = self.tasks.get(self.position(id)?)?.completed;
        self.update_task(
            id,
            TaskPatch {
                completed: Some(!completed),
                ..TaskPatch::default()
            },
        )
    }

    /// Remove the task with `id`; false (and no write) if there is none
    pub fn delete_task(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.tasks.remove(index);

        debug!(id, "delete_task");
        self.commit();
        true
    }

    pub fn clear_all_tasks(&mut self) {
        debug!(count = self.tasks.len(), "clear_all_tasks");
        self.tasks.clear();
        self.commit();
    }

    pub fn clear_completed(&mut self) {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        debug!(removed = before - self.tasks.len(), "clear_completed");
        self.commit();
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Copy of the whole collection
    pub fn get_tasks(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Borrowed view of the collection, in store order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get_task(&self, id: &str) -> Option<Task> {
        self.tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn get_tasks_by_status(&self, completed: bool) -> Vec<Task> {
        self.query(&TaskQuery::new().completed(completed))
    }

    pub fn get_tasks_by_priority(&self, priority: Priority) -> Vec<Task> {
        self.query(&TaskQuery::new().priority(priority))
    }

    pub fn get_tasks_by_category(&self, category: &str) -> Vec<Task> {
        self.query(&TaskQuery::new().category(category))
    }

    pub fn search_tasks(&self, text: &str) -> Vec<Task> {
        query::search_tasks(&self.tasks, text)
    }

    /// Sorted copy; the store's own order is untouched
    pub fn sort_tasks(&self, key: SortKey, order: SortOrder) -> Vec<Task> {
        query::sort_tasks(&self.tasks, key, order)
    }

    pub fn query(&self, query: &TaskQuery) -> Vec<Task> {
        query.apply(&self.tasks)
    }

    pub fn get_stats(&self) -> TaskStats {
        TaskStats::compute(&self.tasks)
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    pub fn export_tasks(&self) -> ExportData {
        ExportData::new(self.tasks.clone(), self.clock.now())
    }

    /// Load tasks from an export payload
    ///
    /// With `merge`, tasks whose id already exists are skipped and the rest
    /// are appended. Without it the collection is replaced. Returns false,
    /// leaving the store unchanged, when the payload is malformed or cannot
    /// be persisted.
    pub fn import_tasks(&mut self, data: &Value, merge: bool) -> bool {
        let incoming = match transfer::parse_import(data) {
            Ok(tasks) => tasks,
            Err(e) => {
                error!(error = ?e, "Error importing tasks");
                return false;
            }
        };
        let offered = incoming.len();

        let previous = self.tasks.clone();
        if merge {
            let mut seen: HashSet<String> = self.tasks.iter().map(|t| t.id.clone()).collect();
            let fresh = transfer::retain_unseen(incoming, &mut seen);
            self.tasks.extend(fresh);
        } else {
            self.tasks = transfer::retain_unseen(incoming, &mut HashSet::new());
        }

        if let Err(e) = self.save() {
            error!(key = %self.key, error = ?e, "Error saving imported tasks, rolling back");
            self.tasks = previous;
            return false;
        }
        self.dirty = false;

        info!(offered, total = self.tasks.len(), merge, "Imported tasks");
        self.listeners.notify(&self.tasks);
        true
    }

    /// Parse `json` and hand it to `import_tasks`
    pub fn import_json(&mut self, json: &str, merge: bool) -> bool {
        match serde_json::from_str::<Value>(json) {
            Ok(data) => self.import_tasks(&data, merge),
            Err(e) => {
                error!(error = ?e, "Error importing tasks: not valid JSON");
                false
            }
        }
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn load(storage: &dyn Storage, key: &str) -> Vec<Task> {
        let raw = match storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "No stored tasks, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(key, error = ?e, "Error loading tasks, starting empty");
                return Vec::new();
            }
        };

        let entries: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key, error = ?e, "Stored tasks are not a JSON array, starting empty");
                return Vec::new();
            }
        };

        let mut tasks = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match Task::deserialize(entry) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    warn!(key, index, error = %e, "Skipping unreadable stored task");
                    continue;
                }
            }
        }

        let tasks = transfer::retain_unseen(tasks, &mut HashSet::new());
        info!(key, count = tasks.len(), "Loaded tasks");
        tasks
    }

    fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.storage
            .set_item(&self.key, &json)
            .with_context(|| format!("Failed to write tasks to key {}", self.key))
    }

    /// Persist, then notify; a failed write notifies nobody and leaves the store dirty
    fn commit(&mut self) {
        match self.save() {
            Ok(()) => {
                self.dirty = false;
                self.listeners.notify(&self.tasks);
            }
            Err(e) => {
                error!(key = %self.key, error = ?e, "Error saving tasks");
                self.dirty = true;
            }
        }
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("key", &self.key)
            .field("tasks", &self.tasks.len())
            .field("listeners", &self.listeners)
            .field("dirty", &self.dirty)
            .finish()
    }
}
