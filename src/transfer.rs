// Export envelope and import parsing

use crate::task::Task;
use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Version tag written into every export
pub const EXPORT_VERSION: &str = "1.0";

/// Snapshot of a task collection as written by `export_tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub tasks: Vec<Task>,
    #[serde(with = "crate::task::iso_millis")]
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl ExportData {
    pub fn new(tasks: Vec<Task>, export_date: DateTime<Utc>) -> Self {
        Self {
            tasks,
            export_date,
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize export")
    }
}

/// Pull the task list out of an import payload
///
/// Only `tasks` is required; `exportDate` and `version` are informational.
/// Fails without partial results if `tasks` is missing, is not an array, or
/// holds an entry that is not a valid task.
pub fn parse_import(data: &Value) -> Result<Vec<Task>> {
    let tasks = data
        .get("tasks")
        .ok_or_else(|| eyre!("Invalid import data format: missing \"tasks\""))?;
    let entries = tasks
        .as_array()
        .ok_or_else(|| eyre!("Invalid import data format: \"tasks\" is not an array"))?;

    if let Some(version) = data
        .get("version")
        .and_then(Value::as_str)
        .filter(|v| *v != EXPORT_VERSION)
    {
        warn!(version, expected = EXPORT_VERSION, "Importing data with unexpected version");
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Task::deserialize(entry).with_context(|| format!("Invalid task at index {}", i))
        })
        .collect()
}

/// Drop tasks whose id is in `seen` or repeats earlier in `tasks`
///
/// The first occurrence of an id wins. `seen` is extended with every id kept.
pub fn retain_unseen(tasks: Vec<Task>, seen: &mut HashSet<String>) -> Vec<Task> {
    let mut kept = Vec::with_capacity(tasks.len());
    for task in tasks {
        if seen.insert(task.id.clone()) {
            kept.push(task);
        } else {
            warn!(id = %task.id, "Skipping task with duplicate id");
        }
    }
    kept
}
