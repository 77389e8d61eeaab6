// Task record and its input shapes

use chrono::{DateTime, SecondsFormat, Utc};
use eyre::eyre;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Category assigned when none is given
pub const DEFAULT_CATEGORY: &str = "general";

/// Suggested categories; any string is accepted
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "general",
    "work",
    "personal",
    "shopping",
    "health",
    "finance",
    "education",
    "travel",
];

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Sort rank: high 3, medium 2, low 1
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(eyre!("Invalid priority level: {}", other)),
        }
    }
}

/// Fields accepted when adding a task
///
/// Missing priority and category fall back to `medium` and `general`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy every present field onto `task`
    pub(crate) fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix
pub(crate) mod iso_millis {
    use super::*;
    use serde::{Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| D::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Task {
            id: "task-1".to_string(),
            title: "Buy milk".to_string(),
            description: String::new(),
            priority: Priority::High,
            category: "shopping".to_string(),
            completed: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_task_serializes_camel_case_iso() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"createdAt\":\"2024-01-01T12:00:00.000Z\""));
        assert!(json.contains("\"updatedAt\":\"2024-01-01T12:00:00.000Z\""));
        assert!(json.contains("\"priority\":\"high\""));
        assert!(json.contains("\"completed\":false"));
    }

    #[test]
    fn test_task_deserializes_with_defaults() {
        let json = r#"{"id":"1","title":"Call bank","createdAt":"2024-01-01T12:00:00.000Z","updatedAt":"2024-01-01T12:00:00.000Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.description, "");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, "general");
        assert!(!task.completed);
    }

    #[test]
    fn test_task_rejects_unknown_priority() {
        let json = r#"{"id":"1","title":"x","priority":"urgent","createdAt":"2024-01-01T12:00:00.000Z","updatedAt":"2024-01-01T12:00:00.000Z"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_priority_parse_and_rank() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert!("HIGH".parse::<Priority>().is_err());
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
        assert_eq!(Priority::Low.to_string(), "low");
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut task = sample();
        let patch = TaskPatch {
            title: Some("Buy oat milk".to_string()),
            completed: Some(true),
            ..TaskPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply_to(&mut task);

        assert_eq!(task.title, "Buy oat milk");
        assert!(task.completed);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, "shopping");
        assert!(TaskPatch::default().is_empty());
    }
}
