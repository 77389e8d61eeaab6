// Filtering, search and sorting over task slices

use crate::task::{Priority, Task};
use eyre::eyre;
use std::cmp::Ordering;
use std::str::FromStr;

/// Field to sort on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    Priority,
    Title,
    Description,
    Category,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortKey {
    fn as_str(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::UpdatedAt => "updatedAt",
            SortKey::Priority => "priority",
            SortKey::Title => "title",
            SortKey::Description => "description",
            SortKey::Category => "category",
            SortKey::Completed => "completed",
        }
    }

    /// Ascending comparison of two tasks on this key
    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::Title => cmp_ignore_case(&a.title, &b.title),
            SortKey::Description => cmp_ignore_case(&a.description, &b.description),
            SortKey::Category => cmp_ignore_case(&a.category, &b.category),
            SortKey::Completed => a.completed.cmp(&b.completed),
        }
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = eyre::Report;

    /// Accepts both the camelCase field names and snake_case spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" | "created" => Ok(SortKey::CreatedAt),
            "updatedAt" | "updated_at" | "updated" => Ok(SortKey::UpdatedAt),
            "priority" => Ok(SortKey::Priority),
            "title" => Ok(SortKey::Title),
            "description" => Ok(SortKey::Description),
            "category" => Ok(SortKey::Category),
            "completed" => Ok(SortKey::Completed),
            other => Err(eyre!("Unknown sort key: {}", other)),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(eyre!("Unknown sort order: {} (expected asc or desc)", other)),
        }
    }
}

/// Sorted copy of `tasks`
///
/// The sort is stable: tasks with equal keys keep their collection order
/// in both directions.
pub fn sort_tasks(tasks: &[Task], key: SortKey, order: SortOrder) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| match order {
        SortOrder::Asc => key.compare(a, b),
        SortOrder::Desc => key.compare(b, a),
    });
    sorted
}

/// Case-insensitive substring match over title, description and category
pub fn matches_search(task: &Task, needle_lower: &str) -> bool {
    task.title.to_lowercase().contains(needle_lower)
        || task.description.to_lowercase().contains(needle_lower)
        || task.category.to_lowercase().contains(needle_lower)
}

/// Tasks matching `query`; an empty query matches everything
pub fn search_tasks(tasks: &[Task], query: &str) -> Vec<Task> {
    if query.is_empty() {
        return tasks.to_vec();
    }
    let needle = query.to_lowercase();
    tasks.iter().filter(|t| matches_search(t, &needle)).cloned().collect()
}

/// Combined filter over a task collection
///
/// Every set criterion must match. Results keep collection order unless a
/// sort is requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<(SortKey, SortOrder)>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
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

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort = Some((key, order));
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.completed.is_some_and(|c| task.completed != c) {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        if self.category.as_deref().is_some_and(|c| task.category != c) {
            return false;
        }
        match self.search.as_deref() {
            Some(text) if !text.is_empty() => matches_search(task, &text.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        let filtered: Vec<Task> = tasks.iter().filter(|t| self.matches(t)).cloned().collect();
        match self.sort {
            Some((key, order)) => sort_tasks(&filtered, key, order),
            None => filtered,
        }
    }
}
