// Aggregate counts over a task collection

use crate::task::{Priority, Task};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pending (not completed) tasks per priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Percentage of completed tasks, rounded to the nearest integer
    pub completion_rate: u32,
    pub priorities: PriorityCounts,
    /// Every task counts here, completed or not
    pub categories: BTreeMap<String, usize>,
}

impl TaskStats {
    pub fn compute(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let pending = total - completed;

        let mut priorities = PriorityCounts::default();
        let mut categories = BTreeMap::new();
        for task in tasks {
            if !task.completed {
                match task.priority {
                    Priority::Low => priorities.low += 1,
                    Priority::Medium => priorities.medium += 1,
                    Priority::High => priorities.high += 1,
                }
            }
            *categories.entry(task.category.clone()).or_insert(0) += 1;
        }

        let completion_rate = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        Self {
            total,
            completed,
            pending,
            completion_rate,
            priorities,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(priority: Priority, category: &str, completed: bool) -> Task {
        let now = Utc::now();
        Task {
            id: uuid::Uuid::now_v7().to_string(),
            title: "t".to_string(),
            description: String::new(),
            priority,
            category: category.to_string(),
            completed,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = TaskStats::compute(&[]);
        assert_eq!(stats, TaskStats::default());
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn test_counts_and_rate() {
        let tasks = vec![
            task(Priority::High, "work", false),
            task(Priority::High, "work", true),
            task(Priority::Low, "home", false),
        ];
        let stats = TaskStats::compute(&tasks);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        // 33.3 rounds down
        assert_eq!(stats.completion_rate, 33);
        // Completed tasks are excluded from priority counts
        assert_eq!(stats.priorities, PriorityCounts { low: 1, medium: 0, high: 1 });
        assert_eq!(stats.priorities.get(Priority::High), 1);
        // ...but not from category counts
        assert_eq!(stats.categories.get("work"), Some(&2));
        assert_eq!(stats.categories.get("home"), Some(&1));
    }

    #[test]
    fn test_rate_rounds_half_up() {
        let tasks = vec![
            task(Priority::Low, "a", true),
            task(Priority::Low, "a", true),
            task(Priority::Low, "a", false),
        ];
        // 66.7 -> 67
        assert_eq!(TaskStats::compute(&tasks).completion_rate, 67);

        let tasks: Vec<Task> = (0..8).map(|i| task(Priority::Low, "a", i < 1)).collect();
        // 12.5 -> 13
        assert_eq!(TaskStats::compute(&tasks).completion_rate, 13);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = TaskStats::compute(&[task(Priority::Medium, "general", false)]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["completionRate"], 0);
        assert_eq!(json["priorities"]["medium"], 1);
        assert_eq!(json["categories"]["general"], 1);
    }
}
