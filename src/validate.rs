// Advisory validation of raw task input

use crate::task::Priority;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Unparsed task fields as a form or command line hands them over
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskDraft<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub priority: Option<&'a str>,
}

/// Outcome of `validate_task`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check a draft against the task field rules
///
/// The store does not call this; callers are expected to check input
/// before `add_task` / `update_task` and surface `errors` themselves.
pub fn validate_task(draft: &TaskDraft<'_>) -> Validation {
    let mut errors = Vec::new();

    if draft.title.is_none_or(|title| title.trim().is_empty()) {
        errors.push("Title is required".to_string());
    }

    // Checked on the raw title, so a long blank title fails both ways
    if draft.title.is_some_and(|title| title.chars().count() > MAX_TITLE_CHARS) {
        errors.push(format!("Title must be less than {} characters", MAX_TITLE_CHARS));
    }

    if draft
        .description
        .is_some_and(|description| description.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        errors.push(format!(
            "Description must be less than {} characters",
            MAX_DESCRIPTION_CHARS
        ));
    }

    if draft
        .priority
        .is_some_and(|priority| !priority.is_empty() && priority.parse::<Priority>().is_err())
    {
        errors.push("Invalid priority level".to_string());
    }

    Validation {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_draft() {
        let draft = TaskDraft {
            title: Some("Buy milk"),
            description: Some("2 litres"),
            priority: Some("high"),
        };
        let result = validate_task(&draft);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_missing_or_blank_title() {
        let result = validate_task(&TaskDraft::default());
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Title is required".to_string()]);

        let result = validate_task(&TaskDraft {
            title: Some("   "),
            ..TaskDraft::default()
        });
        assert_eq!(result.errors, vec!["Title is required".to_string()]);
    }

    #[test]
    fn test_long_blank_title_reports_both_errors() {
        let blank = " ".repeat(101);
        let result = validate_task(&TaskDraft {
            title: Some(&blank),
            ..TaskDraft::default()
        });
        assert_eq!(
            result.errors,
            vec![
                "Title is required".to_string(),
                "Title must be less than 100 characters".to_string(),
            ]
        );
    }

    #[test]
    fn test_length_limits_count_characters() {
        let exact = "a".repeat(100);
        assert!(
            validate_task(&TaskDraft {
                title: Some(&exact),
                ..TaskDraft::default()
            })
            .is_valid
        );

        // 100 multi-byte characters are still within the limit
        let wide = "é".repeat(100);
        assert!(
            validate_task(&TaskDraft {
                title: Some(&wide),
                ..TaskDraft::default()
            })
            .is_valid
        );

        let long_title = "a".repeat(101);
        let long_description = "b".repeat(501);
        let result = validate_task(&TaskDraft {
            title: Some(&long_title),
            description: Some(&long_description),
            priority: None,
        });
        assert_eq!(
            result.errors,
            vec![
                "Title must be less than 100 characters".to_string(),
                "Description must be less than 500 characters".to_string(),
            ]
        );
    }

    #[test]
    fn test_unknown_priority_rejected() {
        let result = validate_task(&TaskDraft {
            title: Some("Pay rent"),
            description: None,
            priority: Some("urgent"),
        });
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Invalid priority level".to_string()]);
    }

    #[test]
    fn test_all_errors_reported_together() {
        let long_description = "x".repeat(600);
        let result = validate_task(&TaskDraft {
            title: None,
            description: Some(&long_description),
            priority: Some("critical"),
        });
        assert_eq!(result.errors.len(), 3);
    }
}
