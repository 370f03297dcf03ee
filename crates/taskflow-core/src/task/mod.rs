//! Task types.
//!
//! A task is the unit of work the progression engine rewards. Status and
//! priority are explicit enums that round-trip through both serde and the
//! SQL TEXT columns (`todo`/`in-progress`/`done`, `low`/`medium`/`high`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: format!("unknown status '{other}'"),
            }),
        }
    }
}

/// Task priority. Feeds the XP priority bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("unknown priority '{other}'"),
            }),
        }
    }
}

/// A unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Task title, always non-empty.
    pub title: String,
    /// Optional longer description. Length feeds the XP detail bonus.
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Optional free-form category label.
    pub category: Option<String>,
    /// Estimated effort in minutes, positive when present.
    pub estimated_minutes: Option<u32>,
    /// Minutes actually logged against the task, accumulated by the
    /// focus timer.
    pub actual_minutes: u32,
    /// Number of completed work intervals logged against the task.
    pub pomodoro_count: u32,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stamped exactly once, on the first transition into Done. Never
    /// cleared by later edits.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Creation payload for a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Check the creation payload.
    ///
    /// A task may not be created directly in Done: `completed_at` is
    /// stamped by the done transition, so Done at birth would bypass
    /// the progression engine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.estimated_minutes == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: "estimated_minutes".into(),
                message: "must be a positive number of minutes".into(),
            });
        }
        if self.status == TaskStatus::Done {
            return Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: "a task cannot be created as done".into(),
            });
        }
        Ok(())
    }
}

/// Partial-update payload. `None` leaves the field unchanged.
///
/// Nullable task fields use a nested option: `Some(Some(v))` sets the
/// field, `Some(None)` clears it back to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<Option<String>>,
    #[serde(default)]
    pub estimated_minutes: Option<Option<u32>>,
    #[serde(default)]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.estimated_minutes.is_none()
            && self.due_date.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyTitle);
            }
        }
        if self.estimated_minutes == Some(Some(0)) {
            return Err(ValidationError::InvalidValue {
                field: "estimated_minutes".into(),
                message: "must be a positive number of minutes".into(),
            });
        }
        Ok(())
    }
}

/// Filters for listing tasks. All criteria are ANDed together.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    /// Substring match against title or description.
    pub search: Option<String>,
}

/// Todo/in-progress/done totals across the whole store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: u32,
    pub todo: u32,
    pub in_progress: u32,
    pub done: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("finished".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_serde_uses_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn priority_round_trips_through_text() {
        for priority in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(priority.as_str().parse::<Priority>().unwrap(), priority);
        }
    }

    #[test]
    fn new_task_rejects_empty_title() {
        let task = NewTask::new("   ");
        assert!(matches!(task.validate(), Err(ValidationError::EmptyTitle)));
    }

    #[test]
    fn new_task_rejects_zero_estimate() {
        let mut task = NewTask::new("Write tests");
        task.estimated_minutes = Some(0);
        assert!(task.validate().is_err());
    }

    #[test]
    fn new_task_rejects_initial_done() {
        let mut task = NewTask::new("Sneaky");
        task.status = TaskStatus::Done;
        assert!(task.validate().is_err());
    }

    #[test]
    fn patch_rejects_blank_title() {
        let patch = TaskPatch {
            title: Some(String::new()),
            ..TaskPatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_distinguishes_clear_from_untouched() {
        let untouched = TaskPatch::default();
        assert!(untouched.description.is_none());

        let clear = TaskPatch {
            description: Some(None),
            due_date: Some(None),
            ..TaskPatch::default()
        };
        assert!(clear.validate().is_ok());
        assert!(!clear.is_empty());
    }

    #[test]
    fn patch_rejects_zero_estimate_but_allows_clearing_it() {
        let zero = TaskPatch {
            estimated_minutes: Some(Some(0)),
            ..TaskPatch::default()
        };
        assert!(zero.validate().is_err());

        let clear = TaskPatch {
            estimated_minutes: Some(None),
            ..TaskPatch::default()
        };
        assert!(clear.validate().is_ok());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TaskPatch::default().is_empty());
        let patch = TaskPatch {
            priority: Some(Priority::High),
            ..TaskPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
