use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::goals::data::GoalID;
use crate::internal_error::InternalError;

pub type TaskID = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Statuses a locked task may not move into.
    pub fn requires_unlocked(self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::Completed)
    }
}

impl FromStr for TaskStatus {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<TaskStatus, InternalError> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "notstarted" => Ok(TaskStatus::NotStarted),
            "inprogress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(InternalError::validation(format!(
                "Invalid status '{}', expected one of Not Started, In Progress, Completed",
                s
            ))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskID,
    pub goal_id: GoalID,
    pub week_number: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub order: i64,
    /// `None` follows the implicit chain on `order`; `Some` replaces it.
    pub dependencies: Option<Vec<TaskID>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub week_number: i64,
    pub title: String,
    pub description: String,
    pub order: i64,
    pub dependencies: Option<Vec<TaskID>>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TaskView {
    pub task: Task,
    pub is_locked: bool,
    pub blocked_by: Vec<TaskID>,
}

#[derive(Deserialize, Debug)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub week_number: i64,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub dependencies: Option<Vec<TaskID>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<TaskID>>,
    /// Drops explicit dependencies and goes back to the implicit chain.
    #[serde(default)]
    pub use_implicit_dependencies: bool,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub week_number: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct TaskReorder {
    pub task_id: TaskID,
    pub new_order: i64,
    #[serde(default)]
    pub new_week_number: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct TaskBulkReorder {
    pub tasks: Vec<TaskReorder>,
}

#[derive(Serialize, Debug)]
pub struct GenerateTasksResponse {
    pub goal_id: GoalID,
    pub goal_title: String,
    pub topic: String,
    pub tasks: Vec<TaskView>,
    pub total_tasks: usize,
}

#[derive(Serialize, Debug)]
pub struct GoalTasksResponse {
    pub goal_id: GoalID,
    pub tasks: Vec<TaskView>,
    pub tasks_by_week: BTreeMap<i64, Vec<TaskView>>,
    pub total_tasks: usize,
}

#[derive(Serialize, Debug)]
pub struct ReorderTasksResponse {
    pub message: String,
    pub goal_id: GoalID,
    pub updated_count: usize,
    pub tasks: Vec<TaskView>,
}

#[derive(Serialize, Debug)]
pub struct DeleteTaskResult {
    pub message: String,
    pub deleted_task_title: String,
    pub deleted_task_id: TaskID,
}

/// What changed in an update, for the caller's bookkeeping.
#[derive(Debug)]
pub struct TaskUpdateOutcome {
    pub task: Task,
    pub previous_status: TaskStatus,
}

impl TaskUpdateOutcome {
    pub fn became_completed(&self) -> bool {
        self.previous_status != TaskStatus::Completed && self.task.status == TaskStatus::Completed
    }
}
