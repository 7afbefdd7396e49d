use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::data::UserID;
use crate::goals::data::GoalID;
use crate::internal_error::InternalError;
use crate::tasks::data::TaskID;

pub type ReminderID = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    DailyCheckin,
    MissedTask,
    ProgressUpdate,
    Celebration,
    WeeklyReview,
    Motivation,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MotivationLevel {
    Positive,
    Encouraging,
    Gentle,
    Neutral,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Delivered,
    Seen,
    Dismissed,
}

/// Result of asking a reminder to move to a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply,
    /// Already in the requested terminal status.
    Unchanged,
}

impl ReminderType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderType::DailyCheckin => "daily_checkin",
            ReminderType::MissedTask => "missed_task",
            ReminderType::ProgressUpdate => "progress_update",
            ReminderType::Celebration => "celebration",
            ReminderType::WeeklyReview => "weekly_review",
            ReminderType::Motivation => "motivation",
        }
    }
}

impl MotivationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MotivationLevel::Positive => "positive",
            MotivationLevel::Encouraging => "encouraging",
            MotivationLevel::Gentle => "gentle",
            MotivationLevel::Neutral => "neutral",
        }
    }
}

impl ReminderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Delivered => "delivered",
            ReminderStatus::Seen => "seen",
            ReminderStatus::Dismissed => "dismissed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ReminderStatus::Seen | ReminderStatus::Dismissed)
    }

    /// User driven transitions. Delivery is never requested by a user; it
    /// happens when a due reminder is read.
    pub fn transition_to(self, target: ReminderStatus) -> Result<Transition, InternalError> {
        use ReminderStatus::*;

        match (self, target) {
            (_, Pending) | (_, Delivered) => Err(InternalError::validation(format!(
                "Reminders can only be marked seen or dismissed, not {}",
                target
            ))),
            (current, target) if current == target => Ok(Transition::Unchanged),
            (current, target) if current.is_terminal() => Err(InternalError::conflict(format!(
                "Reminder is already {} and cannot become {}",
                current, target
            ))),
            (Pending, Seen) => Err(InternalError::conflict(
                "Reminder has not been delivered yet and cannot be marked seen",
            )),
            _ => Ok(Transition::Apply),
        }
    }
}

fn unknown(kind: &str, value: &str) -> InternalError {
    InternalError::validation(format!("Invalid {} '{}'", kind, value))
}

impl FromStr for ReminderType {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<ReminderType, InternalError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily_checkin" => Ok(ReminderType::DailyCheckin),
            "missed_task" => Ok(ReminderType::MissedTask),
            "progress_update" => Ok(ReminderType::ProgressUpdate),
            "celebration" => Ok(ReminderType::Celebration),
            "weekly_review" => Ok(ReminderType::WeeklyReview),
            "motivation" => Ok(ReminderType::Motivation),
            _ => Err(unknown("reminder type", s)),
        }
    }
}

impl FromStr for MotivationLevel {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<MotivationLevel, InternalError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(MotivationLevel::Positive),
            "encouraging" => Ok(MotivationLevel::Encouraging),
            "gentle" => Ok(MotivationLevel::Gentle),
            "neutral" => Ok(MotivationLevel::Neutral),
            _ => Err(unknown("motivation level", s)),
        }
    }
}

impl FromStr for ReminderStatus {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<ReminderStatus, InternalError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReminderStatus::Pending),
            "delivered" => Ok(ReminderStatus::Delivered),
            "seen" => Ok(ReminderStatus::Seen),
            "dismissed" => Ok(ReminderStatus::Dismissed),
            _ => Err(unknown("reminder status", s)),
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ReminderID,
    pub user_id: UserID,
    pub reminder_type: ReminderType,
    pub goal_id: Option<GoalID>,
    pub task_id: Option<TaskID>,
    pub title: String,
    pub message: String,
    pub motivation_level: MotivationLevel,
    pub scheduled_time: DateTime<Utc>,
    pub status: ReminderStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub seen_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub action_taken: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
    pub user_id: UserID,
    pub reminder_type: ReminderType,
    pub goal_id: Option<GoalID>,
    pub task_id: Option<TaskID>,
    pub title: String,
    pub message: String,
    pub motivation_level: MotivationLevel,
    pub scheduled_time: DateTime<Utc>,
    pub status: ReminderStatus,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateReminderStatusRequest {
    pub status: String,
    #[serde(default)]
    pub action_taken: Option<bool>,
}

#[derive(Serialize, Debug)]
pub struct ReminderListResponse {
    pub reminders: Vec<Reminder>,
    pub count: usize,
}

#[derive(Serialize, Debug)]
pub struct GenerateRemindersResponse {
    pub message: String,
    pub reminders_generated: usize,
    pub reminders: Vec<Reminder>,
}

#[derive(Serialize, Debug)]
pub struct UpdateReminderStatusResponse {
    pub message: String,
    pub reminder: Reminder,
}

#[derive(Serialize, Debug)]
pub struct DeleteReminderResult {
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct ClearRemindersResult {
    pub message: String,
    pub count: usize,
}
