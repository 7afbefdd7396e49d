use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::fmt;
use std::str::FromStr;

use crate::data::UserID;
use crate::internal_error::InternalError;

pub type ActivityID = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    TaskCreated,
    TaskCompleted,
    TaskUpdated,
    TaskMissed,
    GoalCreated,
    GoalUpdated,
    ReminderSeen,
    ReminderDismissed,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::TaskCreated => "task_created",
            ActivityType::TaskCompleted => "task_completed",
            ActivityType::TaskUpdated => "task_updated",
            ActivityType::TaskMissed => "task_missed",
            ActivityType::GoalCreated => "goal_created",
            ActivityType::GoalUpdated => "goal_updated",
            ActivityType::ReminderSeen => "reminder_seen",
            ActivityType::ReminderDismissed => "reminder_dismissed",
        }
    }
}

impl FromStr for ActivityType {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<ActivityType, InternalError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task_created" => Ok(ActivityType::TaskCreated),
            "task_completed" => Ok(ActivityType::TaskCompleted),
            "task_updated" => Ok(ActivityType::TaskUpdated),
            "task_missed" => Ok(ActivityType::TaskMissed),
            "goal_created" => Ok(ActivityType::GoalCreated),
            "goal_updated" => Ok(ActivityType::GoalUpdated),
            "reminder_seen" => Ok(ActivityType::ReminderSeen),
            "reminder_dismissed" => Ok(ActivityType::ReminderDismissed),
            _ => Err(InternalError::validation(format!("Invalid activity type '{}'", s))),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActivityLog {
    pub id: ActivityID,
    pub user_id: UserID,
    pub activity_type: ActivityType,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<i64>,
    pub activity_data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
pub struct LogActivityRequest {
    pub activity_type: String,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    #[serde(default)]
    pub related_entity_id: Option<i64>,
    #[serde(default)]
    pub activity_data: Option<Value>,
}

#[derive(Serialize, Debug)]
pub struct ActivityHistoryResponse {
    pub activities: Vec<ActivityLog>,
    pub count: usize,
    pub period_days: i64,
}

/// Inclusive range of hours of the day.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    pub start: u32,
    pub end: u32,
}

impl HourRange {
    pub fn contains(&self, hour: u32) -> bool {
        self.start <= hour && hour <= self.end
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProductivityAnalysis {
    pub high_productivity_hours: Vec<HourRange>,
    pub low_energy_hours: Vec<HourRange>,
    pub total_activities: usize,
    pub completed_tasks: usize,
    pub missed_tasks: usize,
    pub most_active_hours: Vec<HourCount>,
    /// False when there was too little activity and the default windows
    /// were used.
    pub personalized: bool,
}

#[derive(Serialize, Debug)]
pub struct ProductivityProfile {
    pub user_id: UserID,
    #[serde(flatten)]
    pub analysis: ProductivityAnalysis,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Engagement {
    pub total_reminders: i64,
    pub acted_on: i64,
    pub engagement_rate: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub next_optimal_reminder_time: DateTime<Utc>,
    pub should_send_reminder_now: bool,
}

#[derive(Serialize, Debug)]
pub struct ProductivityInsights {
    pub analysis: ProductivityAnalysis,
    pub engagement: Engagement,
    pub recommendations: Recommendations,
}
