use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::data::UserID;
use crate::internal_error::InternalError;

pub type GoalID = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Light,
    Normal,
    Aggressive,
}

impl Intensity {
    pub fn tasks_per_week(self) -> i64 {
        match self {
            Intensity::Light => 2,
            Intensity::Normal => 3,
            Intensity::Aggressive => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Light => "Light",
            Intensity::Normal => "Normal",
            Intensity::Aggressive => "Aggressive",
        }
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl FromStr for Intensity {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Intensity, InternalError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Intensity::Light),
            "normal" => Ok(Intensity::Normal),
            "aggressive" => Ok(Intensity::Aggressive),
            _ => Err(InternalError::validation(format!(
                "Invalid intensity '{}', expected one of Light, Normal, Aggressive",
                s
            ))),
        }
    }
}

impl FromStr for Priority {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Priority, InternalError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(InternalError::validation(format!(
                "Invalid priority '{}', expected one of Low, Medium, High",
                s
            ))),
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: GoalID,
    pub owner: UserID,
    pub title: String,
    pub duration_weeks: i64,
    pub priority: Priority,
    pub intensity: Intensity,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Body of both goal creation and goal update. Enum fields arrive as plain
/// strings so a bad value is reported as a validation error.
#[derive(Deserialize, Debug, Clone)]
pub struct GoalRequest {
    pub title: String,
    pub duration_weeks: i64,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_intensity")]
    pub intensity: String,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
}

fn default_priority() -> String {
    Priority::Medium.to_string()
}

fn default_intensity() -> String {
    Intensity::Normal.to_string()
}

/// A `GoalRequest` whose fields passed validation.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub duration_weeks: i64,
    pub priority: Priority,
    pub intensity: Intensity,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug)]
pub struct GoalListResponse {
    pub goals: Vec<Goal>,
    pub count: usize,
}

#[derive(Serialize, Debug)]
pub struct DeleteGoalResult {
    pub message: String,
    pub deleted_goal_title: String,
    pub deleted_goal_id: GoalID,
    pub deleted_tasks_count: i64,
}
