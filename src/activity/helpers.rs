use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use rusqlite::types::Type;

use crate::data::{parse_column, parse_timestamp, timestamp};
use crate::internal_error::{InternalError, InternalResult};

use super::analyzer::{analyze, engagement, recommendations, ANALYSIS_WINDOW_DAYS};
use super::data::*;

/// Ten years of history is the most a single request may ask for.
pub const MAX_HISTORY_DAYS: i64 = 3650;

const ACTIVITY_COLUMNS: &str =
    "id, user_id, activity_type, related_entity_type, related_entity_id, activity_data, timestamp";

pub fn get_activity_from_row(row: &Row) -> rusqlite::Result<ActivityLog> {
    let activity_type: String = row.get(2)?;
    let activity_data: Option<String> = row.get(5)?;
    let time: String = row.get(6)?;

    let activity_data = activity_data
        .map(|data| serde_json::from_str(&data))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(ActivityLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        activity_type: parse_column(2, &activity_type)?,
        related_entity_type: row.get(3)?,
        related_entity_id: row.get(4)?,
        activity_data,
        timestamp: parse_timestamp(6, &time)?,
    })
}

pub fn log_activity(
    user_id: &str,
    request: &LogActivityRequest,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<ActivityLog> {
    let activity_type: ActivityType = request.activity_type.parse()?;
    let activity_data = request
        .activity_data
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    db_connection.execute(
        &format!(
            "INSERT INTO activity_logs ({}) VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6)",
            ACTIVITY_COLUMNS
        ),
        params![
            user_id,
            activity_type.as_str(),
            request.related_entity_type,
            request.related_entity_id,
            activity_data,
            timestamp(&now),
        ],
    )?;
    let id = db_connection.last_insert_rowid();

    tracing::debug!(activity_id = id, user = user_id, %activity_type, "activity logged");

    Ok(ActivityLog {
        id,
        user_id: user_id.to_string(),
        activity_type,
        related_entity_type: request.related_entity_type.clone(),
        related_entity_id: request.related_entity_id,
        activity_data: request.activity_data.clone(),
        timestamp: now,
    })
}

/// Implicit activity recorded alongside goal, task and reminder changes.
pub fn record_activity(
    db_connection: &Connection,
    user_id: &str,
    activity_type: ActivityType,
    entity_type: &str,
    entity_id: i64,
    now: DateTime<Utc>,
) -> InternalResult<()> {
    let request = LogActivityRequest {
        activity_type: activity_type.as_str().to_string(),
        related_entity_type: Some(entity_type.to_string()),
        related_entity_id: Some(entity_id),
        activity_data: None,
    };

    log_activity(user_id, &request, now, db_connection).map(|_| ())
}

/// Newest first.
pub fn get_activities_since(
    user_id: &str,
    since: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<Vec<ActivityLog>> {
    let mut activity_statement = db_connection.prepare(&format!(
        "SELECT {} FROM activity_logs WHERE user_id = (?1) AND timestamp >= (?2)
         ORDER BY timestamp DESC, id DESC",
        ACTIVITY_COLUMNS
    ))?;

    let activities = activity_statement
        .query_map(params![user_id, timestamp(&since)], get_activity_from_row)?
        .collect::<rusqlite::Result<Vec<ActivityLog>>>()?;

    Ok(activities)
}

pub fn get_activity_history(
    user_id: &str,
    days: i64,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<ActivityHistoryResponse> {
    if days <= 0 || days > MAX_HISTORY_DAYS {
        return Err(InternalError::validation(format!(
            "Invalid days {}: must be between 1 and {}",
            days, MAX_HISTORY_DAYS
        )));
    }

    let since = Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| InternalError::validation(format!("Invalid days {}: window out of range", days)))?;
    let activities = get_activities_since(user_id, since, db_connection)?;

    Ok(ActivityHistoryResponse {
        count: activities.len(),
        activities,
        period_days: days,
    })
}

pub fn analyze_user_productivity(
    user_id: &str,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<ProductivityAnalysis> {
    let window_start = now - Duration::days(ANALYSIS_WINDOW_DAYS);
    let activities = get_activities_since(user_id, window_start, db_connection)?;

    Ok(analyze(&activities))
}

pub fn productivity_profile(
    user_id: &str,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<ProductivityProfile> {
    Ok(ProductivityProfile {
        user_id: user_id.to_string(),
        analysis: analyze_user_productivity(user_id, now, db_connection)?,
        analyzed_at: now,
    })
}

pub fn reminder_engagement(user_id: &str, db_connection: &Connection) -> InternalResult<Engagement> {
    let (total, acted_on): (i64, i64) = db_connection.query_row(
        "SELECT COUNT(*), COALESCE(SUM(action_taken), 0) FROM reminders WHERE user_id = (?1)",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(engagement(total, acted_on))
}

pub fn productivity_insights(
    user_id: &str,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<ProductivityInsights> {
    let analysis = analyze_user_productivity(user_id, now, db_connection)?;

    Ok(ProductivityInsights {
        engagement: reminder_engagement(user_id, db_connection)?,
        recommendations: recommendations(&analysis, now),
        analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::open_in_memory_database;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn logged_activity_keeps_its_payload() {
        let connection = open_in_memory_database().unwrap();
        let request = LogActivityRequest {
            activity_type: String::from("task_missed"),
            related_entity_type: Some(String::from("task")),
            related_entity_id: Some(7),
            activity_data: Some(json!({"reason": "travel"})),
        };

        let logged = log_activity("ana", &request, at(2, 9), &connection).unwrap();
        let history = get_activity_history("ana", 7, at(3, 9), &connection).unwrap();

        assert_eq!(history.count, 1);
        assert_eq!(history.activities[0], logged);
        assert_eq!(history.activities[0].activity_data, Some(json!({"reason": "travel"})));
    }

    #[test]
    fn unknown_activity_types_are_rejected() {
        let connection = open_in_memory_database().unwrap();
        let request = LogActivityRequest {
            activity_type: String::from("nap"),
            related_entity_type: None,
            related_entity_id: None,
            activity_data: None,
        };

        assert!(matches!(
            log_activity("ana", &request, at(2, 9), &connection),
            Err(InternalError::Validation(_))
        ));
    }

    #[test]
    fn history_is_limited_to_the_window_and_the_user() {
        let connection = open_in_memory_database().unwrap();
        record_activity(&connection, "ana", ActivityType::GoalCreated, "goal", 1, at(1, 9)).unwrap();
        record_activity(&connection, "ana", ActivityType::TaskCreated, "task", 1, at(9, 9)).unwrap();
        record_activity(&connection, "ben", ActivityType::TaskCreated, "task", 2, at(9, 9)).unwrap();

        let history = get_activity_history("ana", 7, at(10, 9), &connection).unwrap();
        assert_eq!(history.count, 1);
        assert_eq!(history.activities[0].activity_type, ActivityType::TaskCreated);

        assert!(get_activity_history("ana", 0, at(10, 9), &connection).is_err());
    }

    #[test]
    fn history_windows_beyond_the_limit_are_rejected() {
        let connection = open_in_memory_database().unwrap();
        record_activity(&connection, "ana", ActivityType::GoalCreated, "goal", 1, at(1, 9)).unwrap();

        for days in [MAX_HISTORY_DAYS + 1, 1_000_000_000, i64::MAX] {
            assert!(matches!(
                get_activity_history("ana", days, at(10, 9), &connection),
                Err(InternalError::Validation(_))
            ));
        }

        let widest = get_activity_history("ana", MAX_HISTORY_DAYS, at(10, 9), &connection).unwrap();
        assert_eq!(widest.count, 1);
        assert_eq!(widest.period_days, MAX_HISTORY_DAYS);
    }

    #[test]
    fn engagement_counts_reminders_acted_on() {
        let connection = open_in_memory_database().unwrap();
        assert_eq!(reminder_engagement("ana", &connection).unwrap().engagement_rate, 0.0);

        for action_taken in [true, false, false, true] {
            connection
                .execute(
                    "INSERT INTO reminders (user_id, reminder_type, title, message, motivation_level,
                     scheduled_time, status, action_taken, created_at)
                     VALUES ('ana', 'motivation', 't', 'm', 'neutral', ?1, 'delivered', ?2, ?1)",
                    params![timestamp(&at(2, 9)), action_taken],
                )
                .unwrap();
        }

        let engagement = reminder_engagement("ana", &connection).unwrap();
        assert_eq!(engagement.total_reminders, 4);
        assert_eq!(engagement.acted_on, 2);
        assert_eq!(engagement.engagement_rate, 50.0);
    }

    #[test]
    fn insights_use_the_thirty_day_window() {
        let connection = open_in_memory_database().unwrap();
        for day in 1..=12 {
            record_activity(&connection, "ana", ActivityType::TaskCompleted, "task", day, at(day as u32, 6)).unwrap();
        }

        let insights = productivity_insights("ana", at(20, 12), &connection).unwrap();
        assert!(insights.analysis.personalized);
        assert_eq!(insights.analysis.high_productivity_hours, vec![HourRange { start: 6, end: 6 }]);
        assert!(!insights.recommendations.should_send_reminder_now);

        let next_month = Utc.with_ymd_and_hms(2026, 5, 5, 12, 0, 0).unwrap();
        let later = productivity_insights("ana", next_month, &connection).unwrap();
        assert_eq!(later.analysis.total_activities, 7);
        assert!(!later.analysis.personalized);
    }
}
