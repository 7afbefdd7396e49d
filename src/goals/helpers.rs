use chrono::{DateTime, Datelike, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::data::{parse_column, parse_timestamp, timestamp};
use crate::internal_error::{InternalError, InternalResult};

use super::data::*;

/// Stored dates are four-digit-year RFC 3339 text, so goals must fit in it.
const FIRST_YEAR: i32 = 1970;
const LAST_YEAR: i32 = 9999;

const GOAL_COLUMNS: &str =
    "id, owner, title, duration_weeks, priority, intensity, start_date, end_date, created_at";

pub fn get_goal_from_row(row: &Row) -> rusqlite::Result<Goal> {
    let priority: String = row.get(4)?;
    let intensity: String = row.get(5)?;
    let start_date: String = row.get(6)?;
    let end_date: String = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok(Goal {
        id: row.get(0)?,
        owner: row.get(1)?,
        title: row.get(2)?,
        duration_weeks: row.get(3)?,
        priority: parse_column(4, &priority)?,
        intensity: parse_column(5, &intensity)?,
        start_date: parse_timestamp(6, &start_date)?,
        end_date: parse_timestamp(7, &end_date)?,
        created_at: parse_timestamp(8, &created_at)?,
    })
}

pub fn validate_goal_request(
    request: &GoalRequest,
    max_duration_weeks: i64,
) -> InternalResult<NewGoal> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(InternalError::validation("Goal title must not be empty"));
    }

    if request.duration_weeks <= 0 {
        return Err(InternalError::validation(format!(
            "Invalid duration_weeks {}: must be a positive number of weeks",
            request.duration_weeks
        )));
    }

    if request.duration_weeks > max_duration_weeks {
        return Err(InternalError::validation(format!(
            "Invalid duration_weeks {}: must be at most {}",
            request.duration_weeks, max_duration_weeks
        )));
    }

    if let Some(start_date) = request.start_date {
        if !(FIRST_YEAR..=LAST_YEAR).contains(&start_date.year()) {
            return Err(InternalError::validation(format!(
                "Invalid start_date {}: must fall between the years {} and {}",
                start_date, FIRST_YEAR, LAST_YEAR
            )));
        }
        end_date_for(start_date, request.duration_weeks)?;
    }

    Ok(NewGoal {
        title: title.to_string(),
        duration_weeks: request.duration_weeks,
        priority: request.priority.parse()?,
        intensity: request.intensity.parse()?,
        start_date: request.start_date,
    })
}

pub fn end_date_for(start_date: DateTime<Utc>, duration_weeks: i64) -> InternalResult<DateTime<Utc>> {
    Duration::try_weeks(duration_weeks)
        .and_then(|duration| start_date.checked_add_signed(duration))
        .filter(|end_date| end_date.year() <= LAST_YEAR)
        .ok_or_else(|| {
            InternalError::validation(format!(
                "A goal of {} weeks starting {} would end after the year {}",
                duration_weeks, start_date, LAST_YEAR
            ))
        })
}

pub fn add_goal_to_db(
    owner: &str,
    goal: NewGoal,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<Goal> {
    let start_date = goal.start_date.unwrap_or(now);
    let end_date = end_date_for(start_date, goal.duration_weeks)?;

    db_connection.execute(
        "INSERT INTO goals (owner, title, duration_weeks, priority, intensity, start_date, end_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            owner,
            goal.title,
            goal.duration_weeks,
            goal.priority.as_str(),
            goal.intensity.as_str(),
            timestamp(&start_date),
            timestamp(&end_date),
            timestamp(&now),
        ],
    )?;
    let id = db_connection.last_insert_rowid();

    tracing::info!(goal_id = id, owner, title = %goal.title, "goal created");

    get_goal_from_db(id, owner, db_connection)
}

/// Goals owned by somebody else are reported as missing.
pub fn get_goal_from_db(
    goal_id: GoalID,
    owner: &str,
    db_connection: &Connection,
) -> InternalResult<Goal> {
    let goal = db_connection
        .query_row(
            &format!("SELECT {} FROM goals WHERE id = (?1) AND owner = (?2)", GOAL_COLUMNS),
            params![goal_id, owner],
            get_goal_from_row,
        )
        .optional()?;

    goal.ok_or_else(|| InternalError::not_found("Goal", goal_id))
}

pub fn get_goals_for_owner(owner: &str, db_connection: &Connection) -> InternalResult<Vec<Goal>> {
    let mut goal_statement = db_connection.prepare(&format!(
        "SELECT {} FROM goals WHERE owner = (?1) ORDER BY id",
        GOAL_COLUMNS
    ))?;

    let goals = goal_statement
        .query_map(params![owner], get_goal_from_row)?
        .collect::<rusqlite::Result<Vec<Goal>>>()?;

    Ok(goals)
}

pub fn count_tasks_for_goal(goal_id: GoalID, db_connection: &Connection) -> InternalResult<i64> {
    let count = db_connection.query_row(
        "SELECT COUNT(*) FROM tasks WHERE goal_id = (?1)",
        params![goal_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Replaces the editable fields of a goal. The start date is kept unless the
/// request names a new one, and the end date follows from it. The duration
/// is frozen once tasks have been generated.
pub fn update_goal_in_db(
    goal_id: GoalID,
    owner: &str,
    update: NewGoal,
    db_connection: &Connection,
) -> InternalResult<Goal> {
    let existing = get_goal_from_db(goal_id, owner, db_connection)?;

    if update.duration_weeks != existing.duration_weeks
        && count_tasks_for_goal(goal_id, db_connection)? > 0
    {
        return Err(InternalError::conflict(format!(
            "Goal {} already has tasks; its duration cannot change from {} to {} weeks",
            goal_id, existing.duration_weeks, update.duration_weeks
        )));
    }

    let start_date = update.start_date.unwrap_or(existing.start_date);
    let end_date = end_date_for(start_date, update.duration_weeks)?;

    db_connection.execute(
        "UPDATE goals SET title = (?1), duration_weeks = (?2), priority = (?3), intensity = (?4),
         start_date = (?5), end_date = (?6) WHERE id = (?7)",
        params![
            update.title,
            update.duration_weeks,
            update.priority.as_str(),
            update.intensity.as_str(),
            timestamp(&start_date),
            timestamp(&end_date),
            goal_id,
        ],
    )?;

    tracing::info!(goal_id, owner, "goal updated");

    get_goal_from_db(goal_id, owner, db_connection)
}

pub fn delete_goal_from_db(
    goal_id: GoalID,
    owner: &str,
    db_connection: &Connection,
) -> InternalResult<DeleteGoalResult> {
    let goal = get_goal_from_db(goal_id, owner, db_connection)?;
    let deleted_tasks_count = count_tasks_for_goal(goal_id, db_connection)?;

    db_connection.execute("DELETE FROM tasks WHERE goal_id = (?1)", params![goal_id])?;
    db_connection.execute("DELETE FROM goals WHERE id = (?1)", params![goal_id])?;

    tracing::info!(goal_id, owner, deleted_tasks_count, "goal deleted");

    Ok(DeleteGoalResult {
        message: String::from("Goal deleted successfully"),
        deleted_goal_title: goal.title,
        deleted_goal_id: goal_id,
        deleted_tasks_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::open_in_memory_database;
    use chrono::TimeZone;

    fn request(title: &str, duration_weeks: i64, intensity: &str) -> GoalRequest {
        GoalRequest {
            title: title.to_string(),
            duration_weeks,
            priority: String::from("High"),
            intensity: intensity.to_string(),
            start_date: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap()
    }

    #[test]
    fn rejects_non_positive_duration() {
        let err = validate_goal_request(&request("Learn Rust", 0, "Normal"), 52).unwrap_err();
        assert!(matches!(err, InternalError::Validation(_)));

        let err = validate_goal_request(&request("Learn Rust", -3, "Normal"), 52).unwrap_err();
        assert!(matches!(err, InternalError::Validation(_)));
    }

    #[test]
    fn rejects_unknown_intensity() {
        let err = validate_goal_request(&request("Learn Rust", 4, "Extreme"), 52).unwrap_err();
        assert!(err.to_string().contains("Extreme"));
    }

    #[test]
    fn end_date_is_start_plus_duration() {
        let connection = open_in_memory_database().unwrap();
        let goal = validate_goal_request(&request("Learn Rust", 3, "light"), 52).unwrap();

        let goal = add_goal_to_db("ana", goal, now(), &connection).unwrap();

        assert_eq!(goal.start_date, now());
        assert_eq!(goal.end_date, now() + Duration::weeks(3));
        assert_eq!(goal.intensity, Intensity::Light);
        assert_eq!(goal.priority, Priority::High);
    }

    #[test]
    fn start_dates_outside_the_storable_range_are_rejected() {
        let far_future = Utc.with_ymd_and_hms(200_000, 12, 25, 0, 0, 0).unwrap();
        let near_the_edge = Utc.with_ymd_and_hms(9999, 12, 1, 0, 0, 0).unwrap();
        let too_early = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();

        for start_date in [far_future, near_the_edge, too_early] {
            let goal = GoalRequest {
                start_date: Some(start_date),
                ..request("Learn Rust", 52, "Normal")
            };
            let err = validate_goal_request(&goal, 52).unwrap_err();
            assert!(matches!(err, InternalError::Validation(_)));
        }
    }

    #[test]
    fn end_date_overflow_is_a_validation_error() {
        let start = Utc.with_ymd_and_hms(9999, 12, 30, 0, 0, 0).unwrap();

        assert!(matches!(end_date_for(start, 1), Err(InternalError::Validation(_))));
        assert!(matches!(end_date_for(now(), i64::MAX), Err(InternalError::Validation(_))));
        assert_eq!(end_date_for(now(), 2).unwrap(), now() + Duration::weeks(2));
    }

    #[test]
    fn goals_are_scoped_to_their_owner() {
        let connection = open_in_memory_database().unwrap();
        let goal = validate_goal_request(&request("Learn Rust", 3, "Normal"), 52).unwrap();
        let goal = add_goal_to_db("ana", goal, now(), &connection).unwrap();

        assert!(get_goal_from_db(goal.id, "ana", &connection).is_ok());
        assert!(matches!(
            get_goal_from_db(goal.id, "ben", &connection),
            Err(InternalError::NotFound(_))
        ));
        assert!(get_goals_for_owner("ben", &connection).unwrap().is_empty());
    }

    #[test]
    fn duration_is_frozen_once_tasks_exist() {
        let connection = open_in_memory_database().unwrap();
        let goal = validate_goal_request(&request("Learn Rust", 3, "Normal"), 52).unwrap();
        let goal = add_goal_to_db("ana", goal, now(), &connection).unwrap();
        connection
            .execute(
                "INSERT INTO tasks (goal_id, week_number, title, description, status, position, created_at, updated_at)
                 VALUES (?1, 1, 't', 'd', 'Not Started', 0, 'x', 'x')",
                params![goal.id],
            )
            .unwrap();

        let longer = validate_goal_request(&request("Learn Rust", 5, "Normal"), 52).unwrap();
        let err = update_goal_in_db(goal.id, "ana", longer, &connection).unwrap_err();
        assert!(matches!(err, InternalError::Conflict(_)));

        let renamed = validate_goal_request(&request("Learn Rust well", 3, "Aggressive"), 52).unwrap();
        let updated = update_goal_in_db(goal.id, "ana", renamed, &connection).unwrap();
        assert_eq!(updated.title, "Learn Rust well");
        assert_eq!(updated.start_date, goal.start_date);
    }

    #[test]
    fn deleting_a_goal_removes_its_tasks() {
        let connection = open_in_memory_database().unwrap();
        let goal = validate_goal_request(&request("Learn Rust", 1, "Normal"), 52).unwrap();
        let goal = add_goal_to_db("ana", goal, now(), &connection).unwrap();
        connection
            .execute(
                "INSERT INTO tasks (goal_id, week_number, title, description, status, position, created_at, updated_at)
                 VALUES (?1, 1, 't', 'd', 'Not Started', 0, 'x', 'x')",
                params![goal.id],
            )
            .unwrap();

        let result = delete_goal_from_db(goal.id, "ana", &connection).unwrap();

        assert_eq!(result.deleted_tasks_count, 1);
        assert_eq!(count_tasks_for_goal(goal.id, &connection).unwrap(), 0);
    }
}
