use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::data::{parse_column, parse_optional_timestamp, parse_timestamp, timestamp};
use crate::goals::helpers::{end_date_for, get_goals_for_owner};
use crate::internal_error::{InternalError, InternalResult};
use crate::tasks::data::TaskStatus;
use crate::tasks::helpers::get_tasks_for_goal;

use super::data::*;
use super::generator::{daily_checkin, detect_needed_reminders, GoalProgress, OverdueTask, ReminderContext};

const REMINDER_COLUMNS: &str = "id, user_id, reminder_type, goal_id, task_id, title, message, motivation_level, \
     scheduled_time, status, delivered_at, seen_at, dismissed_at, action_taken, created_at";

pub fn get_reminder_from_row(row: &Row) -> rusqlite::Result<Reminder> {
    let reminder_type: String = row.get(2)?;
    let motivation_level: String = row.get(7)?;
    let scheduled_time: String = row.get(8)?;
    let status: String = row.get(9)?;
    let created_at: String = row.get(14)?;

    Ok(Reminder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        reminder_type: parse_column(2, &reminder_type)?,
        goal_id: row.get(3)?,
        task_id: row.get(4)?,
        title: row.get(5)?,
        message: row.get(6)?,
        motivation_level: parse_column(7, &motivation_level)?,
        scheduled_time: parse_timestamp(8, &scheduled_time)?,
        status: parse_column(9, &status)?,
        delivered_at: parse_optional_timestamp(10, row.get(10)?)?,
        seen_at: parse_optional_timestamp(11, row.get(11)?)?,
        dismissed_at: parse_optional_timestamp(12, row.get(12)?)?,
        action_taken: row.get(13)?,
        created_at: parse_timestamp(14, &created_at)?,
    })
}

pub fn add_reminder_to_db(
    reminder: &NewReminder,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<Reminder> {
    db_connection.execute(
        "INSERT INTO reminders (user_id, reminder_type, goal_id, task_id, title, message, motivation_level,
         scheduled_time, status, delivered_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            reminder.user_id,
            reminder.reminder_type.as_str(),
            reminder.goal_id,
            reminder.task_id,
            reminder.title,
            reminder.message,
            reminder.motivation_level.as_str(),
            timestamp(&reminder.scheduled_time),
            reminder.status.as_str(),
            reminder.delivered_at.as_ref().map(timestamp),
            timestamp(&now),
        ],
    )?;
    let id = db_connection.last_insert_rowid();

    tracing::debug!(
        reminder_id = id,
        user = %reminder.user_id,
        reminder_type = reminder.reminder_type.as_str(),
        "reminder created"
    );

    get_reminder_from_db(id, &reminder.user_id, db_connection)
}

pub fn get_reminder_from_db(
    reminder_id: ReminderID,
    user_id: &str,
    db_connection: &Connection,
) -> InternalResult<Reminder> {
    let reminder = db_connection
        .query_row(
            &format!(
                "SELECT {} FROM reminders WHERE id = (?1) AND user_id = (?2)",
                REMINDER_COLUMNS
            ),
            params![reminder_id, user_id],
            get_reminder_from_row,
        )
        .optional()?;

    reminder.ok_or_else(|| InternalError::not_found("Reminder", reminder_id))
}

/// Marks every pending reminder whose time has come as delivered. Delivery
/// has no timer behind it; it happens here, whenever reminders are read.
pub fn deliver_due_reminders(
    user_id: &str,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<usize> {
    let now = timestamp(&now);
    let delivered = db_connection.execute(
        "UPDATE reminders SET status = (?1), delivered_at = (?2)
         WHERE user_id = (?3) AND status = (?4) AND scheduled_time <= (?2)",
        params![
            ReminderStatus::Delivered.as_str(),
            now,
            user_id,
            ReminderStatus::Pending.as_str(),
        ],
    )?;

    if delivered > 0 {
        tracing::debug!(user = user_id, delivered, "reminders delivered");
    }

    Ok(delivered)
}

pub fn get_reminders_for_user(
    user_id: &str,
    status: Option<ReminderStatus>,
    limit: i64,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<Vec<Reminder>> {
    deliver_due_reminders(user_id, now, db_connection)?;

    let mut reminder_statement = db_connection.prepare(&format!(
        "SELECT {} FROM reminders WHERE user_id = (?1) AND ((?2) IS NULL OR status = (?2))
         ORDER BY scheduled_time DESC, id DESC LIMIT (?3)",
        REMINDER_COLUMNS
    ))?;

    let reminders = reminder_statement
        .query_map(
            params![user_id, status.map(ReminderStatus::as_str), limit],
            get_reminder_from_row,
        )?
        .collect::<rusqlite::Result<Vec<Reminder>>>()?;

    Ok(reminders)
}

/// Delivers and returns the reminders that have just come due.
pub fn take_due_reminders(
    user_id: &str,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<Vec<Reminder>> {
    let mut due_statement = db_connection.prepare(
        "SELECT id FROM reminders WHERE user_id = (?1) AND status = (?2) AND scheduled_time <= (?3)
         ORDER BY scheduled_time, id",
    )?;
    let due = due_statement
        .query_map(
            params![user_id, ReminderStatus::Pending.as_str(), timestamp(&now)],
            |row| row.get::<usize, ReminderID>(0),
        )?
        .collect::<rusqlite::Result<Vec<ReminderID>>>()?;

    deliver_due_reminders(user_id, now, db_connection)?;

    due.into_iter()
        .map(|reminder_id| get_reminder_from_db(reminder_id, user_id, db_connection))
        .collect()
}

fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN));

    (start, start + Duration::days(1))
}

fn count_reminders_of_type_since(
    user_id: &str,
    reminder_type: ReminderType,
    since: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
    db_connection: &Connection,
) -> InternalResult<i64> {
    let count = db_connection.query_row(
        "SELECT COUNT(*) FROM reminders WHERE user_id = (?1) AND reminder_type = (?2)
         AND created_at >= (?3) AND ((?4) IS NULL OR created_at < (?4))",
        params![
            user_id,
            reminder_type.as_str(),
            timestamp(&since),
            until.as_ref().map(timestamp),
        ],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Snapshot of a user's goals and tasks for reminder generation.
pub fn build_reminder_context(
    user_id: &str,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<ReminderContext> {
    let mut context = ReminderContext::default();
    let week_ago = now - Duration::days(7);

    for goal in get_goals_for_owner(user_id, db_connection)? {
        let tasks = get_tasks_for_goal(goal.id, db_connection)?;

        let count = |status: TaskStatus| tasks.iter().filter(|task| task.status == status).count();
        context.not_started_tasks += count(TaskStatus::NotStarted);
        context.completed_this_week += tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Completed && task.updated_at >= week_ago)
            .count();

        if context.overdue_task.is_none() {
            context.overdue_task = tasks
                .iter()
                .find(|task| {
                    task.status != TaskStatus::Completed
                        && end_date_for(goal.start_date, task.week_number)
                            .map_or(false, |due| due <= now)
                })
                .map(|task| OverdueTask {
                    goal_id: goal.id,
                    task_id: task.id,
                    title: task.title.clone(),
                });
        }

        context.goals.push(GoalProgress {
            goal_id: goal.id,
            title: goal.title.clone(),
            total: tasks.len(),
            completed: count(TaskStatus::Completed),
            in_progress: count(TaskStatus::InProgress),
        });
    }

    context.has_recent_weekly_review =
        count_reminders_of_type_since(user_id, ReminderType::WeeklyReview, week_ago, None, db_connection)? > 0;

    Ok(context)
}

/// One check-in per user per UTC calendar day.
pub fn create_daily_checkin(
    user_id: &str,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<Reminder> {
    let (day_start, day_end) = day_bounds(now);
    let existing = count_reminders_of_type_since(
        user_id,
        ReminderType::DailyCheckin,
        day_start,
        Some(day_end),
        db_connection,
    )?;

    if existing > 0 {
        return Err(InternalError::conflict(
            "Daily check-in already generated for today. Come back tomorrow!",
        ));
    }

    let context = build_reminder_context(user_id, now, db_connection)?;
    let checkin = daily_checkin(user_id, context.goals.len(), context.not_started_tasks, now);

    add_reminder_to_db(&checkin, now, db_connection)
}

pub fn generate_contextual_reminders(
    user_id: &str,
    now: DateTime<Utc>,
    db_connection: &mut Connection,
) -> InternalResult<Vec<Reminder>> {
    let context = build_reminder_context(user_id, now, db_connection)?;
    let needed = detect_needed_reminders(user_id, &context, now);

    let transaction = db_connection.transaction()?;
    let reminders = needed
        .iter()
        .map(|reminder| add_reminder_to_db(reminder, now, &transaction))
        .collect::<InternalResult<Vec<Reminder>>>()?;
    transaction.commit()?;

    tracing::info!(user = user_id, count = reminders.len(), "reminders generated");

    Ok(reminders)
}

/// Applies a seen/dismissed request. Returns the reminder and whether its
/// status actually changed.
pub fn update_reminder_status(
    reminder_id: ReminderID,
    user_id: &str,
    request: &UpdateReminderStatusRequest,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<(Reminder, bool)> {
    let target: ReminderStatus = request.status.parse()?;

    deliver_due_reminders(user_id, now, db_connection)?;
    let reminder = get_reminder_from_db(reminder_id, user_id, db_connection)?;

    let changed = match reminder.status.transition_to(target)? {
        Transition::Unchanged => false,
        Transition::Apply => {
            let column = match target {
                ReminderStatus::Seen => "seen_at",
                _ => "dismissed_at",
            };
            db_connection.execute(
                &format!("UPDATE reminders SET status = (?1), {} = (?2) WHERE id = (?3)", column),
                params![target.as_str(), timestamp(&now), reminder_id],
            )?;
            true
        }
    };

    if let Some(action_taken) = request.action_taken {
        db_connection.execute(
            "UPDATE reminders SET action_taken = (?1) WHERE id = (?2)",
            params![action_taken, reminder_id],
        )?;
    }

    if changed {
        tracing::info!(reminder_id, user = user_id, status = %target, "reminder status updated");
    }

    Ok((get_reminder_from_db(reminder_id, user_id, db_connection)?, changed))
}

pub fn delete_reminder_from_db(
    reminder_id: ReminderID,
    user_id: &str,
    db_connection: &Connection,
) -> InternalResult<()> {
    let deleted = db_connection.execute(
        "DELETE FROM reminders WHERE id = (?1) AND user_id = (?2)",
        params![reminder_id, user_id],
    )?;

    if deleted == 0 {
        return Err(InternalError::not_found("Reminder", reminder_id));
    }

    Ok(())
}

pub fn clear_reminders_for_user(user_id: &str, db_connection: &Connection) -> InternalResult<usize> {
    let count = db_connection.execute("DELETE FROM reminders WHERE user_id = (?1)", params![user_id])?;

    tracing::info!(user = user_id, count, "reminders cleared");

    Ok(count)
}
