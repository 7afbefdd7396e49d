use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use crate::activity::data::ActivityType;
use crate::activity::helpers::record_activity;
use crate::config::CompanionConfig;
use crate::data::DBConnection;
use crate::internal_error::InternalResult;
use crate::user::CurrentUser;

use super::data::*;
use super::helpers::*;

#[post("/productivity/daily-checkin")]
pub fn daily_checkin(
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<(Status, Json<Reminder>)> {
    let db_connection = db_connection.lock()?;
    let reminder = create_daily_checkin(&user.0, Utc::now(), &db_connection)?;

    Ok((Status::Created, Json(reminder)))
}

#[post("/productivity/reminders/generate")]
pub fn generate_reminders(
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<(Status, Json<GenerateRemindersResponse>)> {
    let mut db_connection = db_connection.lock()?;
    let reminders = generate_contextual_reminders(&user.0, Utc::now(), &mut db_connection)?;

    Ok((
        Status::Created,
        Json(GenerateRemindersResponse {
            message: format!("Generated {} reminder(s)", reminders.len()),
            reminders_generated: reminders.len(),
            reminders,
        }),
    ))
}

#[get("/productivity/reminders?<status>&<limit>")]
pub fn get_reminders(
    status: Option<String>,
    limit: Option<i64>,
    user: CurrentUser,
    config: &State<CompanionConfig>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReminderListResponse>> {
    let status = status
        .map(|status| status.parse::<ReminderStatus>())
        .transpose()?;
    let limit = limit.unwrap_or(config.reminder_list_limit).max(0);

    let db_connection = db_connection.lock()?;
    let reminders = get_reminders_for_user(&user.0, status, limit, Utc::now(), &db_connection)?;

    Ok(Json(ReminderListResponse {
        count: reminders.len(),
        reminders,
    }))
}

#[get("/productivity/reminders/pending")]
pub fn get_pending_reminders(
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReminderListResponse>> {
    let db_connection = db_connection.lock()?;
    let reminders = take_due_reminders(&user.0, Utc::now(), &db_connection)?;

    Ok(Json(ReminderListResponse {
        count: reminders.len(),
        reminders,
    }))
}

#[patch("/productivity/reminders/<reminder_id>/status", format = "json", data = "<status_request>")]
pub fn update_status(
    reminder_id: ReminderID,
    status_request: Json<UpdateReminderStatusRequest>,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<UpdateReminderStatusResponse>> {
    let now = Utc::now();
    let db_connection = db_connection.lock()?;

    let (reminder, changed) =
        update_reminder_status(reminder_id, &user.0, &status_request, now, &db_connection)?;

    if changed {
        let activity_type = match reminder.status {
            ReminderStatus::Seen => ActivityType::ReminderSeen,
            _ => ActivityType::ReminderDismissed,
        };
        record_activity(&db_connection, &user.0, activity_type, "reminder", reminder.id, now)?;
    }

    Ok(Json(UpdateReminderStatusResponse {
        message: format!("Reminder marked as {}", reminder.status),
        reminder,
    }))
}

#[delete("/productivity/reminders/clear-all")]
pub fn clear_all_reminders(
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ClearRemindersResult>> {
    let db_connection = db_connection.lock()?;
    let count = clear_reminders_for_user(&user.0, &db_connection)?;

    Ok(Json(ClearRemindersResult {
        message: format!("Cleared {} reminder(s)", count),
        count,
    }))
}

#[delete("/productivity/reminders/<reminder_id>")]
pub fn delete_reminder(
    reminder_id: ReminderID,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<DeleteReminderResult>> {
    let db_connection = db_connection.lock()?;
    delete_reminder_from_db(reminder_id, &user.0, &db_connection)?;

    Ok(Json(DeleteReminderResult {
        message: String::from("Reminder deleted successfully"),
    }))
}
