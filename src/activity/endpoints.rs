use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::data::DBConnection;
use crate::internal_error::InternalResult;
use crate::user::CurrentUser;

use super::data::*;
use super::helpers::*;

const DEFAULT_HISTORY_DAYS: i64 = 7;

#[post("/activity/log", format = "json", data = "<activity_request>")]
pub fn log_user_activity(
    activity_request: Json<LogActivityRequest>,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<(Status, Json<ActivityLog>)> {
    let db_connection = db_connection.lock()?;
    let activity = log_activity(&user.0, &activity_request, Utc::now(), &db_connection)?;

    Ok((Status::Created, Json(activity)))
}

#[get("/activity/history?<days>")]
pub fn get_history(
    days: Option<i64>,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ActivityHistoryResponse>> {
    let db_connection = db_connection.lock()?;

    get_activity_history(
        &user.0,
        days.unwrap_or(DEFAULT_HISTORY_DAYS),
        Utc::now(),
        &db_connection,
    )
    .map(Json)
}

#[get("/productivity/profile")]
pub fn get_profile(
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ProductivityProfile>> {
    let db_connection = db_connection.lock()?;

    productivity_profile(&user.0, Utc::now(), &db_connection).map(Json)
}

#[get("/productivity/insights")]
pub fn get_insights(
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ProductivityInsights>> {
    let db_connection = db_connection.lock()?;

    productivity_insights(&user.0, Utc::now(), &db_connection).map(Json)
}
