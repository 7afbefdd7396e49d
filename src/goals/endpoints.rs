use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, State};

use crate::activity::data::ActivityType;
use crate::activity::helpers::record_activity;
use crate::config::CompanionConfig;
use crate::data::DBConnection;
use crate::internal_error::InternalResult;
use crate::user::CurrentUser;

use super::data::*;
use super::helpers::*;

#[post("/goals", format = "json", data = "<goal_request>")]
pub fn create_goal(
    goal_request: Json<GoalRequest>,
    user: CurrentUser,
    config: &State<CompanionConfig>,
    db_connection: &State<DBConnection>,
) -> InternalResult<(Status, Json<Goal>)> {
    let new_goal = validate_goal_request(&goal_request, config.max_duration_weeks)?;
    let now = Utc::now();

    let db_connection = db_connection.lock()?;
    let goal = add_goal_to_db(&user.0, new_goal, now, &db_connection)?;
    record_activity(&db_connection, &user.0, ActivityType::GoalCreated, "goal", goal.id, now)?;

    Ok((Status::Created, Json(goal)))
}

#[get("/goals")]
pub fn get_goals(
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<GoalListResponse>> {
    let db_connection = db_connection.lock()?;
    let goals = get_goals_for_owner(&user.0, &db_connection)?;

    Ok(Json(GoalListResponse {
        count: goals.len(),
        goals,
    }))
}

#[get("/goals/<goal_id>")]
pub fn get_goal(
    goal_id: GoalID,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Goal>> {
    let db_connection = db_connection.lock()?;

    get_goal_from_db(goal_id, &user.0, &db_connection).map(Json)
}

#[put("/goals/<goal_id>", format = "json", data = "<goal_request>")]
pub fn update_goal(
    goal_id: GoalID,
    goal_request: Json<GoalRequest>,
    user: CurrentUser,
    config: &State<CompanionConfig>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Goal>> {
    let update = validate_goal_request(&goal_request, config.max_duration_weeks)?;

    let db_connection = db_connection.lock()?;
    let goal = update_goal_in_db(goal_id, &user.0, update, &db_connection)?;
    record_activity(
        &db_connection,
        &user.0,
        ActivityType::GoalUpdated,
        "goal",
        goal.id,
        Utc::now(),
    )?;

    Ok(Json(goal))
}

#[delete("/goals/<goal_id>")]
pub fn delete_goal(
    goal_id: GoalID,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<DeleteGoalResult>> {
    let db_connection = db_connection.lock()?;

    delete_goal_from_db(goal_id, &user.0, &db_connection).map(Json)
}
