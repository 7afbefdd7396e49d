use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, State};

use std::collections::BTreeMap;

use crate::activity::data::ActivityType;
use crate::activity::helpers::record_activity;
use crate::config::CompanionConfig;
use crate::data::DBConnection;
use crate::goals::data::GoalID;
use crate::goals::helpers::get_goal_from_db;
use crate::internal_error::InternalResult;
use crate::reminders::generator::completion_celebration;
use crate::reminders::helpers::add_reminder_to_db;
use crate::user::CurrentUser;

use super::data::*;
use super::helpers::{
    apply_task_update, create_custom_task, delete_task as delete_task_from_db,
    generate_tasks_for_goal, get_task_from_db, get_tasks_for_goal, reorder_tasks,
};
use super::locks::{task_views, DependencyGraph};

#[post("/goals/<goal_id>/tasks/generate")]
pub fn generate_goal_tasks(
    goal_id: GoalID,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<(Status, Json<GenerateTasksResponse>)> {
    let mut db_connection = db_connection.lock()?;

    let goal = get_goal_from_db(goal_id, &user.0, &db_connection)?;
    let (topic, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut db_connection)?;
    let tasks = task_views(tasks);

    Ok((
        Status::Created,
        Json(GenerateTasksResponse {
            goal_id,
            goal_title: goal.title,
            topic: topic.as_str().to_string(),
            total_tasks: tasks.len(),
            tasks,
        }),
    ))
}

#[get("/goals/<goal_id>/tasks?<locked>")]
pub fn get_goal_tasks(
    goal_id: GoalID,
    locked: Option<bool>,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<GoalTasksResponse>> {
    let db_connection = db_connection.lock()?;

    let goal = get_goal_from_db(goal_id, &user.0, &db_connection)?;
    let tasks: Vec<TaskView> = task_views(get_tasks_for_goal(goal.id, &db_connection)?)
        .into_iter()
        .filter(|view| locked.map_or(true, |locked| view.is_locked == locked))
        .collect();

    let mut tasks_by_week: BTreeMap<i64, Vec<TaskView>> = BTreeMap::new();
    for view in &tasks {
        tasks_by_week
            .entry(view.task.week_number)
            .or_default()
            .push(view.clone());
    }

    Ok(Json(GoalTasksResponse {
        goal_id,
        total_tasks: tasks.len(),
        tasks,
        tasks_by_week,
    }))
}

#[post("/goals/<goal_id>/tasks", format = "json", data = "<create_task_request>")]
pub fn create_task(
    goal_id: GoalID,
    create_task_request: Json<CreateTaskRequest>,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<(Status, Json<TaskView>)> {
    let now = Utc::now();
    let mut db_connection = db_connection.lock()?;

    let goal = get_goal_from_db(goal_id, &user.0, &db_connection)?;
    let task = create_custom_task(&goal, &create_task_request, now, &mut db_connection)?;
    record_activity(&db_connection, &user.0, ActivityType::TaskCreated, "task", task.id, now)?;

    let graph = DependencyGraph::build(&get_tasks_for_goal(goal.id, &db_connection)?);

    Ok((Status::Created, Json(graph.view(task))))
}

#[post("/goals/<goal_id>/tasks/reorder", format = "json", data = "<reorder_request>")]
pub fn reorder_goal_tasks(
    goal_id: GoalID,
    reorder_request: Json<TaskBulkReorder>,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReorderTasksResponse>> {
    let mut db_connection = db_connection.lock()?;

    let goal = get_goal_from_db(goal_id, &user.0, &db_connection)?;
    let updated_count = reorder_tasks(&goal, &reorder_request, Utc::now(), &mut db_connection)?;

    Ok(Json(ReorderTasksResponse {
        message: String::from("Tasks reordered successfully"),
        goal_id,
        updated_count,
        tasks: task_views(get_tasks_for_goal(goal.id, &db_connection)?),
    }))
}

#[get("/tasks/<task_id>")]
pub fn get_task(
    task_id: TaskID,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<TaskView>> {
    let db_connection = db_connection.lock()?;

    let task = get_task_from_db(task_id, &user.0, &db_connection)?;
    let graph = DependencyGraph::build(&get_tasks_for_goal(task.goal_id, &db_connection)?);

    Ok(Json(graph.view(task)))
}

#[put("/tasks/<task_id>", format = "json", data = "<update_task_request>")]
pub fn update_task(
    task_id: TaskID,
    update_task_request: Json<UpdateTaskRequest>,
    user: CurrentUser,
    config: &State<CompanionConfig>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<TaskView>> {
    let now = Utc::now();
    let mut db_connection = db_connection.lock()?;

    let task = get_task_from_db(task_id, &user.0, &db_connection)?;
    let goal = get_goal_from_db(task.goal_id, &user.0, &db_connection)?;
    let outcome = apply_task_update(
        &goal,
        task,
        &update_task_request,
        config.enforce_task_locks,
        now,
        &mut db_connection,
    )?;

    if outcome.became_completed() {
        record_activity(&db_connection, &user.0, ActivityType::TaskCompleted, "task", task_id, now)?;

        if config.celebrate_completions {
            add_reminder_to_db(&completion_celebration(&user.0, &outcome.task, now), now, &db_connection)?;
        }
    } else {
        record_activity(&db_connection, &user.0, ActivityType::TaskUpdated, "task", task_id, now)?;
    }

    let graph = DependencyGraph::build(&get_tasks_for_goal(goal.id, &db_connection)?);

    Ok(Json(graph.view(outcome.task)))
}

#[delete("/tasks/<task_id>")]
pub fn delete_task(
    task_id: TaskID,
    user: CurrentUser,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<DeleteTaskResult>> {
    let mut db_connection = db_connection.lock()?;

    let task = get_task_from_db(task_id, &user.0, &db_connection)?;

    delete_task_from_db(&task, &mut db_connection).map(Json)
}
