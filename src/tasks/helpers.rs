use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use std::collections::HashSet;

use crate::data::{parse_column, parse_timestamp, timestamp};
use crate::goals::data::{Goal, GoalID};
use crate::internal_error::{InternalError, InternalResult};

use super::data::*;
use super::generator::{generate_tasks, Topic};
use super::locks::{ensure_acyclic, normalize_dependencies, DependencyGraph, UNSAVED_TASK_ID};

const TASK_COLUMNS: &str = "id, goal_id, week_number, title, description, status, position, dependencies, created_at, updated_at";

pub fn get_task_from_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get(5)?;
    let dependencies: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    let dependencies = dependencies
        .map(|text| serde_json::from_str::<Vec<TaskID>>(&text))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Task {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        week_number: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: parse_column(5, &status)?,
        order: row.get(6)?,
        dependencies,
        created_at: parse_timestamp(8, &created_at)?,
        updated_at: parse_timestamp(9, &updated_at)?,
    })
}

fn dependencies_to_sql(dependencies: &Option<Vec<TaskID>>) -> InternalResult<Option<String>> {
    Ok(dependencies
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?)
}

pub fn get_tasks_for_goal(goal_id: GoalID, db_connection: &Connection) -> InternalResult<Vec<Task>> {
    let mut tasks_statement = db_connection.prepare(&format!(
        "SELECT {} FROM tasks WHERE goal_id = (?1) ORDER BY position, week_number, id",
        TASK_COLUMNS
    ))?;

    let tasks = tasks_statement
        .query_map(params![goal_id], get_task_from_row)?
        .collect::<rusqlite::Result<Vec<Task>>>()?;

    Ok(tasks)
}

/// Tasks are reached through their goal, so a task under somebody else's
/// goal is reported as missing.
pub fn get_task_from_db(task_id: TaskID, owner: &str, db_connection: &Connection) -> InternalResult<Task> {
    let task = db_connection
        .query_row(
            &format!(
                "SELECT {} FROM tasks WHERE id = (?1)
                 AND goal_id IN (SELECT id FROM goals WHERE owner = (?2))",
                TASK_COLUMNS
            ),
            params![task_id, owner],
            get_task_from_row,
        )
        .optional()?;

    task.ok_or_else(|| InternalError::not_found("Task", task_id))
}

pub fn add_task_to_db(
    goal_id: GoalID,
    task: &NewTask,
    now: DateTime<Utc>,
    db_connection: &Connection,
) -> InternalResult<TaskID> {
    db_connection.execute(
        "INSERT INTO tasks (goal_id, week_number, title, description, status, position, dependencies, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            goal_id,
            task.week_number,
            task.title,
            task.description,
            TaskStatus::NotStarted.as_str(),
            task.order,
            dependencies_to_sql(&task.dependencies)?,
            timestamp(&now),
        ],
    )?;

    Ok(db_connection.last_insert_rowid())
}

pub fn update_task_in_db(task: &Task, db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE tasks SET week_number = (?1), title = (?2), description = (?3), status = (?4),
         position = (?5), dependencies = (?6), updated_at = (?7) WHERE id = (?8)",
        params![
            task.week_number,
            task.title,
            task.description,
            task.status.as_str(),
            task.order,
            dependencies_to_sql(&task.dependencies)?,
            timestamp(&task.updated_at),
            task.id,
        ],
    )?;

    Ok(())
}

pub fn next_order_for_goal(goal_id: GoalID, db_connection: &Connection) -> InternalResult<i64> {
    let next = db_connection.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM tasks WHERE goal_id = (?1)",
        params![goal_id],
        |row| row.get(0),
    )?;

    Ok(next)
}

fn assign_positions(tasks: &mut [Task]) {
    for (position, task) in tasks.iter_mut().enumerate() {
        task.order = position as i64;
    }
}

/// Renumbers tasks to 0..n keeping their relative order.
pub fn renumber(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (task.order, task.id));
    assign_positions(tasks);
}

/// Takes a task out of the layout and puts it back so that it ends up at
/// `index`, clamped to the end. Everything is renumbered to 0..n.
pub fn place_task(tasks: &mut Vec<Task>, task_id: TaskID, index: i64) {
    renumber(tasks);

    if let Some(from) = tasks.iter().position(|task| task.id == task_id) {
        let task = tasks.remove(from);
        let index = usize::try_from(index).unwrap_or(0).min(tasks.len());
        tasks.insert(index, task);
    }

    assign_positions(tasks);
}

/// Writes every task of `layout` that differs from its stored row.
fn persist_layout(original: &[Task], layout: &[Task], db_connection: &Connection) -> InternalResult<()> {
    for task in layout {
        match original.iter().find(|stored| stored.id == task.id) {
            Some(stored) if stored == task => {}
            _ => update_task_in_db(task, db_connection)?,
        }
    }

    Ok(())
}

pub fn compact_task_order(goal_id: GoalID, db_connection: &Connection) -> InternalResult<()> {
    let original = get_tasks_for_goal(goal_id, db_connection)?;
    let mut layout = original.clone();
    renumber(&mut layout);

    persist_layout(&original, &layout, db_connection)
}

fn validate_week(goal: &Goal, week_number: i64) -> InternalResult<()> {
    if week_number < 1 || week_number > goal.duration_weeks {
        return Err(InternalError::validation(format!(
            "Invalid week_number {}: goal {} runs for weeks 1 to {}",
            week_number, goal.id, goal.duration_weeks
        )));
    }

    Ok(())
}

/// Stores the generated breakdown of a goal in one transaction. A goal is
/// broken down once; asking again is a conflict.
pub fn generate_tasks_for_goal(
    goal: &Goal,
    now: DateTime<Utc>,
    db_connection: &mut Connection,
) -> InternalResult<(Topic, Vec<Task>)> {
    if next_order_for_goal(goal.id, db_connection)? > 0 {
        return Err(InternalError::conflict(format!(
            "Tasks have already been generated for goal {}",
            goal.id
        )));
    }

    let plan = generate_tasks(goal)?;

    let transaction = db_connection.transaction()?;
    for task in &plan.tasks {
        add_task_to_db(goal.id, task, now, &transaction)?;
    }
    transaction.commit()?;

    tracing::info!(
        goal_id = goal.id,
        topic = plan.topic.as_str(),
        count = plan.tasks.len(),
        "tasks generated"
    );

    Ok((plan.topic, get_tasks_for_goal(goal.id, db_connection)?))
}

pub fn create_custom_task(
    goal: &Goal,
    request: &CreateTaskRequest,
    now: DateTime<Utc>,
    db_connection: &mut Connection,
) -> InternalResult<Task> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(InternalError::validation("Task title must not be empty"));
    }
    validate_week(goal, request.week_number)?;

    let original = get_tasks_for_goal(goal.id, db_connection)?;
    let order = match request.order {
        Some(order) if order < 0 => {
            return Err(InternalError::validation("Task order must not be negative"))
        }
        Some(order) => order,
        None => next_order_for_goal(goal.id, db_connection)?,
    };
    let dependencies = request
        .dependencies
        .as_ref()
        .map(|dependencies| normalize_dependencies(UNSAVED_TASK_ID, dependencies, &original))
        .transpose()?;

    // The new task joins the implicit chain at its position, so the whole
    // resulting layout is checked.
    let mut layout = original.clone();
    layout.push(Task {
        id: UNSAVED_TASK_ID,
        goal_id: goal.id,
        week_number: request.week_number,
        title: title.to_string(),
        description: request.description.clone(),
        status: TaskStatus::NotStarted,
        order,
        dependencies,
        created_at: now,
        updated_at: now,
    });
    place_task(&mut layout, UNSAVED_TASK_ID, order);
    ensure_acyclic(&layout)?;

    let (new_tasks, existing): (Vec<Task>, Vec<Task>) =
        layout.into_iter().partition(|task| task.id == UNSAVED_TASK_ID);
    let new_task = new_tasks
        .into_iter()
        .next()
        .map(|task| NewTask {
            week_number: task.week_number,
            title: task.title,
            description: task.description,
            order: task.order,
            dependencies: task.dependencies,
        })
        .ok_or_else(|| InternalError::validation("Task could not be placed"))?;

    let transaction = db_connection.transaction()?;
    persist_layout(&original, &existing, &transaction)?;
    let task_id = add_task_to_db(goal.id, &new_task, now, &transaction)?;
    transaction.commit()?;

    tracing::info!(goal_id = goal.id, task_id, order = new_task.order, "custom task created");

    get_task_from_goal(goal.id, task_id, db_connection)
}

fn get_task_from_goal(goal_id: GoalID, task_id: TaskID, db_connection: &Connection) -> InternalResult<Task> {
    get_tasks_for_goal(goal_id, db_connection)?
        .into_iter()
        .find(|task| task.id == task_id)
        .ok_or_else(|| InternalError::not_found("Task", task_id))
}

/// Applies a partial update. Dependency and order edits are checked for
/// cycles, and with `enforce_locks` a locked task cannot be started or
/// completed.
pub fn apply_task_update(
    goal: &Goal,
    task: Task,
    request: &UpdateTaskRequest,
    enforce_locks: bool,
    now: DateTime<Utc>,
    db_connection: &mut Connection,
) -> InternalResult<TaskUpdateOutcome> {
    let previous_status = task.status;
    let goal_tasks = get_tasks_for_goal(goal.id, db_connection)?;
    let mut updated = task;

    if let Some(title) = &request.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(InternalError::validation("Task title must not be empty"));
        }
        updated.title = title.to_string();
    }
    if let Some(description) = &request.description {
        updated.description = description.clone();
    }
    if let Some(week_number) = request.week_number {
        validate_week(goal, week_number)?;
        updated.week_number = week_number;
    }
    if let Some(order) = request.order {
        if order < 0 {
            return Err(InternalError::validation("Task order must not be negative"));
        }
    }
    if request.use_implicit_dependencies {
        updated.dependencies = None;
    } else if let Some(dependencies) = &request.dependencies {
        updated.dependencies = Some(normalize_dependencies(updated.id, dependencies, &goal_tasks)?);
    }
    if let Some(status) = &request.status {
        updated.status = status.parse()?;
    }
    updated.updated_at = now;

    let mut layout = goal_tasks.clone();
    if let Some(slot) = layout.iter_mut().find(|t| t.id == updated.id) {
        *slot = updated.clone();
    }
    if let Some(order) = request.order {
        place_task(&mut layout, updated.id, order);
    }
    ensure_acyclic(&layout)?;

    if enforce_locks && updated.status != previous_status && updated.status.requires_unlocked() {
        // Judge the lock against the layout as it will be stored, with the
        // task itself still in its old status.
        let mut judged = layout.clone();
        if let Some(slot) = judged.iter_mut().find(|t| t.id == updated.id) {
            slot.status = previous_status;
        }
        let blockers = DependencyGraph::build(&judged).blockers(updated.id);
        if !blockers.is_empty() {
            return Err(InternalError::Locked(format!(
                "Task {} is locked until tasks {:?} are completed",
                updated.id, blockers
            )));
        }
    }

    let transaction = db_connection.transaction()?;
    persist_layout(&goal_tasks, &layout, &transaction)?;
    transaction.commit()?;

    tracing::info!(task_id = updated.id, status = %updated.status, "task updated");

    Ok(TaskUpdateOutcome {
        task: get_task_from_goal(goal.id, updated.id, db_connection)?,
        previous_status,
    })
}

/// Moves several tasks, one after another, so each lands at its requested
/// index. The whole batch is rejected if any task is foreign or the result
/// has a cycle. Returns how many distinct tasks were moved.
pub fn reorder_tasks(
    goal: &Goal,
    request: &TaskBulkReorder,
    now: DateTime<Utc>,
    db_connection: &mut Connection,
) -> InternalResult<usize> {
    let original = get_tasks_for_goal(goal.id, db_connection)?;
    let mut layout = original.clone();
    let mut moved = HashSet::new();

    for reorder in &request.tasks {
        if reorder.new_order < 0 {
            return Err(InternalError::validation("Task order must not be negative"));
        }
        if let Some(week_number) = reorder.new_week_number {
            validate_week(goal, week_number)?;
        }

        let task = layout
            .iter_mut()
            .find(|task| task.id == reorder.task_id)
            .ok_or_else(|| {
                InternalError::validation(format!(
                    "Task {} does not belong to goal {}",
                    reorder.task_id, goal.id
                ))
            })?;

        if let Some(week_number) = reorder.new_week_number {
            task.week_number = week_number;
        }
        task.updated_at = now;
        moved.insert(task.id);

        place_task(&mut layout, reorder.task_id, reorder.new_order);
    }

    ensure_acyclic(&layout)?;

    let transaction = db_connection.transaction()?;
    persist_layout(&original, &layout, &transaction)?;
    transaction.commit()?;

    tracing::info!(goal_id = goal.id, moved = moved.len(), "tasks reordered");

    Ok(moved.len())
}

/// Deletes a task unless another task names it as an explicit dependency.
/// Tasks that followed it on the implicit chain now follow its predecessor.
pub fn delete_task(task: &Task, db_connection: &mut Connection) -> InternalResult<DeleteTaskResult> {
    let dependents = get_tasks_for_goal(task.goal_id, db_connection)?
        .iter()
        .filter(|other| {
            other
                .dependencies
                .as_ref()
                .map_or(false, |dependencies| dependencies.contains(&task.id))
        })
        .count();

    if dependents > 0 {
        return Err(InternalError::conflict(format!(
            "Cannot delete task. {} task(s) depend on it.",
            dependents
        )));
    }

    let transaction = db_connection.transaction()?;
    transaction.execute("DELETE FROM tasks WHERE id = (?1)", params![task.id])?;
    compact_task_order(task.goal_id, &transaction)?;
    transaction.commit()?;

    tracing::info!(task_id = task.id, goal_id = task.goal_id, "task deleted");

    Ok(DeleteTaskResult {
        message: String::from("Task deleted successfully"),
        deleted_task_title: task.title.clone(),
        deleted_task_id: task.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::open_in_memory_database;
    use crate::goals::data::{GoalRequest, Intensity};
    use crate::goals::helpers::{add_goal_to_db, validate_goal_request};
    use crate::tasks::locks::task_views;

    fn setup(weeks: i64, intensity: &str) -> (Connection, Goal) {
        let connection = open_in_memory_database().unwrap();
        let request = GoalRequest {
            title: String::from("Learn Rust"),
            duration_weeks: weeks,
            priority: String::from("Medium"),
            intensity: intensity.to_string(),
            start_date: None,
        };
        let goal = validate_goal_request(&request, 52).unwrap();
        let goal = add_goal_to_db("ana", goal, Utc::now(), &connection).unwrap();

        (connection, goal)
    }

    fn status_update(status: &str) -> UpdateTaskRequest {
        UpdateTaskRequest {
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn orders(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.order).collect()
    }

    #[test]
    fn generates_and_stores_a_light_plan() {
        let (mut connection, goal) = setup(2, "Light");
        assert_eq!(goal.intensity, Intensity::Light);

        let (topic, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        assert_eq!(topic, Topic::Programming);
        assert_eq!(tasks.len(), 4);
        assert_eq!(orders(&tasks), vec![0, 1, 2, 3]);
        assert_eq!(tasks.iter().filter(|t| t.week_number == 1).count(), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::NotStarted));
    }

    #[test]
    fn second_generation_is_a_conflict() {
        let (mut connection, goal) = setup(1, "Normal");
        generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let err = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap_err();

        assert!(matches!(err, InternalError::Conflict(_)));
        assert_eq!(get_tasks_for_goal(goal.id, &connection).unwrap().len(), 3);
    }

    #[test]
    fn locked_task_cannot_be_completed() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let err = apply_task_update(
            &goal,
            tasks[1].clone(),
            &status_update("Completed"),
            true,
            Utc::now(),
            &mut connection,
        )
        .unwrap_err();
        assert!(matches!(err, InternalError::Locked(_)));

        apply_task_update(&goal, tasks[0].clone(), &status_update("Completed"), true, Utc::now(), &mut connection)
            .unwrap();
        let outcome = apply_task_update(
            &goal,
            tasks[1].clone(),
            &status_update("Completed"),
            true,
            Utc::now(),
            &mut connection,
        )
        .unwrap();
        assert!(outcome.became_completed());
    }

    #[test]
    fn lock_enforcement_can_be_switched_off() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let outcome = apply_task_update(
            &goal,
            tasks[2].clone(),
            &status_update("In Progress"),
            false,
            Utc::now(),
            &mut connection,
        )
        .unwrap();

        assert_eq!(outcome.task.status, TaskStatus::InProgress);
    }

    #[test]
    fn explicit_dependencies_can_be_reset_to_the_chain() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let unlock = UpdateTaskRequest {
            dependencies: Some(vec![]),
            ..Default::default()
        };
        let outcome =
            apply_task_update(&goal, tasks[2].clone(), &unlock, true, Utc::now(), &mut connection).unwrap();
        assert_eq!(outcome.task.dependencies, Some(vec![]));
        assert!(!task_views(get_tasks_for_goal(goal.id, &connection).unwrap())[2].is_locked);

        let reset = UpdateTaskRequest {
            use_implicit_dependencies: true,
            ..Default::default()
        };
        let outcome =
            apply_task_update(&goal, outcome.task, &reset, true, Utc::now(), &mut connection).unwrap();
        assert_eq!(outcome.task.dependencies, None);
        assert!(task_views(get_tasks_for_goal(goal.id, &connection).unwrap())[2].is_locked);
    }

    #[test]
    fn rejects_cyclic_dependencies() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let cyclic = UpdateTaskRequest {
            dependencies: Some(vec![tasks[2].id]),
            ..Default::default()
        };
        let err =
            apply_task_update(&goal, tasks[0].clone(), &cyclic, true, Utc::now(), &mut connection).unwrap_err();

        assert!(matches!(err, InternalError::Validation(_)));
    }

    #[test]
    fn week_must_fit_the_goal() {
        let (mut connection, goal) = setup(2, "Light");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let request = UpdateTaskRequest {
            week_number: Some(3),
            ..Default::default()
        };
        assert!(apply_task_update(&goal, tasks[0].clone(), &request, true, Utc::now(), &mut connection).is_err());
    }

    fn move_to(task_id: TaskID, new_order: i64) -> TaskReorder {
        TaskReorder {
            task_id,
            new_order,
            new_week_number: None,
        }
    }

    #[test]
    fn moving_down_lands_on_the_requested_index() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let request = TaskBulkReorder {
            tasks: vec![move_to(tasks[0].id, 2)],
        };
        reorder_tasks(&goal, &request, Utc::now(), &mut connection).unwrap();

        let reordered = get_tasks_for_goal(goal.id, &connection).unwrap();
        let ids: Vec<TaskID> = reordered.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![tasks[1].id, tasks[2].id, tasks[0].id]);
        assert_eq!(orders(&reordered), vec![0, 1, 2]);
    }

    #[test]
    fn repeated_entries_count_once() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let request = TaskBulkReorder {
            tasks: vec![move_to(tasks[2].id, 1), move_to(tasks[2].id, 0)],
        };

        assert_eq!(reorder_tasks(&goal, &request, Utc::now(), &mut connection).unwrap(), 1);
        assert_eq!(get_tasks_for_goal(goal.id, &connection).unwrap()[0].id, tasks[2].id);
    }

    #[test]
    fn placement_clamps_past_the_end() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let mut layout = tasks.clone();
        place_task(&mut layout, tasks[0].id, 99);

        let ids: Vec<TaskID> = layout.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![tasks[1].id, tasks[2].id, tasks[0].id]);
        assert_eq!(orders(&layout), vec![0, 1, 2]);
    }

    #[test]
    fn reorder_moves_a_task_to_the_front() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let request = TaskBulkReorder {
            tasks: vec![TaskReorder {
                task_id: tasks[2].id,
                new_order: 0,
                new_week_number: None,
            }],
        };
        assert_eq!(reorder_tasks(&goal, &request, Utc::now(), &mut connection).unwrap(), 1);

        let reordered = get_tasks_for_goal(goal.id, &connection).unwrap();
        let ids: Vec<TaskID> = reordered.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![tasks[2].id, tasks[0].id, tasks[1].id]);
        assert_eq!(orders(&reordered), vec![0, 1, 2]);
    }

    #[test]
    fn reorder_rejects_foreign_tasks() {
        let (mut connection, goal) = setup(1, "Normal");
        generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let request = TaskBulkReorder {
            tasks: vec![TaskReorder {
                task_id: 999,
                new_order: 0,
                new_week_number: None,
            }],
        };

        assert!(reorder_tasks(&goal, &request, Utc::now(), &mut connection).is_err());
    }

    #[test]
    fn custom_task_is_inserted_at_its_position() {
        let (mut connection, goal) = setup(1, "Light");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let request = CreateTaskRequest {
            title: String::from("Read the book"),
            description: String::new(),
            week_number: 1,
            order: Some(1),
            dependencies: None,
        };
        let task = create_custom_task(&goal, &request, Utc::now(), &mut connection).unwrap();

        let all = get_tasks_for_goal(goal.id, &connection).unwrap();
        let ids: Vec<TaskID> = all.iter().map(|t| t.id).collect();
        assert_eq!(task.order, 1);
        assert_eq!(ids, vec![tasks[0].id, task.id, tasks[1].id]);
        assert_eq!(orders(&all), vec![0, 1, 2]);
    }

    #[test]
    fn custom_task_appends_by_default() {
        let (mut connection, goal) = setup(1, "Light");
        generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        let request = CreateTaskRequest {
            title: String::from("Extra practice"),
            description: String::new(),
            week_number: 1,
            order: None,
            dependencies: None,
        };

        assert_eq!(create_custom_task(&goal, &request, Utc::now(), &mut connection).unwrap().order, 2);
    }

    #[test]
    fn delete_is_blocked_by_explicit_dependents() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();
        let depend = UpdateTaskRequest {
            dependencies: Some(vec![tasks[0].id]),
            ..Default::default()
        };
        apply_task_update(&goal, tasks[2].clone(), &depend, true, Utc::now(), &mut connection).unwrap();

        let err = delete_task(&tasks[0], &mut connection).unwrap_err();
        assert!(matches!(err, InternalError::Conflict(_)));

        delete_task(&tasks[1], &mut connection).unwrap();
        let remaining = get_tasks_for_goal(goal.id, &connection).unwrap();
        assert_eq!(orders(&remaining), vec![0, 1]);
    }

    #[test]
    fn tasks_are_scoped_through_their_goal() {
        let (mut connection, goal) = setup(1, "Normal");
        let (_, tasks) = generate_tasks_for_goal(&goal, Utc::now(), &mut connection).unwrap();

        assert!(get_task_from_db(tasks[0].id, "ana", &connection).is_ok());
        assert!(matches!(
            get_task_from_db(tasks[0].id, "ben", &connection),
            Err(InternalError::NotFound(_))
        ));
    }
}
