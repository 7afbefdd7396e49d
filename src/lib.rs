#[macro_use]
extern crate rocket;

use rocket::figment::Figment;
use rocket::{Build, Rocket};
use rusqlite::Connection;

use std::sync::{Arc, Mutex};

pub mod activity;
pub mod config;
pub mod data;
pub mod goals;
pub mod health;
pub mod internal_error;
pub mod reminders;
pub mod tasks;
pub mod user;

use config::CompanionConfig;
use data::DBConnection;

/// Assembles the service around an already opened database.
pub fn rocket_with(figment: Figment, config: CompanionConfig, connection: Connection) -> Rocket<Build> {
    let connection: DBConnection = Arc::new(Mutex::new(connection));

    rocket::custom(figment)
        .manage(config)
        .manage(connection)
        .mount(
            "/api",
            routes![
                goals::endpoints::create_goal,
                goals::endpoints::get_goals,
                goals::endpoints::get_goal,
                goals::endpoints::update_goal,
                goals::endpoints::delete_goal,
                tasks::endpoints::generate_goal_tasks,
                tasks::endpoints::get_goal_tasks,
                tasks::endpoints::create_task,
                tasks::endpoints::reorder_goal_tasks,
                tasks::endpoints::get_task,
                tasks::endpoints::update_task,
                tasks::endpoints::delete_task,
                reminders::endpoints::daily_checkin,
                reminders::endpoints::generate_reminders,
                reminders::endpoints::get_reminders,
                reminders::endpoints::get_pending_reminders,
                reminders::endpoints::update_status,
                reminders::endpoints::clear_all_reminders,
                reminders::endpoints::delete_reminder,
                activity::endpoints::log_user_activity,
                activity::endpoints::get_history,
                activity::endpoints::get_profile,
                activity::endpoints::get_insights,
            ],
        )
        .mount("/", routes![health::health])
        .register(
            "/",
            catchers![
                internal_error::not_found,
                internal_error::unprocessable,
                internal_error::fallback,
            ],
        )
}
