use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::internal_error::InternalResult;

pub type DBConnection = Arc<Mutex<Connection>>;
pub type UserID = String;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS goals (
        id INTEGER PRIMARY KEY,
        owner TEXT NOT NULL,
        title TEXT NOT NULL,
        duration_weeks INTEGER NOT NULL,
        priority TEXT NOT NULL,
        intensity TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY,
        goal_id INTEGER NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
        week_number INTEGER NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        status TEXT NOT NULL,
        position INTEGER NOT NULL,
        dependencies TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS tasks_by_goal ON tasks (goal_id, position)",
    "CREATE TABLE IF NOT EXISTS reminders (
        id INTEGER PRIMARY KEY,
        user_id TEXT NOT NULL,
        reminder_type TEXT NOT NULL,
        goal_id INTEGER,
        task_id INTEGER,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        motivation_level TEXT NOT NULL,
        scheduled_time TEXT NOT NULL,
        status TEXT NOT NULL,
        delivered_at TEXT,
        seen_at TEXT,
        dismissed_at TEXT,
        action_taken INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS reminders_by_user ON reminders (user_id, status, scheduled_time)",
    "CREATE TABLE IF NOT EXISTS activity_logs (
        id INTEGER PRIMARY KEY,
        user_id TEXT NOT NULL,
        activity_type TEXT NOT NULL,
        related_entity_type TEXT,
        related_entity_id INTEGER,
        activity_data TEXT,
        timestamp TEXT NOT NULL
    )",
];

pub fn init_schema(db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute_batch("PRAGMA foreign_keys = ON")?;

    for statement in SCHEMA {
        db_connection.execute(statement, params![])?;
    }

    Ok(())
}

pub fn open_database(path: impl AsRef<Path>) -> InternalResult<Connection> {
    let connection = Connection::open(path)?;
    init_schema(&connection)?;

    Ok(connection)
}

pub fn open_in_memory_database() -> InternalResult<Connection> {
    let connection = Connection::open_in_memory()?;
    init_schema(&connection)?;

    Ok(connection)
}

/// Fixed-width UTC text, so timestamps compare correctly as strings in SQL.
pub fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(index: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

pub fn parse_optional_timestamp(
    index: usize,
    text: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    text.map(|text| parse_timestamp(index, &text)).transpose()
}

/// Maps a stored enum label back into its Rust variant while reading a row.
pub fn parse_column<T>(index: usize, text: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexicographically() {
        let early = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let late = early + chrono::Duration::milliseconds(1500);

        assert!(timestamp(&early) < timestamp(&late));
        assert_eq!(timestamp(&early), "2026-03-01T09:00:00.000Z");
        assert_eq!(parse_timestamp(0, &timestamp(&late)).unwrap(), late);
    }

    #[test]
    fn schema_is_idempotent() {
        let connection = open_in_memory_database().unwrap();
        init_schema(&connection).unwrap();

        let tables: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                params![],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }
}
