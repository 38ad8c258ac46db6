use chrono::{DateTime, Utc};
use sqlx::{Row, sqlite::SqliteRow};
use webcron_models::core::{LogEntry, LogStatus, NotifyPolicy, TaskConfig, User};

pub fn row_to_task_config(row: &SqliteRow) -> TaskConfig {
    let prev_time = row
        .get::<Option<i64>, _>("prev_time")
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

    TaskConfig {
        id: row.get::<i64, _>("id"),
        task_name: row.get::<String, _>("task_name"),
        command: row.get::<String, _>("command"),
        timeout: row.get::<i64, _>("timeout"),
        concurrent: row.get::<bool, _>("concurrent"),
        notify: NotifyPolicy::from_code(row.get::<i64, _>("notify")),
        notify_email: row.get::<String, _>("notify_email"),
        user_id: row.get::<i64, _>("user_id"),
        execute_times: row.get::<i64, _>("execute_times"),
        prev_time,
        enabled: row.get::<bool, _>("enabled"),
    }
}

pub fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get::<i64, _>("id"),
        username: row.get::<String, _>("username"),
        email: row.get::<String, _>("email"),
    }
}

pub fn row_to_log_entry(row: &SqliteRow) -> LogEntry {
    LogEntry {
        id: row.get::<Option<i64>, _>("id"),
        task_id: row.get::<i64, _>("task_id"),
        output: row.get::<String, _>("output"),
        error: row.get::<String, _>("error"),
        status: LogStatus::from_code(row.get::<i64, _>("status")),
        process_time_ms: row.get::<i64, _>("process_time"),
        created_at: DateTime::<Utc>::from_timestamp(row.get::<i64, _>("create_time"), 0)
            .unwrap_or_default(),
    }
}
