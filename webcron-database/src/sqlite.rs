use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{ConnectOptions, Executor, SqlitePool, sqlite::SqliteConnectOptions};
use webcron_models::core::{LogEntry, TaskConfig, User};

use crate::{
    interfaces::{LogStore, StoreError, TaskStore, UserStore},
    mappers::{row_to_log_entry, row_to_task_config, row_to_user},
};

const TASK_COLUMNS: &str = "id, task_name, command, timeout, concurrent, notify, notify_email, \
                            user_id, execute_times, prev_time, enabled";

pub struct SqliteDb {
    pub pool: SqlitePool,
}

impl SqliteDb {
    pub async fn new(filename: &str) -> Result<Self, StoreError> {
        let mut options = SqliteConnectOptions::new()
            .filename(filename)
            .create_if_missing(true);
        let options_with_logs = options
            .log_statements(log::LevelFilter::Debug)
            .log_slow_statements(log::LevelFilter::Warn, Duration::from_secs(1));
        let connection = SqlitePool::connect_with(options_with_logs.clone()).await?;
        Ok(SqliteDb { pool: connection })
    }

    pub async fn create_tasks_table(&self) -> Result<(), StoreError> {
        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY,
            task_name TEXT NOT NULL,
            command TEXT NOT NULL,
            timeout INTEGER NOT NULL DEFAULT 0,
            concurrent INTEGER NOT NULL DEFAULT 0,
            notify INTEGER NOT NULL DEFAULT 0,
            notify_email TEXT NOT NULL DEFAULT '',
            user_id INTEGER NOT NULL,
            execute_times INTEGER NOT NULL DEFAULT 0,
            prev_time INTEGER,
            enabled INTEGER NOT NULL DEFAULT 1
        )",
            )
            .await?;
        Ok(())
    }

    pub async fn create_users_table(&self) -> Result<(), StoreError> {
        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL
        )",
            )
            .await?;
        Ok(())
    }

    pub async fn create_task_logs_table(&self) -> Result<(), StoreError> {
        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS task_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id INTEGER NOT NULL,
            output TEXT NOT NULL,
            error TEXT NOT NULL,
            status INTEGER NOT NULL,
            process_time INTEGER NOT NULL,
            create_time INTEGER NOT NULL
        )",
            )
            .await?;
        Ok(())
    }

    pub async fn upsert_task(&self, task: &TaskConfig) -> Result<(), StoreError> {
        self.pool.execute(sqlx::query(
            "INSERT INTO tasks (id, task_name, command, timeout, concurrent, notify, notify_email, user_id, execute_times, prev_time, enabled)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                task_name = excluded.task_name,
                command = excluded.command,
                timeout = excluded.timeout,
                concurrent = excluded.concurrent,
                notify = excluded.notify,
                notify_email = excluded.notify_email,
                user_id = excluded.user_id,
                execute_times = excluded.execute_times,
                prev_time = excluded.prev_time,
                enabled = excluded.enabled",
        )
        .bind(task.id)
        .bind(&task.task_name)
        .bind(&task.command)
        .bind(task.timeout)
        .bind(task.concurrent)
        .bind(task.notify.code())
        .bind(&task.notify_email)
        .bind(task.user_id)
        .bind(task.execute_times)
        .bind(task.prev_time.map(|dt| dt.timestamp()))
        .bind(task.enabled))
        .await?;
        Ok(())
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        self.pool
            .execute(
                sqlx::query(
                    "INSERT INTO users (id, username, email) VALUES (?, ?, ?)
                     ON CONFLICT(id) DO UPDATE SET
                        username = excluded.username,
                        email = excluded.email",
                )
                .bind(user.id)
                .bind(&user.username)
                .bind(&user.email),
            )
            .await?;
        Ok(())
    }

    pub async fn fetch_enabled_tasks(&self) -> Result<Vec<TaskConfig>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE enabled = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_task_config).collect())
    }

    pub async fn fetch_task_logs(&self, task_id: i64) -> Result<Vec<LogEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, task_id, output, error, status, process_time, create_time
             FROM task_logs WHERE task_id = ? ORDER BY id",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_log_entry).collect())
    }
}

#[async_trait]
impl TaskStore for SqliteDb {
    async fn fetch_task(&self, task_id: i64) -> Result<TaskConfig, StoreError> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(row_to_task_config)
            .ok_or(StoreError::NotFound { entity: "task", id: task_id })
    }

    async fn update_run_stats(
        &self,
        task_id: i64,
        ran_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = self
            .pool
            .execute(
                sqlx::query(
                    "UPDATE tasks SET
                        execute_times = execute_times + 1,
                        prev_time = MAX(COALESCE(prev_time, 0), ?)
                     WHERE id = ?",
                )
                .bind(ran_at.timestamp())
                .bind(task_id),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "task", id: task_id });
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for SqliteDb {
    async fn fetch_user(&self, user_id: i64) -> Result<User, StoreError> {
        let row = sqlx::query("SELECT id, username, email FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(row_to_user)
            .ok_or(StoreError::NotFound { entity: "user", id: user_id })
    }
}

#[async_trait]
impl LogStore for SqliteDb {
    async fn insert_log(&self, entry: &LogEntry) -> Result<i64, StoreError> {
        let result = self
            .pool
            .execute(
                sqlx::query(
                    "INSERT INTO task_logs (task_id, output, error, status, process_time, create_time)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(entry.task_id)
                .bind(&entry.output)
                .bind(&entry.error)
                .bind(entry.status.code())
                .bind(entry.process_time_ms)
                .bind(entry.created_at.timestamp()),
            )
            .await?;
        Ok(result.last_insert_rowid())
    }
}
