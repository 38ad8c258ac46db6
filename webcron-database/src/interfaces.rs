use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use webcron_models::core::{LogEntry, TaskConfig, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Read and bookkeeping access to task definitions.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn fetch_task(&self, task_id: i64) -> Result<TaskConfig, StoreError>;

    /// Count one finished run: increments the execution count and moves the
    /// last-run time forward to `ran_at`. No other column is touched.
    ///
    /// Applied atomically by the store, so overlapping runs of the same task
    /// each add exactly one and never move the last-run time backwards.
    async fn update_run_stats(
        &self,
        task_id: i64,
        ran_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn fetch_user(&self, user_id: i64) -> Result<User, StoreError>;
}

/// Append-only execution log.
#[async_trait]
pub trait LogStore: Send + Sync + 'static {
    /// Insert the entry and return the identifier assigned to it.
    async fn insert_log(&self, entry: &LogEntry) -> Result<i64, StoreError>;
}
