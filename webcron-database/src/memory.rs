use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use webcron_models::core::{LogEntry, TaskConfig, User};

use crate::interfaces::{LogStore, StoreError, TaskStore, UserStore};

#[derive(Default)]
struct StoreState {
    tasks: HashMap<i64, TaskConfig>,
    users: HashMap<i64, User>,
    logs: Vec<LogEntry>,
}

/// Task, user and log store kept entirely in process memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    fail_log_inserts: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_task(&self, task: TaskConfig) {
        self.state.lock().tasks.insert(task.id, task);
    }

    pub fn insert_user(&self, user: User) {
        self.state.lock().users.insert(user.id, user);
    }

    pub fn task(&self, task_id: i64) -> Option<TaskConfig> {
        self.state.lock().tasks.get(&task_id).cloned()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.state.lock().logs.clone()
    }

    pub fn logs_for(&self, task_id: i64) -> Vec<LogEntry> {
        self.state
            .lock()
            .logs
            .iter()
            .filter(|entry| entry.task_id == task_id)
            .cloned()
            .collect()
    }

    /// Make subsequent log inserts fail with [`StoreError::Unavailable`].
    pub fn set_fail_log_inserts(&self, fail: bool) {
        self.fail_log_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn fetch_task(&self, task_id: i64) -> Result<TaskConfig, StoreError> {
        self.task(task_id)
            .ok_or(StoreError::NotFound { entity: "task", id: task_id })
    }

    async fn update_run_stats(
        &self,
        task_id: i64,
        ran_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        let task = guard
            .tasks
            .get_mut(&task_id)
            .ok_or(StoreError::NotFound { entity: "task", id: task_id })?;
        task.execute_times += 1;
        task.prev_time = task.prev_time.max(Some(ran_at));
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn fetch_user(&self, user_id: i64) -> Result<User, StoreError> {
        self.state
            .lock()
            .users
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "user", id: user_id })
    }
}

#[async_trait]
impl LogStore for InMemoryStore {
    async fn insert_log(&self, entry: &LogEntry) -> Result<i64, StoreError> {
        if self.fail_log_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("log inserts disabled".into()));
        }
        let mut guard = self.state.lock();
        let id = guard.logs.len() as i64 + 1;
        let mut stored = entry.clone();
        stored.id = Some(id);
        guard.logs.push(stored);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcron_models::core::LogStatus;

    fn entry(task_id: i64) -> LogEntry {
        LogEntry {
            id: None,
            task_id,
            output: String::new(),
            error: String::new(),
            status: LogStatus::Success,
            process_time_ms: 5,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn log_ids_are_assigned_in_order() {
        let store = InMemoryStore::new();
        assert_eq!(store.insert_log(&entry(1)).await.unwrap(), 1);
        assert_eq!(store.insert_log(&entry(2)).await.unwrap(), 2);
        assert_eq!(store.logs_for(2).len(), 1);
        assert_eq!(store.logs()[0].id, Some(1));
    }

    #[tokio::test]
    async fn failing_inserts_leave_log_untouched() {
        let store = InMemoryStore::new();
        store.set_fail_log_inserts(true);
        assert!(matches!(
            store.insert_log(&entry(1)).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.logs().is_empty());
    }

    #[tokio::test]
    async fn run_stats_require_known_task() {
        let store = InMemoryStore::new();
        assert!(store.update_run_stats(1, Utc::now()).await.is_err());

        store.insert_task(TaskConfig::new(1, "t", "true"));
        store.update_run_stats(1, Utc::now()).await.unwrap();
        assert_eq!(store.task(1).unwrap().execute_times, 1);
        assert!(store.task(1).unwrap().prev_time.is_some());
    }

    #[tokio::test]
    async fn late_run_stats_do_not_rewind_last_run() {
        let store = InMemoryStore::new();
        store.insert_task(TaskConfig::new(1, "t", "true"));
        let earlier = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let later = DateTime::<Utc>::from_timestamp(1_700_000_060, 0).unwrap();

        store.update_run_stats(1, later).await.unwrap();
        store.update_run_stats(1, earlier).await.unwrap();

        let task = store.task(1).unwrap();
        assert_eq!(task.execute_times, 2);
        assert_eq!(task.prev_time, Some(later));
    }
}
