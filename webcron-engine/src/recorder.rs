use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info};
use webcron_database::{LogStore, TaskStore};
use webcron_models::core::{LogEntry, LogStatus};

use crate::{job::Job, runner::ExecutionResult};

/// Persists run logs and the task's run bookkeeping.
#[derive(Clone)]
pub struct ExecutionRecorder {
    logs: Arc<dyn LogStore>,
    tasks: Arc<dyn TaskStore>,
}

impl ExecutionRecorder {
    pub fn new(logs: Arc<dyn LogStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { logs, tasks }
    }

    /// Status a run is logged with. Exactly one applies to any result.
    pub fn status_of(result: &ExecutionResult) -> LogStatus {
        if result.timed_out {
            LogStatus::Timeout
        } else if result.error.is_some() {
            LogStatus::Error
        } else {
            LogStatus::Success
        }
    }

    /// Build the log entry describing `result`.
    pub fn log_entry(job: &Job, result: &ExecutionResult, started_at: DateTime<Utc>) -> LogEntry {
        let status = Self::status_of(result);
        let error = match (&result.error, status) {
            (_, LogStatus::Timeout) => format!(
                "execution exceeded {} seconds\n----------------------\n{}\n",
                job.timeout().as_secs(),
                result.stderr
            ),
            (Some(err), _) => format!("{}:{}", err, result.stderr),
            _ => result.stderr.clone(),
        };

        LogEntry {
            id: None,
            task_id: job.id(),
            output: result.stdout.clone(),
            error,
            status,
            process_time_ms: result.duration_ms(),
            created_at: started_at,
        }
    }

    /// Write the run log and bump the task's run counters.
    ///
    /// Store failures are logged and swallowed; the returned id is `None` when
    /// the log could not be written.
    pub async fn persist(
        &self,
        job: &Job,
        result: &ExecutionResult,
        started_at: DateTime<Utc>,
    ) -> Option<i64> {
        let entry = Self::log_entry(job, result, started_at);
        let log_id = match self.logs.insert_log(&entry).await {
            Ok(id) => Some(id),
            Err(err) => {
                error!("Failed to write run log for task {}: {}", job.id(), err);
                None
            }
        };

        {
            let mut task = job.task.lock();
            task.execute_times += 1;
            task.prev_time = task.prev_time.max(Some(started_at));
        }
        if let Err(err) = self.tasks.update_run_stats(job.id(), started_at).await {
            error!("Failed to update run stats for task {}: {}", job.id(), err);
        }

        info!(
            "Task {} finished with status {} in {} ms (log {:?})",
            job.id(),
            entry.status.as_str(),
            entry.process_time_ms,
            log_id
        );
        log_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExecutionError;
    use std::time::Duration;
    use webcron_database::memory::InMemoryStore;
    use webcron_models::core::TaskConfig;

    fn job() -> Job {
        let mut task = TaskConfig::new(3, "cleanup", "rm -rf /tmp/cache");
        task.timeout = 60;
        Job::from_task(task).unwrap()
    }

    fn result(error: Option<ExecutionError>, timed_out: bool) -> ExecutionResult {
        ExecutionResult {
            stdout: "out".into(),
            stderr: "err".into(),
            error,
            timed_out,
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn timeout_maps_to_timeout_status() {
        let entry = ExecutionRecorder::log_entry(&job(), &result(None, true), Utc::now());
        assert_eq!(entry.status, LogStatus::Timeout);
        assert!(entry.error.starts_with("execution exceeded 60 seconds\n"));
        assert!(entry.error.ends_with("err\n"));
        assert_eq!(entry.process_time_ms, 1500);
    }

    #[test]
    fn error_maps_to_error_status() {
        let entry = ExecutionRecorder::log_entry(
            &job(),
            &result(Some(ExecutionError::ExitCode(2)), false),
            Utc::now(),
        );
        assert_eq!(entry.status, LogStatus::Error);
        assert_eq!(entry.error, "exit status 2:err");
        assert_eq!(entry.output, "out");
    }

    #[test]
    fn clean_exit_maps_to_success() {
        let entry = ExecutionRecorder::log_entry(&job(), &result(None, false), Utc::now());
        assert_eq!(entry.status, LogStatus::Success);
        assert_eq!(entry.error, "err");
    }

    #[tokio::test]
    async fn persist_writes_log_and_bumps_counters() {
        let store = InMemoryStore::new();
        let job = job();
        store.insert_task(job.task());
        let recorder = ExecutionRecorder::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let started_at = Utc::now();

        let log_id = recorder.persist(&job, &result(None, false), started_at).await;

        assert_eq!(log_id, Some(1));
        assert_eq!(store.logs_for(3).len(), 1);
        let stored = store.task(3).unwrap();
        assert_eq!(stored.execute_times, 1);
        assert_eq!(stored.prev_time, Some(started_at));
        assert_eq!(job.task().execute_times, 1);
    }

    #[tokio::test]
    async fn log_failure_does_not_block_bookkeeping() {
        let store = InMemoryStore::new();
        let job = job();
        store.insert_task(job.task());
        store.set_fail_log_inserts(true);
        let recorder = ExecutionRecorder::new(Arc::new(store.clone()), Arc::new(store.clone()));

        let log_id = recorder.persist(&job, &result(None, true), Utc::now()).await;

        assert_eq!(log_id, None);
        assert!(store.logs().is_empty());
        assert_eq!(store.task(3).unwrap().execute_times, 1);
    }
}
