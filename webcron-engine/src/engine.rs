use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures_util::FutureExt;
use log::{debug, error, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use webcron_database::TaskStore;
use webcron_models::core::{LogStatus, TaskConfig};

use crate::{
    dispatcher::{NotificationDispatcher, NotifyOutcome},
    errors::EngineError,
    guard::RunGuard,
    job::Job,
    pool::ExecutionPool,
    recorder::ExecutionRecorder,
    runner::CommandRunner,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        log_id: Option<i64>,
        status: LogStatus,
        notification: NotifyOutcome,
    },
    /// The run panicked; the failure has been logged.
    Panicked,
}

/// Executes jobs: guard, pool slot, command, log, notification.
pub struct Engine {
    pool: ExecutionPool,
    runner: CommandRunner,
    recorder: ExecutionRecorder,
    dispatcher: NotificationDispatcher,
    tasks: Arc<dyn TaskStore>,
    jobs: Mutex<HashMap<i64, Arc<Job>>>,
}

impl Engine {
    pub fn new(
        pool: ExecutionPool,
        runner: CommandRunner,
        recorder: ExecutionRecorder,
        dispatcher: NotificationDispatcher,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            pool,
            runner,
            recorder,
            dispatcher,
            tasks,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn pool(&self) -> &ExecutionPool {
        &self.pool
    }

    /// Register a job for `task`. An already registered job is kept as is.
    pub fn add_job(&self, task: TaskConfig) -> Result<Arc<Job>, EngineError> {
        let mut jobs = self.jobs.lock();
        if let Some(job) = jobs.get(&task.id) {
            return Ok(Arc::clone(job));
        }
        let job = Arc::new(Job::from_task(task)?);
        jobs.insert(job.id(), Arc::clone(&job));
        Ok(job)
    }

    pub fn remove_job(&self, task_id: i64) -> Option<Arc<Job>> {
        self.jobs.lock().remove(&task_id)
    }

    pub fn job(&self, task_id: i64) -> Option<Arc<Job>> {
        self.jobs.lock().get(&task_id).cloned()
    }

    /// Registered job for `task_id`, reading the task from the store on first use.
    pub async fn load_job(&self, task_id: i64) -> Result<Arc<Job>, EngineError> {
        if let Some(job) = self.job(task_id) {
            return Ok(job);
        }
        let task = self.tasks.fetch_task(task_id).await?;
        self.add_job(task)
    }

    pub async fn trigger_task(
        self: &Arc<Self>,
        task_id: i64,
    ) -> Result<Option<JoinHandle<RunOutcome>>, EngineError> {
        let job = self.load_job(task_id).await?;
        Ok(self.trigger(&job))
    }

    /// Start a run of `job` on its own task.
    ///
    /// Returns `None` without starting anything when the job is exclusive and
    /// a previous run is still in flight.
    pub fn trigger(self: &Arc<Self>, job: &Arc<Job>) -> Option<JoinHandle<RunOutcome>> {
        let Some(guard) = job.try_acquire() else {
            warn!(
                "Task {} is still running from a previous trigger; skipping this run",
                job.id()
            );
            return None;
        };
        let engine = Arc::clone(self);
        Some(tokio::spawn(async move { engine.run(guard).await }))
    }

    /// Execute the guarded run, containing any panic inside it.
    pub async fn run(&self, guard: RunGuard) -> RunOutcome {
        let job = Arc::clone(guard.job());
        let outcome = AssertUnwindSafe(self.execute(&job)).catch_unwind().await;
        guard.release();

        match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                error!(
                    "Task {} run failed unexpectedly: {}",
                    job.id(),
                    panic_message(panic.as_ref())
                );
                RunOutcome::Panicked
            }
        }
    }

    async fn execute(&self, job: &Arc<Job>) -> RunOutcome {
        let slot = self.pool.acquire_slot().await;
        debug!("Starting task {}: {}", job.id(), job.name());
        let started_at = Utc::now();
        let result = self.runner.run(job.command(), job.timeout()).await;
        slot.release();

        let log_id = self.recorder.persist(job, &result, started_at).await;
        let status = ExecutionRecorder::status_of(&result);

        let task = job.task();
        let notification = self
            .dispatcher
            .maybe_notify(job, &task, &result, started_at)
            .await;

        RunOutcome::Completed {
            log_id,
            status,
            notification,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");

        let payload: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
