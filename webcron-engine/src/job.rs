use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use webcron_models::core::TaskConfig;

use crate::errors::EngineError;

/// Runtime unit the engine executes for one task.
#[derive(Debug)]
pub struct Job {
    id: i64,
    name: String,
    command: String,
    concurrent: bool,
    timeout: Duration,
    pub(crate) task: Mutex<TaskConfig>,
    pub(crate) running: AtomicUsize,
}

impl Job {
    pub fn from_task(task: TaskConfig) -> Result<Self, EngineError> {
        if task.id < 1 {
            return Err(EngineError::InvalidTask(task.id));
        }
        Ok(Self {
            id: task.id,
            name: task.task_name.clone(),
            command: task.command.clone(),
            concurrent: task.concurrent,
            timeout: task.timeout(),
            task: Mutex::new(task),
            running: AtomicUsize::new(0),
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn concurrent(&self) -> bool {
        self.concurrent
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of runs of this job currently in flight.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    /// Copy of the task configuration including run bookkeeping.
    pub fn task(&self) -> TaskConfig {
        self.task.lock().clone()
    }
}
