use std::io;

use thiserror::Error;
use webcron_database::StoreError;

/// Why a command run did not succeed. Timeouts are reported separately.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to start command: {0}")]
    Spawn(#[source] io::Error),
    #[error("exit status {0}")]
    ExitCode(i32),
    #[error("terminated by signal")]
    Signaled,
    #[error("failed to wait for command: {0}")]
    Wait(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task {0} has no valid id")]
    InvalidTask(i64),
    #[error("task lookup failed: {0}")]
    TaskLookup(#[from] StoreError),
}
