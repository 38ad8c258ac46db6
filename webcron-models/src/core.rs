use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timeout applied when a task is configured with `timeout == 0`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// When the owner of a task is told about a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    #[default]
    Never,
    OnFailure,
    Always,
}

impl NotifyPolicy {
    /// Decode the integer stored in the task table. Unknown values mean `Never`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => NotifyPolicy::OnFailure,
            2 => NotifyPolicy::Always,
            _ => NotifyPolicy::Never,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            NotifyPolicy::Never => 0,
            NotifyPolicy::OnFailure => 1,
            NotifyPolicy::Always => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub id: i64,
    pub task_name: String,
    pub command: String,
    /// Seconds; `0` or less selects [`DEFAULT_TIMEOUT`].
    pub timeout: i64,
    pub concurrent: bool,
    pub notify: NotifyPolicy,
    /// Extra cc addresses, one per line.
    pub notify_email: String,
    pub user_id: i64,
    pub execute_times: i64,
    pub prev_time: Option<DateTime<Utc>>,
    pub enabled: bool,
}

impl TaskConfig {
    pub fn new(id: i64, task_name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id,
            task_name: task_name.into(),
            command: command.into(),
            timeout: 0,
            concurrent: false,
            notify: NotifyPolicy::Never,
            notify_email: String::new(),
            user_id: 0,
            execute_times: 0,
            prev_time: None,
            enabled: true,
        }
    }

    /// Effective execution timeout.
    pub fn timeout(&self) -> Duration {
        if self.timeout > 0 {
            Duration::from_secs(self.timeout as u64)
        } else {
            DEFAULT_TIMEOUT
        }
    }

    /// Addresses from `notify_email`, one per non-blank line.
    pub fn cc_list(&self) -> Vec<String> {
        self.notify_email
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Error,
    Timeout,
}

impl LogStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => LogStatus::Error,
            -2 => LogStatus::Timeout,
            _ => LogStatus::Success,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            LogStatus::Success => 0,
            LogStatus::Error => -1,
            LogStatus::Timeout => -2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
            LogStatus::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Option<i64>,
    pub task_id: i64,
    pub output: String,
    pub error: String,
    pub status: LogStatus,
    pub process_time_ms: i64,
    pub created_at: DateTime<Utc>,
}
