use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use log::{debug, error, info};
use webcron_database::UserStore;
use webcron_models::core::{NotifyPolicy, TaskConfig, User};
use webcron_notify::{
    NotificationContext, NotificationPayload, NotificationTransport, Protocol, Recipient,
};

use crate::{job::Job, runner::ExecutionResult};

const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Policy did not ask for a notification.
    NotRequired,
    /// The owning user could not be resolved.
    UserUnresolved,
    Sent,
    /// The transport reported a failure; it has been logged.
    Failed,
}

/// Whether `policy` asks for a notification about `result`.
///
/// A timeout carries no error, so it only notifies under `Always`.
pub fn should_notify(policy: NotifyPolicy, result: &ExecutionResult) -> bool {
    match policy {
        NotifyPolicy::Never => false,
        NotifyPolicy::OnFailure => result.error.is_some(),
        NotifyPolicy::Always => true,
    }
}

/// Decides on, renders and sends run-result notifications.
#[derive(Clone)]
pub struct NotificationDispatcher {
    users: Arc<dyn UserStore>,
    transport: Arc<dyn NotificationTransport>,
}

impl NotificationDispatcher {
    pub fn new(users: Arc<dyn UserStore>, transport: Arc<dyn NotificationTransport>) -> Self {
        Self { users, transport }
    }

    pub async fn maybe_notify(
        &self,
        job: &Job,
        task: &TaskConfig,
        result: &ExecutionResult,
        started_at: DateTime<Utc>,
    ) -> NotifyOutcome {
        if !should_notify(task.notify, result) {
            return NotifyOutcome::NotRequired;
        }

        let user = match self.users.fetch_user(task.user_id).await {
            Ok(user) => user,
            Err(err) => {
                debug!(
                    "Skipping notification for task {}: owner {} unresolved ({})",
                    job.id(),
                    task.user_id,
                    err
                );
                return NotifyOutcome::UserUnresolved;
            }
        };

        let payload = build_payload(
            job,
            task,
            &user,
            result,
            started_at,
            self.transport.protocol(),
        );

        match self.transport.deliver(&payload).await {
            Ok(()) => {
                info!(
                    "Sent {} notification for task {} to {}",
                    payload.protocol,
                    job.id(),
                    user.email
                );
                NotifyOutcome::Sent
            }
            Err(err) => {
                error!(
                    "Failed to send {} notification for task {} to {}: {}",
                    payload.protocol,
                    job.id(),
                    user.email,
                    err
                );
                NotifyOutcome::Failed
            }
        }
    }
}

/// Short outcome word used in the subject line.
fn outcome_word(result: &ExecutionResult) -> &'static str {
    if result.timed_out {
        "timeout"
    } else if result.error.is_some() {
        "failure"
    } else {
        "success"
    }
}

fn status_label(job: &Job, result: &ExecutionResult) -> String {
    if result.timed_out {
        format!("timeout ({} seconds)", job.timeout().as_secs())
    } else if let Some(err) = &result.error {
        format!("failure ({err})")
    } else {
        "success".to_string()
    }
}

pub fn build_payload(
    job: &Job,
    task: &TaskConfig,
    user: &User,
    result: &ExecutionResult,
    started_at: DateTime<Utc>,
    protocol: Protocol,
) -> NotificationPayload {
    let context = NotificationContext {
        username: user.username.clone(),
        task_id: job.id(),
        task_name: job.name().to_string(),
        start_time: started_at
            .with_timezone(&Local)
            .format(START_TIME_FORMAT)
            .to_string(),
        process_time: result.duration_ms() as f64 / 1000.0,
        status: status_label(job, result),
        output: result.stdout.clone(),
        errput: result.stderr.clone(),
    };

    NotificationPayload {
        subject: format!(
            "Task execution result #{}: {}",
            job.id(),
            outcome_word(result)
        ),
        body: context.render(),
        to: Recipient {
            email: user.email.clone(),
            name: user.username.clone(),
        },
        cc: task.cc_list(),
        protocol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExecutionError;
    use std::time::Duration;

    fn job() -> Job {
        let mut task = TaskConfig::new(12, "sync mirrors", "rsync -a src dst");
        task.timeout = 30;
        Job::from_task(task).unwrap()
    }

    fn user() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
        }
    }

    fn result(error: Option<ExecutionError>, timed_out: bool) -> ExecutionResult {
        ExecutionResult {
            stdout: "copied".into(),
            stderr: String::new(),
            error,
            timed_out,
            duration: Duration::from_millis(2500),
        }
    }

    #[test]
    fn policy_matrix() {
        let ok = result(None, false);
        let failed = result(Some(ExecutionError::ExitCode(1)), false);
        let timed_out = result(None, true);

        assert!(!should_notify(NotifyPolicy::Never, &ok));
        assert!(!should_notify(NotifyPolicy::Never, &failed));
        assert!(!should_notify(NotifyPolicy::OnFailure, &ok));
        assert!(should_notify(NotifyPolicy::OnFailure, &failed));
        assert!(!should_notify(NotifyPolicy::OnFailure, &timed_out));
        assert!(should_notify(NotifyPolicy::Always, &ok));
        assert!(should_notify(NotifyPolicy::Always, &timed_out));
    }

    #[test]
    fn payload_for_failure() {
        let job = job();
        let mut task = job.task();
        task.notify_email = "ops@example.com\n\nlead@example.com".into();

        let payload = build_payload(
            &job,
            &task,
            &user(),
            &result(Some(ExecutionError::ExitCode(3)), false),
            Utc::now(),
            Protocol::Relay,
        );

        assert_eq!(payload.subject, "Task execution result #12: failure");
        assert!(payload.body.contains("Status: failure (exit status 3)"));
        assert!(payload.body.contains("Duration: 2.5 seconds"));
        assert!(payload.body.contains("Hello alice,"));
        assert_eq!(payload.to.email, "alice@example.com");
        assert_eq!(payload.cc, vec!["ops@example.com", "lead@example.com"]);
        assert_eq!(payload.protocol, Protocol::Relay);
    }

    #[test]
    fn payload_for_timeout_mentions_limit() {
        let job = job();
        let payload = build_payload(
            &job,
            &job.task(),
            &user(),
            &result(None, true),
            Utc::now(),
            Protocol::Direct,
        );

        assert_eq!(payload.subject, "Task execution result #12: timeout");
        assert!(payload.body.contains("Status: timeout (30 seconds)"));
        assert!(payload.cc.is_empty());
    }

    #[test]
    fn payload_for_success() {
        let job = job();
        let payload = build_payload(
            &job,
            &job.task(),
            &user(),
            &result(None, false),
            Utc::now(),
            Protocol::Direct,
        );

        assert_eq!(payload.subject, "Task execution result #12: success");
        assert!(payload.body.contains("Status: success"));
        assert!(payload.body.contains("<p>copied</p>"));
    }
}
