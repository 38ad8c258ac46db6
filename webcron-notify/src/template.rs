//! HTML body of the run-result mail.
//!
//! Every placeholder of the mail template is a field of
//! [`NotificationContext`]; rendering cannot miss or misspell one.

use std::fmt::Write;

/// Values substituted into the notification template.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContext {
    pub username: String,
    pub task_id: i64,
    pub task_name: String,
    pub start_time: String,
    /// Run duration in seconds.
    pub process_time: f64,
    pub status: String,
    pub output: String,
    pub errput: String,
}

impl NotificationContext {
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(512 + self.output.len() + self.errput.len());
        // Writing into a String cannot fail.
        let _ = write!(
            html,
            "Hello {username},<br/>\n\
             \n\
             <p>Here is the result of your task:</p>\n\
             \n\
             <p>\n\
             Task ID: {task_id}<br/>\n\
             Task name: {task_name}<br/>\n\
             Started at: {start_time}<br/>\n\
             Duration: {process_time} seconds<br/>\n\
             Status: {status}\n\
             </p>\n\
             <p>------------- Output -------------</p>\n\
             <p>{output}</p>\n\
             \n\
             <p>------------- Error output -------------</p>\n\
             <p>{errput}</p>\n\
             \n\
             --------------------------------------------<br/>\n\
             This message was sent automatically, please do not reply.<br/>\n\
             To stop these notifications, change the task's notify setting.<br/>\n",
            username = escape_html(&self.username),
            task_id = self.task_id,
            task_name = escape_html(&self.task_name),
            start_time = escape_html(&self.start_time),
            process_time = self.process_time,
            status = escape_html(&self.status),
            output = escape_html(&self.output),
            errput = escape_html(&self.errput),
        );
        html
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> NotificationContext {
        NotificationContext {
            username: "alice".into(),
            task_id: 42,
            task_name: "rotate logs".into(),
            start_time: "2024-03-01 02:00:00".into(),
            process_time: 1.5,
            status: "failure (exit status: 2)".into(),
            output: "rotated 3 files".into(),
            errput: "gzip: disk full".into(),
        }
    }

    #[test]
    fn renders_every_field() {
        let html = context().render();

        assert!(html.starts_with("Hello alice,"));
        assert!(html.contains("Task ID: 42<br/>"));
        assert!(html.contains("Task name: rotate logs<br/>"));
        assert!(html.contains("Started at: 2024-03-01 02:00:00<br/>"));
        assert!(html.contains("Duration: 1.5 seconds<br/>"));
        assert!(html.contains("Status: failure (exit status: 2)"));
        assert!(html.contains("<p>rotated 3 files</p>"));
        assert!(html.contains("<p>gzip: disk full</p>"));
    }

    #[test]
    fn command_output_is_escaped() {
        let mut ctx = context();
        ctx.output = "<script>alert('x')</script> & more".into();

        let html = ctx.render();

        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more"));
        assert!(!html.contains("<script>"));
    }
}
