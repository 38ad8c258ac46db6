use log::warn;
use tokio::process::Child;

/// Terminate the child and everything it started.
pub fn kill_process_tree(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let status = std::process::Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
    if let Err(err) = status {
        warn!("Failed to run taskkill for {}: {}", pid, err);
    }
}
