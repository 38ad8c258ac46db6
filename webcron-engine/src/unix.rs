use log::warn;
use tokio::process::Child;

/// SIGKILL every process in the group led by the child shell.
pub fn kill_process_group(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("Failed to kill process group {}: {}", pid, err);
        }
    }
}
