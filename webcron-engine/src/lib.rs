pub mod dispatcher;
pub mod engine;
mod errors;
pub mod guard;
pub mod job;
pub mod pool;
pub mod recorder;
pub mod runner;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

pub use dispatcher::{NotificationDispatcher, NotifyOutcome};
pub use engine::{Engine, RunOutcome};
pub use errors::{EngineError, ExecutionError};
pub use guard::RunGuard;
pub use job::Job;
pub use pool::{ExecutionPool, SlotPermit};
pub use recorder::ExecutionRecorder;
pub use runner::{CommandRunner, ExecutionResult};
