use std::env;

use log::info;
use webcron_models::errors::SendableError;

use crate::logger::{self, LoggerOptions, print_env};

/// Install logging and the panic hook, then announce the process.
///
/// Panics anywhere in the process, including inside job runs, are routed
/// through `log` with a backtrace once this has returned.
pub fn startup(name: &str, options: &LoggerOptions) -> Result<(), SendableError> {
    if env::var_os("RUST_BACKTRACE").is_none() {
        unsafe {
            env::set_var("RUST_BACKTRACE", "1");
        }
    }
    logger::setup_logger(options)?;
    log_panics::init();

    info!("--- {} ---", name);
    print_env()?;

    Ok(())
}
