use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use log::LevelFilter;
use webcron_models::errors::{RuntimeError, SendableError};
use webcron_notify::Protocol;
use webcron_utilities::logger::LoggerOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    Direct { endpoint: String, from: String },
    Relay { address: String, timeout: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSelection {
    Ids(Vec<i64>),
    AllEnabled,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: String,
    /// 0 means unlimited.
    pub pool_size: usize,
    /// `None` selects the platform default shell.
    pub shell: Option<String>,
    pub transport: TransportConfig,
    pub logger: LoggerOptions,
    pub tasks: TaskSelection,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[arg(long, default_value = "webcron.db")]
    database: String,

    #[arg(long, default_value_t = 10)]
    pool_size: usize,

    /// Shell used to run task commands; the platform shell when omitted.
    #[arg(long)]
    shell: Option<String>,

    #[arg(long, default_value = "direct")]
    transport: String,

    #[arg(long)]
    mail_endpoint: Option<String>,

    #[arg(long, default_value = "webcron@localhost")]
    mail_from: String,

    #[arg(long)]
    relay_address: Option<String>,

    #[arg(long, default_value_t = 10)]
    relay_timeout_seconds: u64,

    #[arg(long, default_value = "webcron.log")]
    log_file: String,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long = "task")]
    tasks: Vec<i64>,

    #[arg(long, conflicts_with = "tasks")]
    all: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl TryFrom<CliArgs> for Config {
    type Error = SendableError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let protocol = Protocol::from_str(&args.transport)
            .map_err(|err| RuntimeError::boxed("webcron.config.transport", err))?;

        let transport = match protocol {
            Protocol::Direct => TransportConfig::Direct {
                endpoint: non_empty(args.mail_endpoint).ok_or_else(|| {
                    RuntimeError::boxed(
                        "webcron.config.mail_endpoint",
                        "--mail-endpoint is required with the direct transport",
                    )
                })?,
                from: args.mail_from,
            },
            Protocol::Relay => TransportConfig::Relay {
                address: non_empty(args.relay_address).ok_or_else(|| {
                    RuntimeError::boxed(
                        "webcron.config.relay_address",
                        "--relay-address is required with the relay transport",
                    )
                })?,
                timeout: Duration::from_secs(args.relay_timeout_seconds.max(1)),
            },
        };

        let level = LevelFilter::from_str(&args.log_level).map_err(|_| {
            RuntimeError::boxed(
                "webcron.config.log_level",
                format!("unknown log level '{}'", args.log_level),
            )
        })?;
        let logger = LoggerOptions {
            level,
            file: non_empty(Some(args.log_file)).map(PathBuf::from),
        };

        let tasks = if args.all {
            TaskSelection::AllEnabled
        } else if !args.tasks.is_empty() {
            TaskSelection::Ids(args.tasks)
        } else {
            return Err(RuntimeError::boxed(
                "webcron.config.tasks",
                "nothing to run; pass --task <id> or --all",
            ));
        };

        Ok(Config {
            database: args.database,
            pool_size: args.pool_size,
            shell: non_empty(args.shell),
            transport,
            logger,
            tasks,
        })
    }
}

pub fn parse_config() -> Result<Config, SendableError> {
    Config::try_from(CliArgs::parse())
}
