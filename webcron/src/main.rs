mod config;

use std::sync::Arc;

use config::{parse_config, Config, TaskSelection, TransportConfig};
use futures_util::future::join_all;
use log::{error, info, warn};
use tokio::task::JoinHandle;
use webcron_database::{initialize_database, sqlite::SqliteDb};
use webcron_engine::{
    CommandRunner, Engine, ExecutionPool, ExecutionRecorder, NotificationDispatcher, RunOutcome,
};
use webcron_models::{core::LogStatus, errors::SendableError};
use webcron_notify::{
    DirectTransport, HttpMailSender, NotificationTransport, RelayTransport, TcpRelayClient,
};
use webcron_utilities::startup::startup;

fn build_transport(
    config: &TransportConfig,
) -> Result<Arc<dyn NotificationTransport>, SendableError> {
    Ok(match config {
        TransportConfig::Direct { endpoint, from } => {
            info!("Sending notifications through mail gateway {}", endpoint);
            let sender = HttpMailSender::new(endpoint, from.clone())?;
            Arc::new(DirectTransport::new(Arc::new(sender)))
        }
        TransportConfig::Relay { address, timeout } => {
            let client = TcpRelayClient::new(address.clone(), *timeout);
            info!("Sending notifications through relay {}", client.address());
            Arc::new(RelayTransport::new(Arc::new(client)))
        }
    })
}

fn build_engine(config: &Config, db: Arc<SqliteDb>) -> Result<Arc<Engine>, SendableError> {
    let pool = if config.pool_size == 0 {
        ExecutionPool::unlimited()
    } else {
        ExecutionPool::new(config.pool_size)
    };
    let recorder = ExecutionRecorder::new(db.clone(), db.clone());
    let dispatcher = NotificationDispatcher::new(db.clone(), build_transport(&config.transport)?);
    let runner = config
        .shell
        .as_deref()
        .map(CommandRunner::new)
        .unwrap_or_default();
    info!("Running commands through {}", runner.shell());
    Ok(Arc::new(Engine::new(pool, runner, recorder, dispatcher, db)))
}

async fn trigger_selected(
    engine: &Arc<Engine>,
    db: &SqliteDb,
    selection: &TaskSelection,
) -> Result<Vec<(i64, JoinHandle<RunOutcome>)>, SendableError> {
    let mut handles = Vec::new();
    match selection {
        TaskSelection::Ids(ids) => {
            for &id in ids {
                match engine.trigger_task(id).await {
                    Ok(Some(handle)) => handles.push((id, handle)),
                    Ok(None) => {}
                    Err(err) => error!("Cannot run task {}: {}", id, err),
                }
            }
        }
        TaskSelection::AllEnabled => {
            let tasks = db.fetch_enabled_tasks().await?;
            info!("Triggering {} enabled tasks", tasks.len());
            for task in tasks {
                let id = task.id;
                match engine.add_job(task) {
                    Ok(job) => {
                        if let Some(handle) = engine.trigger(&job) {
                            handles.push((id, handle));
                        }
                    }
                    Err(err) => error!("Cannot run task {}: {}", id, err),
                }
            }
        }
    }
    Ok(handles)
}

#[tokio::main]
async fn main() -> Result<(), SendableError> {
    let config = parse_config()?;
    startup("Webcron", &config.logger)?;

    info!("Initialize database {}", config.database);
    let db = Arc::new(SqliteDb::new(&config.database).await?);
    initialize_database(&db).await?;

    let engine = build_engine(&config, db.clone())?;
    info!(
        "Execution pool capacity: {}",
        engine
            .pool()
            .capacity()
            .map_or_else(|| "unlimited".to_string(), |capacity| capacity.to_string())
    );

    let handles = trigger_selected(&engine, &db, &config.tasks).await?;
    let (ids, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let outcomes = join_all(handles).await;

    let mut failures = 0;
    for (id, outcome) in ids.into_iter().zip(outcomes) {
        match outcome {
            Ok(RunOutcome::Completed {
                status: LogStatus::Success,
                ..
            }) => {}
            Ok(RunOutcome::Completed { status, .. }) => {
                warn!("Task {} ended with status {}", id, status.as_str());
                failures += 1;
            }
            Ok(RunOutcome::Panicked) => failures += 1,
            Err(err) => {
                error!("Task {} run was aborted: {}", id, err);
                failures += 1;
            }
        }
    }

    info!("All triggered runs finished ({} unsuccessful)", failures);
    Ok(())
}
