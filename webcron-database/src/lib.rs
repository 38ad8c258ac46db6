use log::info;

pub mod interfaces;
mod mappers;
pub mod memory;
pub mod sqlite;

pub use interfaces::{LogStore, StoreError, TaskStore, UserStore};

pub async fn initialize_database(db: &sqlite::SqliteDb) -> Result<(), StoreError> {
    info!("Creating tables");
    db.create_tasks_table().await?;
    db.create_users_table().await?;
    db.create_task_logs_table().await?;
    Ok(())
}
