use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub use migrations::Migrator;

// Database migration CLI runner
pub async fn run_migration(db_url: &str) -> Result<()> {
    let db = connect_for_migrations(db_url).await?;

    info!("Running database migrations");

    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}

/// Rolls back `steps` migrations, or all of them when `None`.
pub async fn rollback_migration(db_url: &str, steps: Option<u32>) -> Result<()> {
    let db = connect_for_migrations(db_url).await?;

    info!("Rolling back database migrations (steps: {:?})", steps);

    match Migrator::down(&db, steps).await {
        Ok(_) => {
            info!("Rollback completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Rollback failed: {}", e);
            Err(e.into())
        }
    }
}

async fn connect_for_migrations(db_url: &str) -> Result<sea_orm::DatabaseConnection> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(1)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true);

    Ok(Database::connect(opt).await?)
}
