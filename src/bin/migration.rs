use anyhow::Result;
use tracing::info;

use rene_shop::{config, migrator};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    info!(environment = %cfg.environment, "Loaded configuration");

    info!("Starting database migration");
    migrator::run_migration(cfg.database_url()).await?;
    info!("Migration completed successfully");

    Ok(())
}
