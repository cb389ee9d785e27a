use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use tracing::{debug, error, info, trace};

use super::initdb::connect_creating;
use super::serve::run_server;
use crate::config::{Settings, build_app_state};

pub async fn migrate_and_serve(
    database_url: &str,
    bind_address: &str,
    settings: Settings,
) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", database_url);
    debug!("Bind address: {}", bind_address);

    let db = connect_creating(database_url).await?;

    info!("Running database migrations");
    match Migrator::up(&db, None).await {
        Ok(_) => info!("Database migrations completed successfully"),
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
    }

    let state = build_app_state(db, settings);
    debug!("Application state initialized successfully");

    run_server(state, bind_address).await
}
