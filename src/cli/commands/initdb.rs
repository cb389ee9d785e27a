use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::path::Path;
use tracing::{debug, error, info, trace};

/// For SQLite file URLs, create the parent directory and ask the driver to
/// create the database file. Other URLs are returned unchanged.
pub(crate) fn prepare_sqlite_url(database_url: &str) -> Result<String> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(database_url.to_string());
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    if path.is_empty() || path.contains(":memory:") {
        return Ok(database_url.to_string());
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        debug!("Ensured database directory {}", parent.display());
    }

    Ok(match query {
        Some(query) if query.contains("mode=") => database_url.to_string(),
        Some(query) => format!("sqlite://{}?{}&mode=rwc", path, query),
        None => format!("sqlite://{}?mode=rwc", path),
    })
}

/// Connect to the database, creating an SQLite file when needed.
pub(crate) async fn connect_creating(database_url: &str) -> Result<DatabaseConnection> {
    let url = prepare_sqlite_url(database_url)?;

    trace!("Attempting to connect to database");
    match Database::connect(&url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            Ok(connection)
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            Err(e.into())
        }
    }
}

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");
    debug!("Database URL: {}", database_url);

    let db = connect_creating(database_url).await?;

    info!("Running database migrations");
    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
            debug!("All pending migrations have been applied");
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
    }

    info!("Database initialization completed successfully!");
    Ok(())
}
