use anyhow::Result;
use moka::future::Cache;
use sea_orm::{Database, DatabaseConnection};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://yatube.db";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_INDEX_CACHE_TTL_SECS: u64 = 20;

/// Runtime settings of the web application.
#[derive(Clone)]
pub struct Settings {
    /// HS256 key used to sign and verify access tokens
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Directory uploaded images are written to and served from
    pub media_root: PathBuf,
    /// How long a rendered index page stays cached
    pub index_cache_ttl: Duration,
}

impl Settings {
    pub fn new(
        jwt_secret: impl Into<String>,
        token_ttl_hours: u64,
        media_root: impl Into<PathBuf>,
        index_cache_ttl_secs: u64,
    ) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::from_secs(token_ttl_hours * 3600),
            media_root: media_root.into(),
            index_cache_ttl: Duration::from_secs(index_cache_ttl_secs),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("media_root", &self.media_root)
            .field("index_cache_ttl", &self.index_cache_ttl)
            .finish()
    }
}

/// Build the application state around an open connection.
pub fn build_app_state(db: DatabaseConnection, settings: Settings) -> AppState {
    let cache = Cache::builder()
        .max_capacity(1000)
        .time_to_live(settings.index_cache_ttl)
        .build();

    AppState {
        db,
        cache,
        settings: Arc::new(settings),
    }
}

/// Connect to `database_url` and initialize application state
pub async fn initialize_app_state_with_url(
    database_url: &str,
    settings: Settings,
) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;
    debug!("Application settings: {:?}", settings);

    Ok(build_app_state(db, settings))
}
