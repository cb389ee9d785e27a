use crate::auth::{UNUSABLE_PASSWORD, issue_token};
use crate::config::{Settings, build_app_state};
use crate::router::create_router;
use crate::schemas::AppState;
use axum::http::HeaderValue;
use axum_test::TestServer;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::{group, post, user};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use std::path::Path;
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// A 2x1 GIF image.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing with media stored under `media_root`
pub async fn setup_test_app_state(media_root: &Path) -> AppState {
    let db = setup_test_db().await;
    build_app_state(db, Settings::new(TEST_JWT_SECRET, 24, media_root, 20))
}

/// Initialize tracing for tests. The level comes from RUST_LOG and
/// defaults to WARN; output goes through the test harness.
fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A running test server with direct access to its state.
pub struct TestContext {
    pub server: TestServer,
    pub state: AppState,
    media_root: TempDir,
}

pub async fn setup_test_context() -> TestContext {
    init_test_tracing();

    let media_root = tempfile::tempdir().expect("Failed to create media root");
    let state = setup_test_app_state(media_root.path()).await;
    let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");

    TestContext {
        server,
        state,
        media_root,
    }
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("Invalid token header")
}

impl TestContext {
    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub fn media_root(&self) -> &Path {
        self.media_root.path()
    }

    /// Create a user that can only authenticate with the returned token.
    pub async fn create_user(&self, username: &str) -> (user::Model, String) {
        let user = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(UNUSABLE_PASSWORD.to_string()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("Failed to create test user");

        let token = issue_token(&self.state.settings, &user).expect("Failed to issue token");
        (user, token)
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> group::Model {
        group::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            description: Set("Test description".to_string()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("Failed to create test group")
    }

    pub async fn create_post(
        &self,
        author: &user::Model,
        group: Option<&group::Model>,
        text: &str,
    ) -> post::Model {
        post::ActiveModel {
            text: Set(text.to_string()),
            pub_date: Set(Utc::now()),
            author_id: Set(author.id),
            group_id: Set(group.map(|g| g.id)),
            image: Set(None),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("Failed to create test post")
    }
}
