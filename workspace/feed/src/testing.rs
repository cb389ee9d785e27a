//! Fixtures shared by the unit tests of this crate.

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::{group, post, user};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

/// Create an in-memory SQLite database with all migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("!".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user")
}

pub async fn create_group(db: &DatabaseConnection, title: &str, slug: &str) -> group::Model {
    group::ActiveModel {
        title: Set(title.to_string()),
        slug: Set(slug.to_string()),
        description: Set("Test description".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test group")
}

/// Insert a post published now. Posts sharing a timestamp are ordered by id.
pub async fn create_post(
    db: &DatabaseConnection,
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
    .insert(db)
    .await
    .expect("Failed to create test post")
}
