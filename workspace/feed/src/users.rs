use crate::error::{FeedError, Result};
use common::AuthorDto;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, instrument};

/// Longest accepted username.
pub const USERNAME_MAX_LENGTH: usize = 150;

pub fn author_dto(model: user::Model) -> AuthorDto {
    AuthorDto {
        id: model.id,
        username: model.username,
    }
}

/// Check a username: 1 to 150 characters of letters, digits and `@.+-_`.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(FeedError::validation("username", "This field is required."));
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(FeedError::validation(
            "username",
            format!("Ensure this value has at most {} characters.", USERNAME_MAX_LENGTH),
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(FeedError::validation(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

/// Register a new user with an already hashed password.
#[instrument(skip(db, password_hash))]
pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    password_hash: String,
) -> Result<user::Model> {
    validate_username(username)?;

    let new_user = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        ..Default::default()
    };

    let created = new_user.insert(db).await.map_err(|err| {
        FeedError::from_insert(err, "username", "A user with that username already exists.")
    })?;

    info!("User created with ID: {}, username: {}", created.id, created.username);
    Ok(created)
}

#[instrument(skip(db))]
pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<user::Model> {
    debug!("Looking up user by username");
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| FeedError::not_found("User", username))
}

#[instrument(skip(db))]
pub async fn find_by_id(db: &DatabaseConnection, user_id: i32) -> Result<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| FeedError::not_found("User", user_id))
}
