//! Subscriptions between users.
//!
//! An edge `(user, author)` exists at most once and a user never follows
//! themselves.

use crate::error::{FeedError, Result};
use model::entities::follow;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::{debug, info, instrument};

/// What a follow request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    /// Following yourself is refused
    SelfFollow,
}

#[instrument(skip(db))]
pub async fn is_following(db: &DatabaseConnection, user_id: i32, author_id: i32) -> Result<bool> {
    let count = follow::Entity::find()
        .filter(follow::Column::UserId.eq(user_id))
        .filter(follow::Column::AuthorId.eq(author_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Subscribe `user_id` to `author_id`. Repeating the request is harmless.
#[instrument(skip(db))]
pub async fn follow(db: &DatabaseConnection, user_id: i32, author_id: i32) -> Result<FollowOutcome> {
    if user_id == author_id {
        debug!("User {} tried to follow themselves", user_id);
        return Ok(FollowOutcome::SelfFollow);
    }
    if is_following(db, user_id, author_id).await? {
        return Ok(FollowOutcome::AlreadyFollowing);
    }

    let insert = follow::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        ..Default::default()
    }
    .insert(db)
    .await;

    match insert {
        Ok(created) => {
            info!("User {} now follows author {} (edge {})", user_id, author_id, created.id);
            Ok(FollowOutcome::Created)
        }
        // A concurrent request created the same edge
        Err(err) => match FeedError::from_insert(err, "author", "Already following.") {
            FeedError::Validation { .. } => Ok(FollowOutcome::AlreadyFollowing),
            other => Err(other),
        },
    }
}

/// Remove the edge if it exists. Returns whether anything was deleted.
#[instrument(skip(db))]
pub async fn unfollow(db: &DatabaseConnection, user_id: i32, author_id: i32) -> Result<bool> {
    let result = follow::Entity::delete_many()
        .filter(follow::Column::UserId.eq(user_id))
        .filter(follow::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!("User {} unfollowed author {}", user_id, author_id);
    } else {
        debug!("User {} was not following author {}", user_id, author_id);
    }
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_user, setup_db};

    #[tokio::test]
    async fn test_follow_and_unfollow() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let reader = create_user(&db, "reader").await;

        assert!(!is_following(&db, reader.id, author.id).await.unwrap());

        let outcome = follow(&db, reader.id, author.id).await.unwrap();
        assert_eq!(outcome, FollowOutcome::Created);
        assert!(is_following(&db, reader.id, author.id).await.unwrap());
        // Edges are directed
        assert!(!is_following(&db, author.id, reader.id).await.unwrap());

        assert!(unfollow(&db, reader.id, author.id).await.unwrap());
        assert!(!is_following(&db, reader.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_twice_keeps_one_edge() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let reader = create_user(&db, "reader").await;

        follow(&db, reader.id, author.id).await.unwrap();
        let again = follow(&db, reader.id, author.id).await.unwrap();

        assert_eq!(again, FollowOutcome::AlreadyFollowing);
        let edges = follow::Entity::find().count(&db).await.unwrap();
        assert_eq!(edges, 1);
    }

    #[tokio::test]
    async fn test_self_follow_refused() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;

        let outcome = follow(&db, author.id, author.id).await.unwrap();

        assert_eq!(outcome, FollowOutcome::SelfFollow);
        assert!(!is_following(&db, author.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_is_noop() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let reader = create_user(&db, "reader").await;

        assert!(!unfollow(&db, reader.id, author.id).await.unwrap());
    }
}
