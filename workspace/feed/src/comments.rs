use crate::error::{FeedError, Result};
use crate::users::author_dto;
use chrono::Utc;
use common::CommentDto;
use model::entities::{comment, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument, warn};

/// A comment with its author loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: comment::Model,
    pub author: user::Model,
}

impl From<CommentView> for CommentDto {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            post_id: view.comment.post_id,
            text: view.comment.text,
            created: view.comment.created,
            author: author_dto(view.author),
        }
    }
}

/// Attach a comment by `author_id` to `post_id`.
#[instrument(skip(db, text))]
pub async fn add_comment(
    db: &DatabaseConnection,
    post_id: i32,
    author_id: i32,
    text: &str,
) -> Result<comment::Model> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FeedError::validation("text", "This field is required."));
    }

    let created = comment::ActiveModel {
        post_id: Set(post_id),
        author_id: Set(author_id),
        text: Set(text.to_string()),
        created: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Comment created with ID: {} on post {}", created.id, post_id);
    Ok(created)
}

/// Comments of a post, oldest first.
#[instrument(skip(db))]
pub async fn comments_for_post(db: &DatabaseConnection, post_id: i32) -> Result<Vec<CommentView>> {
    let rows = comment::Entity::find()
        .filter(comment::Column::PostId.eq(post_id))
        .order_by_asc(comment::Column::Created)
        .order_by_asc(comment::Column::Id)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(comment, author)| match author {
            Some(author) => Some(CommentView { comment, author }),
            None => {
                warn!("Comment {} has no author, skipping", comment.id);
                None
            }
        })
        .collect())
}
