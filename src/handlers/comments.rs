use crate::auth::AuthUser;
use crate::schemas::{AppState, HandlerError, feed_error_response, found, post_detail_url};
use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::{Json, Response},
};
use feed::{FeedError, comments, posts};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Submitted comment form
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CommentForm {
    /// Comment text
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

/// Comment on a post. An invalid form is ignored.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/comment/",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body = CommentForm,
    responses(
        (status = 302, description = "Redirect back to the post, or to login"),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i32>,
    form: Result<Json<CommentForm>, JsonRejection>,
) -> Result<Response, HandlerError> {
    trace!("Entering add_comment function");

    let post = posts::find_post(&state.db, post_id)
        .await
        .map_err(feed_error_response)?;

    let form = match form {
        Ok(Json(form)) => form,
        Err(rejection) => {
            debug!("Ignoring unreadable comment form: {}", rejection);
            return Ok(found(post_detail_url(post.id)));
        }
    };

    if let Err(errors) = form.validate() {
        debug!("Ignoring invalid comment form: {}", errors);
        return Ok(found(post_detail_url(post.id)));
    }

    match comments::add_comment(&state.db, post.id, user.id, &form.text).await {
        Ok(comment) => {
            info!("Comment {} added to post {} by {}", comment.id, post.id, user.username);
        }
        Err(FeedError::Validation { message, .. }) => {
            debug!("Ignoring invalid comment: {}", message);
        }
        Err(e) => return Err(feed_error_response(e)),
    }

    Ok(found(post_detail_url(post.id)))
}
