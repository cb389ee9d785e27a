use crate::auth::AuthUser;
use crate::schemas::{
    AppState, HandlerError, PageQuery, PageResult, feed_error_response, found,
    profile_url,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
};
use axum_valid::Valid;
use common::{ApiResponse, AuthorDto, Page, PostDto};
use feed::follows::{self, FollowOutcome};
use feed::users::{self, author_dto};
use feed::{PageRequest, posts};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

/// Context of an author profile
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileContext {
    pub author: AuthorDto,
    /// Number of posts written by the author
    pub posts_count: u64,
    /// Whether the requesting user follows the author
    pub following: bool,
    pub page_obj: Page<PostDto>,
}

/// Posts of one author
#[utoipa::path(
    get,
    path = "/profile/{username}/",
    tag = "profiles",
    params(
        ("username" = String, Path, description = "Username of the author"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Profile page", body = ApiResponse<ProfileContext>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn profile(
    Valid(Query(query)): Valid<Query<PageQuery>>,
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(username): Path<String>,
) -> PageResult<ProfileContext> {
    trace!("Entering profile function");

    let author = users::find_by_username(&state.db, &username)
        .await
        .map_err(feed_error_response)?;

    let posts_count = posts::count_by_author(&state.db, author.id)
        .await
        .map_err(feed_error_response)?;

    let following = match &viewer {
        Some(viewer) => follows::is_following(&state.db, viewer.id, author.id)
            .await
            .map_err(feed_error_response)?,
        None => false,
    };

    let request = PageRequest::parse(query.page.as_deref());
    let page = posts::author_posts(&state.db, author.id, request)
        .await
        .map_err(feed_error_response)?;
    debug!(
        "Profile of '{}' page {} of {}, following: {}",
        username, page.number, page.num_pages, following
    );

    let context = ProfileContext {
        author: author_dto(author),
        posts_count,
        following,
        page_obj: page.map(PostDto::from),
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(context, "Profile retrieved successfully")),
    ))
}

/// Subscribe to an author
#[utoipa::path(
    get,
    path = "/profile/{username}/follow/",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(("username" = String, Path, description = "Username of the author")),
    responses(
        (status = 302, description = "Redirect to the author profile, or to login"),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn profile_follow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<Response, HandlerError> {
    trace!("Entering profile_follow function");

    let author = users::find_by_username(&state.db, &username)
        .await
        .map_err(feed_error_response)?;

    match follows::follow(&state.db, user.id, author.id)
        .await
        .map_err(feed_error_response)?
    {
        FollowOutcome::Created => info!("{} follows {}", user.username, author.username),
        FollowOutcome::AlreadyFollowing => {
            debug!("{} already follows {}", user.username, author.username)
        }
        FollowOutcome::SelfFollow => debug!("Ignoring self-follow of {}", user.username),
    }

    Ok(found(profile_url(&author.username)))
}

/// Unsubscribe from an author
#[utoipa::path(
    get,
    path = "/profile/{username}/unfollow/",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(("username" = String, Path, description = "Username of the author")),
    responses(
        (status = 302, description = "Redirect to the author profile, or to login"),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn profile_unfollow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<Response, HandlerError> {
    trace!("Entering profile_unfollow function");

    let author = users::find_by_username(&state.db, &username)
        .await
        .map_err(feed_error_response)?;

    let removed = follows::unfollow(&state.db, user.id, author.id)
        .await
        .map_err(feed_error_response)?;
    if removed {
        info!("{} unfollowed {}", user.username, author.username);
    }

    Ok(found(profile_url(&author.username)))
}
