use crate::auth::AuthUser;
use crate::schemas::{AppState, PageQuery, PageResult, feed_error_response};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{ApiResponse, Page, PostDto};
use feed::{PageRequest, posts};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use utoipa::ToSchema;

/// Context of the subscriptions feed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowContext {
    pub page_obj: Page<PostDto>,
}

/// Posts of the authors the user follows
#[utoipa::path(
    get,
    path = "/follow/",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Subscriptions feed", body = ApiResponse<FollowContext>),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn follow_index(
    State(state): State<AppState>,
    user: AuthUser,
    Valid(Query(query)): Valid<Query<PageQuery>>,
) -> PageResult<FollowContext> {
    trace!("Entering follow_index function");

    let request = PageRequest::parse(query.page.as_deref());
    let page = posts::followed_posts(&state.db, user.id, request)
        .await
        .map_err(feed_error_response)?;
    debug!(
        "Subscriptions feed of {}: page {} of {} ({} posts)",
        user.username, page.number, page.num_pages, page.count
    );

    let context = FollowContext {
        page_obj: page.map(PostDto::from),
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(context, "Subscriptions feed retrieved successfully")),
    ))
}
