use crate::schemas::{AppState, PageQuery, PageResult, feed_error_response};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{ApiResponse, GroupDto, Page, PostDto};
use feed::groups::group_dto;
use feed::{PageRequest, groups, posts};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use utoipa::ToSchema;

/// Context of a group page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupContext {
    pub group: GroupDto,
    pub page_obj: Page<PostDto>,
}

/// Posts of one group
#[utoipa::path(
    get,
    path = "/group/{slug}/",
    tag = "groups",
    params(
        ("slug" = String, Path, description = "Group slug"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Group page", body = ApiResponse<GroupContext>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn group_posts(
    Valid(Query(query)): Valid<Query<PageQuery>>,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> PageResult<GroupContext> {
    trace!("Entering group_posts function");

    let group = groups::find_by_slug(&state.db, &slug)
        .await
        .map_err(feed_error_response)?;

    let request = PageRequest::parse(query.page.as_deref());
    let page = posts::group_posts(&state.db, group.id, request)
        .await
        .map_err(feed_error_response)?;
    debug!(
        "Group '{}' page {} of {} ({} posts)",
        slug, page.number, page.num_pages, page.count
    );

    let context = GroupContext {
        group: group_dto(group),
        page_obj: page.map(PostDto::from),
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(context, "Group posts retrieved successfully")),
    ))
}

/// All groups
#[utoipa::path(
    get,
    path = "/groups/",
    tag = "groups",
    responses(
        (status = 200, description = "Groups sorted by title", body = ApiResponse<Vec<GroupDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn list_groups(State(state): State<AppState>) -> PageResult<Vec<GroupDto>> {
    trace!("Entering list_groups function");

    let groups = groups::list_groups(&state.db)
        .await
        .map_err(feed_error_response)?;
    debug!("Retrieved {} groups", groups.len());

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            groups.into_iter().map(group_dto).collect(),
            "Groups retrieved successfully",
        )),
    ))
}
