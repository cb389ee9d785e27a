use crate::auth::AuthUser;
use crate::forms::{comment_form, post_form};
use crate::media::{ImageUpload, MediaError, store_post_image};
use crate::schemas::{
    AppState, CachedData, ErrorResponse, HandlerError, PageQuery, PageResult, feed_error_response,
    found, invalid_form, post_detail_url, profile_url,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_valid::Valid;
use common::{ApiResponse, CommentDto, FormDescriptor, Page, PostDto};
use feed::posts::{self, NewPost, PostChanges};
use feed::{PageRequest, comments, groups};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Context of the index page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndexContext {
    pub page_obj: Page<PostDto>,
}

/// Context of the post detail page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostDetailContext {
    pub post: PostDto,
    /// First 30 characters of the post text
    pub post_title: String,
    /// Number of posts written by the author
    pub posts_count: u64,
    /// Comments, oldest first
    pub comments: Vec<CommentDto>,
    /// Form for a new comment
    pub form: FormDescriptor,
}

/// Context of the create and edit pages
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostFormContext {
    pub form: FormDescriptor,
    pub is_edit: bool,
    /// The post being edited
    pub post: Option<PostDto>,
}

/// Submitted post form
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct PostForm {
    /// Post text
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// ID of the group the post belongs to
    pub group: Option<i32>,
    /// Image to attach; on edit a missing image keeps the current one
    pub image: Option<ImageUpload>,
}

async fn store_image(
    state: &AppState,
    upload: Option<&ImageUpload>,
) -> Result<Option<String>, HandlerError> {
    let Some(upload) = upload else {
        return Ok(None);
    };

    match store_post_image(&state.settings.media_root, upload).await {
        Ok(path) => Ok(Some(path)),
        Err(MediaError::Io(e)) => {
            error!("Failed to store uploaded image '{}': {}", upload.file_name, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to store image", "MEDIA_ERROR")),
            ))
        }
        Err(e) => {
            warn!("Rejected uploaded image '{}': {}", upload.file_name, e);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("image: {}", e), "INVALID_FORM")),
            ))
        }
    }
}

/// Remove an image stored for a post that was not saved after all.
async fn discard_image(state: &AppState, image: Option<&String>) {
    if let Some(path) = image {
        if let Err(e) = tokio::fs::remove_file(state.settings.media_root.join(path)).await {
            warn!("Failed to remove unused image {}: {}", path, e);
        }
    }
}

/// Latest posts of all authors
#[utoipa::path(
    get,
    path = "/",
    tag = "posts",
    params(PageQuery),
    responses(
        (status = 200, description = "Index page", body = ApiResponse<IndexContext>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn index(
    Valid(Query(query)): Valid<Query<PageQuery>>,
    State(state): State<AppState>,
) -> PageResult<IndexContext> {
    trace!("Entering index function");

    let request = PageRequest::parse(query.page.as_deref());
    let cache_key = format!("index:{:?}", request);

    if let Some(CachedData::IndexPage(context)) = state.cache.get(&cache_key).await {
        debug!("Serving index page from cache, key: {}", cache_key);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::ok(context, "Latest posts retrieved successfully")),
        ));
    }

    let page = posts::latest_posts(&state.db, request)
        .await
        .map_err(feed_error_response)?;
    debug!("Rendered index page {} of {}", page.number, page.num_pages);

    let context = IndexContext {
        page_obj: page.map(PostDto::from),
    };
    state
        .cache
        .insert(cache_key, CachedData::IndexPage(context.clone()))
        .await;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(context, "Latest posts retrieved successfully")),
    ))
}

/// One post with its comments
#[utoipa::path(
    get,
    path = "/posts/{post_id}/",
    tag = "posts",
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post detail page", body = ApiResponse<PostDetailContext>),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> PageResult<PostDetailContext> {
    trace!("Entering post_detail function");

    let view = posts::find_post_view(&state.db, post_id)
        .await
        .map_err(feed_error_response)?;
    let posts_count = posts::count_by_author(&state.db, view.author.id)
        .await
        .map_err(feed_error_response)?;
    let comments = comments::comments_for_post(&state.db, post_id)
        .await
        .map_err(feed_error_response)?;
    debug!("Post {} has {} comments", post_id, comments.len());

    let context = PostDetailContext {
        post_title: view.title(),
        post: PostDto::from(view),
        posts_count,
        comments: comments.into_iter().map(CommentDto::from).collect(),
        form: comment_form(),
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(context, "Post retrieved successfully")),
    ))
}

/// Empty form for a new post
#[utoipa::path(
    get,
    path = "/create/",
    tag = "posts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Post form", body = ApiResponse<PostFormContext>),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn post_create_form(
    State(state): State<AppState>,
    _user: AuthUser,
) -> PageResult<PostFormContext> {
    trace!("Entering post_create_form function");

    let groups = groups::list_groups(&state.db)
        .await
        .map_err(feed_error_response)?;

    let context = PostFormContext {
        form: post_form(&groups, None),
        is_edit: false,
        post: None,
    };

    Ok((StatusCode::OK, Json(ApiResponse::ok(context, "New post form"))))
}

/// Publish a new post
#[utoipa::path(
    post,
    path = "/create/",
    tag = "posts",
    security(("bearer_auth" = [])),
    request_body = PostForm,
    responses(
        (status = 302, description = "Post created, redirect to the author profile"),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(form))]
pub async fn post_create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<PostForm>,
) -> Result<Response, HandlerError> {
    trace!("Entering post_create function");
    form.validate().map_err(invalid_form)?;

    let image = store_image(&state, form.image.as_ref()).await?;
    let new_post = NewPost {
        text: form.text,
        group_id: form.group,
        image: image.clone(),
    };

    match posts::create_post(&state.db, user.id, new_post).await {
        Ok(created) => {
            info!("Post {} published by {}", created.id, user.username);
            Ok(found(profile_url(&user.username)))
        }
        Err(e) => {
            discard_image(&state, image.as_ref()).await;
            Err(feed_error_response(e))
        }
    }
}

/// Form for editing an existing post
#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit/",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post form with current values", body = ApiResponse<PostFormContext>),
        (status = 302, description = "Not the author or not logged in"),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn post_edit_form(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i32>,
) -> Result<Response, HandlerError> {
    trace!("Entering post_edit_form function");

    let view = posts::find_post_view(&state.db, post_id)
        .await
        .map_err(feed_error_response)?;
    if view.post.author_id != user.id {
        debug!("User {} is not the author of post {}", user.id, post_id);
        return Ok(found(post_detail_url(post_id)));
    }

    let groups = groups::list_groups(&state.db)
        .await
        .map_err(feed_error_response)?;

    let context = PostFormContext {
        form: post_form(&groups, Some(&view.post)),
        is_edit: true,
        post: Some(PostDto::from(view)),
    };

    Ok((StatusCode::OK, Json(ApiResponse::ok(context, "Edit post form"))).into_response())
}

/// Save changes to a post
#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit/",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body = PostForm,
    responses(
        (status = 302, description = "Saved, or not the author; redirect to the post"),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
#[instrument(skip(form))]
pub async fn post_edit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i32>,
    Json(form): Json<PostForm>,
) -> Result<Response, HandlerError> {
    trace!("Entering post_edit function");

    let post = posts::find_post(&state.db, post_id)
        .await
        .map_err(feed_error_response)?;
    if post.author_id != user.id {
        warn!("User {} tried to edit post {} of another author", user.id, post_id);
        return Ok(found(post_detail_url(post_id)));
    }

    form.validate().map_err(invalid_form)?;
    let image = store_image(&state, form.image.as_ref()).await?;
    let changes = PostChanges {
        text: form.text,
        group_id: form.group,
        image: image.clone(),
    };

    match posts::update_post(&state.db, post, changes).await {
        Ok(updated) => {
            info!("Post {} edited by {}", updated.id, user.username);
            Ok(found(post_detail_url(post_id)))
        }
        Err(e) => {
            discard_image(&state, image.as_ref()).await;
            Err(feed_error_response(e))
        }
    }
}
