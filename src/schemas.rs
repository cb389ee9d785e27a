use crate::config::Settings;
use crate::handlers::{
    auth::{LoginPage, LoginRequest, SignupRequest, TokenResponse},
    comments::CommentForm,
    follows::FollowContext,
    groups::GroupContext,
    posts::{IndexContext, PostDetailContext, PostForm, PostFormContext},
    profiles::ProfileContext,
};
use crate::media::ImageUpload;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use common::{
    ApiResponse, AuthorDto, Choice, CommentDto, FieldKind, FormDescriptor, FormField, GroupDto,
    Page, PostDto,
};
use feed::FeedError;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::Validate;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache of rendered pages
    pub cache: Cache<String, CachedData>,
    pub settings: Arc<Settings>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    IndexPage(IndexContext),
}

/// Query parameters of every paginated page
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct PageQuery {
    /// 1-based page number; anything that is not a number shows the first page
    #[validate(length(max = 32))]
    pub page: Option<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Error half of every handler result
pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub type PageResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), HandlerError>;

/// Map a domain error onto its HTTP response.
pub fn feed_error_response(err: FeedError) -> HandlerError {
    match err {
        FeedError::NotFound { entity, key } => {
            warn!("{} '{}' not found", entity, key);
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("{} '{}' not found", entity, key),
                    format!("{}_NOT_FOUND", entity.to_uppercase()),
                )),
            )
        }
        FeedError::Validation { field, message } => {
            warn!("Form rejected, field '{}': {}", field, message);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    format!("{}: {}", field, message),
                    "INVALID_FORM",
                )),
            )
        }
        FeedError::Database(db_error) => {
            error!("Database error: {}", db_error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Internal server error",
                    "DATABASE_ERROR",
                )),
            )
        }
    }
}

/// Reject a form whose derived validation failed.
pub fn invalid_form(errors: validator::ValidationErrors) -> HandlerError {
    warn!("Form rejected: {}", errors);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(errors.to_string(), "INVALID_FORM")),
    )
}

/// `302 Found` pointing at `location`.
pub fn found(location: impl AsRef<str>) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.as_ref().to_string())],
    )
        .into_response()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn post_detail_url(post_id: i32) -> String {
    format!("/posts/{}/", post_id)
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::signup,
        crate::handlers::auth::login_page,
        crate::handlers::auth::login,
        crate::handlers::posts::index,
        crate::handlers::posts::post_detail,
        crate::handlers::posts::post_create_form,
        crate::handlers::posts::post_create,
        crate::handlers::posts::post_edit_form,
        crate::handlers::posts::post_edit,
        crate::handlers::groups::group_posts,
        crate::handlers::groups::list_groups,
        crate::handlers::profiles::profile,
        crate::handlers::profiles::profile_follow,
        crate::handlers::profiles::profile_unfollow,
        crate::handlers::comments::add_comment,
        crate::handlers::follows::follow_index,
    ),
    components(
        schemas(
            ApiResponse<IndexContext>,
            ApiResponse<TokenResponse>,
            ErrorResponse,
            HealthResponse,
            IndexContext,
            GroupContext,
            ProfileContext,
            PostDetailContext,
            PostFormContext,
            FollowContext,
            LoginPage,
            PostForm,
            CommentForm,
            SignupRequest,
            LoginRequest,
            TokenResponse,
            ImageUpload,
            Page<PostDto>,
            PostDto,
            GroupDto,
            AuthorDto,
            CommentDto,
            FormDescriptor,
            FormField,
            FieldKind,
            Choice,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Sign up and token issuing"),
        (name = "posts", description = "Post feeds, details and authoring"),
        (name = "groups", description = "Group pages"),
        (name = "profiles", description = "Author profiles and subscriptions"),
        (name = "comments", description = "Comments on posts"),
    ),
    info(
        title = "Yatube API",
        description = "Yatube - a small blogging platform with groups, comments and subscriptions",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token issued by /auth/login/"))
                        .build(),
                ),
            )
        }
    }
}
