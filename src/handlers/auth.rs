use crate::auth::{AuthError, hash_password, issue_token, verify_password};
use crate::forms::login_form;
use crate::schemas::{
    AppState, ErrorResponse, HandlerError, PageResult, feed_error_response, invalid_form,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use common::{ApiResponse, AuthorDto, FormDescriptor};
use feed::users::{self, author_dto};
use feed::FeedError;
use model::entities::user;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for signing up
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct SignupRequest {
    /// Username (must be unique)
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password: String,
}

/// Request body for logging in
#[derive(Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub user: AuthorDto,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginQuery {
    /// Page to return to after logging in
    pub next: Option<String>,
}

/// Context of the login page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginPage {
    pub next: Option<String>,
    pub form: FormDescriptor,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn token_response(state: &AppState, user: user::Model) -> Result<TokenResponse, HandlerError> {
    match issue_token(&state.settings, &user) {
        Ok(token) => Ok(TokenResponse {
            token,
            user: author_dto(user),
        }),
        Err(e) => {
            error!("Failed to issue token for user {}: {}", user.id, e);
            Err(internal_error("Failed to issue access token"))
        }
    }
}

fn internal_error(message: &str) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message, "INTERNAL_ERROR")),
    )
}

fn invalid_credentials() -> HandlerError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(
            AuthError::InvalidCredentials.to_string(),
            "INVALID_CREDENTIALS",
        )),
    )
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/signup/",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid form or username taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> PageResult<TokenResponse> {
    trace!("Entering signup function");
    request.validate().map_err(invalid_form)?;
    users::validate_username(&request.username).map_err(feed_error_response)?;

    let password = request.password;
    let password_hash = match tokio::task::spawn_blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            error!("Failed to hash password: {}", e);
            return Err(internal_error("Failed to create user"));
        }
        Err(e) => {
            error!("Password hashing task failed: {}", e);
            return Err(internal_error("Failed to create user"));
        }
    };

    let created = users::create_user(&state.db, &request.username, password_hash)
        .await
        .map_err(feed_error_response)?;
    info!("User signed up with ID: {}, username: {}", created.id, created.username);

    let response = token_response(&state, created)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(response, "User created successfully")),
    ))
}

/// Login page description
#[utoipa::path(
    get,
    path = "/auth/login/",
    tag = "auth",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login form", body = ApiResponse<LoginPage>)
    )
)]
#[instrument]
pub async fn login_page(Query(query): Query<LoginQuery>) -> PageResult<LoginPage> {
    trace!("Entering login_page function");

    let context = LoginPage {
        next: query.next,
        form: login_form(),
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(context, "Login form"))))
}

/// Exchange username and password for an access token
#[utoipa::path(
    post,
    path = "/auth/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Wrong username or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> PageResult<TokenResponse> {
    trace!("Entering login function");

    let user = match users::find_by_username(&state.db, &request.username).await {
        Ok(user) => user,
        Err(FeedError::NotFound { .. }) => {
            warn!("Login attempt for unknown user '{}'", request.username);
            return Err(invalid_credentials());
        }
        Err(e) => return Err(feed_error_response(e)),
    };

    let password = request.password;
    let hash = user.password_hash.clone();
    match tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await {
        Ok(Ok(())) => debug!("Password verified for user {}", user.id),
        Ok(Err(_)) => {
            warn!("Wrong password for user '{}'", user.username);
            return Err(invalid_credentials());
        }
        Err(e) => {
            error!("Password verification task failed: {}", e);
            return Err(internal_error("Failed to log in"));
        }
    }

    info!("User {} logged in", user.username);
    let response = token_response(&state, user)?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(response, "Logged in successfully")),
    ))
}
