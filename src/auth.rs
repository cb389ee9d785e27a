//! Password hashing, access tokens and the authenticated-user extractor.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use model::entities::user;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::Settings;
use crate::schemas::{AppState, found};

/// Path anonymous visitors of protected pages are sent to.
pub const LOGIN_URL: &str = "/auth/login/";

/// Stored in place of a hash for users that cannot log in.
pub const UNUSABLE_PASSWORD: &str = "!";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a correct username and password.")]
    InvalidCredentials,
    #[error("Failed to hash password")]
    Hashing,
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims of an access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

/// Hash a password with Argon2id.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Hashing)
}

/// Check a password against a stored hash. Unusable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

pub fn issue_token(settings: &Settings, user: &user::Model) -> Result<String, AuthError> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        iat: now,
        exp: now + settings.token_ttl.as_secs() as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )?)
}

pub fn decode_token(settings: &Settings, token: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

/// Percent-encode a path for use as the `next` query value, leaving
/// the `/` separators readable.
fn encode_next(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Rejection of [`AuthUser`]: a redirect to the login page that comes
/// back to the requested path.
#[derive(Debug)]
pub struct LoginRedirect {
    pub next: String,
}

impl LoginRedirect {
    pub fn location(&self) -> String {
        format!("{}?next={}", LOGIN_URL, encode_next(&self.next))
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        found(self.location())
    }
}

/// The user a request is authenticated as.
///
/// Reads a `Bearer` token from the `Authorization` header and makes sure
/// the user still exists. Use `Option<AuthUser>` on pages anonymous
/// visitors may see.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let reject = || LoginRedirect { next: next.clone() };

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| {
                trace!("No bearer token on request to {}", next);
                reject()
            })?;

        let claims = decode_token(&state.settings, token).map_err(|e| {
            debug!("Rejecting access token: {}", e);
            reject()
        })?;

        let user_id: i32 = claims.sub.parse().map_err(|_| {
            warn!("Access token carries a malformed subject: {}", claims.sub);
            reject()
        })?;

        let user = feed::users::find_by_id(&state.db, user_id)
            .await
            .map_err(|e| {
                warn!("Token refers to an unavailable user {}: {}", user_id, e);
                reject()
            })?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
