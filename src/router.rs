use crate::handlers::{
    auth::{login, login_page, signup},
    comments::add_comment,
    follows::follow_index,
    groups::{group_posts, list_groups},
    health::{health_check, page_not_found},
    posts::{index, post_create, post_create_form, post_detail, post_edit, post_edit_form},
    profiles::{profile, profile_follow, profile_unfollow},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.settings.media_root);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Feeds
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/groups/", get(list_groups))
        .route("/profile/:username/", get(profile))
        .route("/follow/", get(follow_index))
        // Posts
        .route("/posts/:post_id/", get(post_detail))
        .route("/create/", get(post_create_form).post(post_create))
        .route("/posts/:post_id/edit/", get(post_edit_form).post(post_edit))
        .route("/posts/:post_id/comment/", post(add_comment))
        // Subscriptions
        .route("/profile/:username/follow/", get(profile_follow))
        .route("/profile/:username/unfollow/", get(profile_unfollow))
        // Authentication
        .route("/auth/signup/", post(signup))
        .route("/auth/login/", get(login_page).post(login))
        // Uploaded images
        .nest_service("/media", media)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(page_not_found)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
