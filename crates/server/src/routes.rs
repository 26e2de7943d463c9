pub mod auth;
pub mod categories;
pub mod items;
pub mod menus;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::validation::MAX_IMAGE_BASE64_LEN;

use crate::metrics::{encode_metrics, track_metrics};
use crate::openapi::ApiDoc;
use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> impl IntoResponse {
    encode_metrics()
}

/// Largest accepted JSON body: one maximal image plus the other fields.
pub const MAX_BODY_BYTES: usize = MAX_IMAGE_BASE64_LEN + 64 * 1024;

/// Build the full application router: public, session-protected and docs routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    // Public routes (health, metrics, sign-in)
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/auth/signin/google", get(auth::signin_google))
        .route("/auth/callback/google", get(auth::callback_google))
        .route("/auth/callback/credentials", post(auth::callback_credentials))
        .route("/auth/signout", post(auth::signout));

    // Session-protected routes
    let protected = Router::new()
        .route("/auth/session", get(auth::session))
        .route("/api/menus", get(menus::list).post(menus::create))
        .route("/api/menus/:id", get(menus::get).put(menus::update).delete(menus::delete))
        // same param name as /api/menus/:id, the router rejects mixed names
        .route("/api/menus/:id/categories", get(categories::get_all))
        .route("/api/categories", post(categories::create))
        .route("/api/categories/positions", put(categories::update_position))
        .route("/api/categories/:id", put(categories::update).delete(categories::delete))
        .route("/api/items", post(items::create))
        .route("/api/items/positions", put(items::update_position))
        .route("/api/items/:id", put(items::update).delete(items::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    public
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
