//! HTTP router assembly
//!
//! Wires the API handlers, the admin middleware, request tracing and the
//! static pages into one [`Router`].

use crate::api;
use crate::state::AppState;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::time::Instant;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Build the API routes
///
/// `/api/votes/create` is matched before `/api/votes/:id` because static
/// segments take priority over captures.
pub fn api_router(state: AppState) -> Router {
    let create = post(api::polls::create_poll)
        .route_layer(middleware::from_fn_with_state(state.clone(), api::auth::require_admin));

    Router::new()
        .route("/api/health", get(api::health::health_check))
        .route("/api/votes", get(api::polls::list_polls))
        .route("/api/votes/create", create)
        .route("/api/votes/:id", post(api::polls::submit_vote))
        .with_state(state)
}

/// Build the full application: API, static pages and middleware
pub fn app(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();

    api_router(state)
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/voting", ServeFile::new(static_dir.join("voting.html")))
        .fallback_service(ServeDir::new(static_dir))
        // Middleware (order matters - request_id should be first)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
}
