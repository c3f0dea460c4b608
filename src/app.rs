// src/app.rs
//! Router composition

use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info_span};

use crate::common::AppState;
use crate::{admin, auth, logging_middleware, oauth, posts, views};

pub fn build_router(state: AppState) -> Router {
    let providers = state.oauth.providers().names();
    let request_timeout = state.config.request_timeout;
    let shared = Arc::new(RwLock::new(state));

    // ========================================================================
    // SIGNED-IN ROUTES (401 without a live session)
    // ========================================================================
    let protected = Router::new()
        .merge(auth::protected_auth_routes())
        .merge(posts::protected_post_routes())
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn(auth::require_auth));

    // ========================================================================
    // BEST-EFFORT ROUTES (guests welcome)
    // ========================================================================
    let public = Router::new()
        .merge(auth::public_auth_routes())
        .merge(posts::public_post_routes())
        .route_layer(middleware::from_fn(auth::optional_auth));

    Router::new()
        .merge(protected)
        .merge(public)
        .merge(oauth::oauth_routes(&providers))
        .route("/health", get(health))
        .fallback(not_found)
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::map_response(render_bare_status))
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            // Path only: callback queries carry `code` and `state`
            info_span!("request", method = %request.method(), path = %request.uri().path())
        }))
}

/// GET /health - Liveness plus a database round trip
async fn health(Extension(state_lock): Extension<Arc<RwLock<AppState>>>) -> Response {
    let db = state_lock.read().await.db.clone();
    match sqlx::query("SELECT 1").execute(&db).await {
        Ok(_) => "ok".into_response(),
        Err(e) => {
            error!(error = %e, "Health check database query failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response()
        }
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, views::error_page(StatusCode::NOT_FOUND)).into_response()
}

/// Router-generated rejections (405, extractor 4xx) carry plain text or no
/// body at all; give them the same page as every other error.
async fn render_bare_status(response: Response) -> Response {
    let status = response.status();
    let is_html = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with("text/html"));

    if (status.is_client_error() || status.is_server_error()) && !is_html {
        return (status, views::error_page(status)).into_response();
    }
    response
}
