// src/posts/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Readable by guests; mounted behind `optional_auth`.
pub fn public_post_routes() -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/posts/:id", get(handlers::show_post))
}

/// Mounted behind `require_auth`.
pub fn protected_post_routes() -> Router {
    Router::new()
        .route("/posts/new", get(handlers::new_post_page))
        .route("/posts", post(handlers::create_post))
        .route("/posts/:id/comments", post(handlers::create_comment))
        .route("/posts/:id/react", post(handlers::react_to_post))
        .route("/posts/:id/delete", post(handlers::delete_post))
        .route("/comments/:id/react", post(handlers::react_to_comment))
}
