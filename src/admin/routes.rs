// src/admin/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// Administrator pages; mounted behind `require_auth`.
pub fn admin_routes() -> Router {
    Router::new().route("/admin/users", get(handlers::users::list_users))
}
