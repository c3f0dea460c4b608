//! Authentication routes

use axum::{routing::get, Router};

use super::handlers;

/// Routes that work for guests
///
/// # Routes
/// - `GET|POST /signup` - Local registration
/// - `GET|POST /signin` - Password sign-in
pub fn public_auth_routes() -> Router {
    Router::new()
        .route("/signup", get(handlers::signup_page).post(handlers::signup))
        .route("/signin", get(handlers::signin_page).post(handlers::signin))
}

/// Routes that need a live session
///
/// # Routes
/// - `GET /signout` - End the session
/// - `GET /profile` - Current user information
pub fn protected_auth_routes() -> Router {
    Router::new()
        .route("/signout", get(handlers::signout))
        .route("/profile", get(handlers::profile))
}
