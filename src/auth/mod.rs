//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Local sign-up and password sign-in
//! - Session cookies and the session middleware
//! - Typed request identity (`AuthContext`, `CurrentUser`)

pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod roles;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::CurrentUser;
pub use middleware::{optional_auth, require_auth};
pub use models::AuthContext;
pub use routes::{protected_auth_routes, public_auth_routes};
