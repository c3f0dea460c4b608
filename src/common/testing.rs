// Shared fixtures for unit and router tests

use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use super::{migrations::run_migrations, AppConfig, AppState};
use crate::app::build_router;
use crate::auth::models::NewUser;
use crate::oauth::providers::{ProviderConfig, ProviderRegistry};
use crate::services::PasswordHasher;

/// In-memory database with the real schema. One connection, so every query
/// sees the same memory database.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool, false).await.unwrap();
    pool
}

/// All three providers registered without credentials.
pub fn unconfigured_providers(config: &AppConfig) -> ProviderRegistry {
    ProviderRegistry::new([
        ProviderConfig::google(&config.public_url, None),
        ProviderConfig::github(&config.public_url, None),
        ProviderConfig::mailru(&config.public_url, None),
    ])
}

pub async fn test_state_with(providers: ProviderRegistry) -> AppState {
    test_state_with_config(AppConfig::for_tests(), providers).await
}

pub async fn test_state_with_config(config: AppConfig, providers: ProviderRegistry) -> AppState {
    AppState::new(setup_test_db().await, config, providers).unwrap()
}

pub async fn test_state() -> AppState {
    let config = AppConfig::for_tests();
    test_state_with(unconfigured_providers(&config)).await
}

pub fn test_router(state: &AppState) -> Router {
    build_router(state.clone())
}

/// Registers a password account and returns its id.
pub async fn create_user(state: &AppState, name: &str, password: &str) -> i64 {
    let password_hash = PasswordHasher::new().hash(password).unwrap();
    state
        .users
        .create(&NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash,
            birth_date: Some("1990-01-01".to_string()),
        })
        .await
        .unwrap()
}

/// Registers an account and signs it in; returns `(id, session token)`.
pub async fn signed_in_user(state: &AppState, name: &str) -> (i64, String) {
    let id = create_user(state, name, "password123").await;
    let session = state.sessions.new_session(id).await.unwrap();
    (id, session.token)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session_token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session_token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Value of the session cookie set by `response`, if any.
pub fn set_session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("session_token="))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
