// src/auth/cookies.rs
//! Session cookie construction and lookup.

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use tracing::warn;

use crate::common::AppConfig;

/// HttpOnly, SameSite=Lax cookie carrying the session token until `expires_at`.
pub fn session_cookie(
    config: &AppConfig,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Cookie<'static> {
    let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()).unwrap_or_else(|_| {
        warn!(
            timestamp = expires_at.timestamp(),
            "Session expiry out of cookie range; falling back to lifetime from now"
        );
        OffsetDateTime::now_utc()
            + time::Duration::seconds(config.session_lifetime.num_seconds())
    });

    Cookie::build((config.session_cookie_name.clone(), token.to_string()))
        .domain(config.host.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .expires(expires)
        .build()
}

/// Expired, empty cookie that makes the browser drop the session.
pub fn logout_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), String::new()))
        .domain(config.host.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

pub fn session_token(jar: &CookieJar, config: &AppConfig) -> Option<String> {
    jar.get(&config.session_cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Whether a response already sets the named cookie.
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    let prefix = format!("{}=", name);
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}
