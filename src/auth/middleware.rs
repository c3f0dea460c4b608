// src/auth/middleware.rs
//! Session middleware.
//!
//! `require_auth` rejects requests without a live session; `optional_auth`
//! lets them through as guests. Both attach an [`AuthContext`] to the request
//! and, on success, slide the session expiry and re-issue the cookie.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::cookies::{session_cookie, session_token, sets_cookie};
use super::models::{AuthContext, SessionUser};
use super::roles;
use crate::common::{safe_token_log, ApiError, AppState};
use crate::services::sessions::SessionError;
use crate::services::tokens::looks_like_token;

struct ActiveSession {
    user: SessionUser,
    token: String,
    expires_at: DateTime<Utc>,
}

async fn resolve_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<ActiveSession>, SessionError> {
    let Some(token) = session_token(jar, &state.config) else {
        return Ok(None);
    };
    if !looks_like_token(&token) {
        debug!(token = %safe_token_log(&token), "Ignoring malformed session cookie");
        return Ok(None);
    }

    let Some(user) = state.users.find_by_token(&token).await? else {
        debug!(token = %safe_token_log(&token), "No account holds this session token");
        return Ok(None);
    };

    let now = Utc::now();
    if !state.sessions.check_session(&user, &token, now)? {
        debug!(user_id = user.id, "Session expired");
        return Ok(None);
    }

    let expires_at = match state.sessions.update_session(&user, now).await {
        Ok(expires_at) => expires_at,
        // Signed in elsewhere or signed out between lookup and update
        Err(SessionError::Superseded) => return Ok(None),
        Err(e) => return Err(e),
    };

    Ok(Some(ActiveSession {
        user: SessionUser {
            id: user.id,
            is_admin: roles::is_admin(user.id),
            name: user.name,
        },
        token,
        expires_at,
    }))
}

/// Runs the handler with `session` attached, then refreshes the cookie
/// unless the handler already set or cleared it.
async fn run_signed_in(
    state: &AppState,
    jar: CookieJar,
    session: ActiveSession,
    mut request: Request,
    next: Next,
) -> Response {
    request
        .extensions_mut()
        .insert(AuthContext::signed_in(session.user));
    let response = next.run(request).await;

    if sets_cookie(response.headers(), &state.config.session_cookie_name) {
        return response;
    }
    let jar = jar.add(session_cookie(
        &state.config,
        &session.token,
        session.expires_at,
    ));
    (jar, response).into_response()
}

pub async fn require_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let state = state_lock.read().await.clone();

    match resolve_session(&state, &jar).await {
        Ok(Some(session)) => run_signed_in(&state, jar, session, request, next).await,
        Ok(None) => ApiError::Unauthorized("no valid session".to_string()).into_response(),
        Err(e) => {
            error!(error = %e, path = %request.uri().path(), "Session lookup failed");
            ApiError::internal("session_middleware", e).into_response()
        }
    }
}

pub async fn optional_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let state = state_lock.read().await.clone();

    match resolve_session(&state, &jar).await {
        Ok(Some(session)) => run_signed_in(&state, jar, session, request, next).await,
        Ok(None) => {
            request.extensions_mut().insert(AuthContext::guest());
            next.run(request).await
        }
        Err(e) => {
            error!(error = %e, path = %request.uri().path(), "Session lookup failed; continuing as guest");
            request.extensions_mut().insert(AuthContext::guest());
            next.run(request).await
        }
    }
}
