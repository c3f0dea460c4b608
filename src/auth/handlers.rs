//! Authentication handlers

use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::cookies::{logout_cookie, session_cookie};
use super::extractors::CurrentUser;
use super::models::{AuthContext, NewUser, SignInForm, SignUpForm};
use super::validators::{SignInValidator, SignUpValidator};
use crate::common::{redirect_found, safe_email_log, ApiError, AppState, Validator};
use crate::services::users::{normalize_email, StoreError};
use crate::views::{self, PageContext};

const INVALID_CREDENTIALS: &str = "Invalid name or password";

/// GET /signup
pub async fn signup_page(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
) -> Html<String> {
    let providers = state_lock.read().await.oauth.providers().names();
    views::signup_page(
        &PageContext {
            auth: &auth,
            providers: &providers,
        },
        &SignUpForm::default(),
        None,
    )
}

/// POST /signup - Register a local account
pub async fn signup(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
    Form(form): Form<SignUpForm>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();
    let providers = state.oauth.providers().names();
    let ctx = PageContext {
        auth: &auth,
        providers: &providers,
    };

    let validation = SignUpValidator.validate(&form);
    if !validation.is_valid {
        let message = validation.first_message().unwrap_or("Invalid input");
        return Ok((
            StatusCode::BAD_REQUEST,
            views::signup_page(&ctx, &form, Some(message)),
        )
            .into_response());
    }

    let password_hash = state
        .passwords
        .hash(&form.password)
        .map_err(|e| ApiError::internal("password_hasher", e))?;

    let new_user = NewUser {
        name: form.user.trim().to_string(),
        email: normalize_email(&form.email),
        password_hash,
        birth_date: Some(form.date_of_birth.trim().to_string()),
    };

    let conflict = match state.users.create(&new_user).await {
        Ok(_) => return Ok(redirect_found("/signin")),
        Err(StoreError::NameTaken) => "Name is already taken",
        Err(StoreError::EmailTaken) => "Email is already registered",
        Err(e) => return Err(ApiError::internal("user_store", e)),
    };

    warn!(email = %safe_email_log(&new_user.email), reason = conflict, "Registration rejected");
    Ok((
        StatusCode::CONFLICT,
        views::signup_page(&ctx, &form, Some(conflict)),
    )
        .into_response())
}

/// GET /signin
pub async fn signin_page(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
) -> Html<String> {
    let providers = state_lock.read().await.oauth.providers().names();
    views::signin_page(
        &PageContext {
            auth: &auth,
            providers: &providers,
        },
        "",
        None,
    )
}

/// POST /signin - Password sign-in by name or email
pub async fn signin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();
    let providers = state.oauth.providers().names();
    let ctx = PageContext {
        auth: &auth,
        providers: &providers,
    };

    let validation = SignInValidator.validate(&form);
    if !validation.is_valid {
        let message = validation.first_message().unwrap_or("Invalid input");
        return Ok((
            StatusCode::BAD_REQUEST,
            views::signin_page(&ctx, &form.user, Some(message)),
        )
            .into_response());
    }

    let identifier = form.user.trim();
    let lookup = if identifier.contains('@') {
        state.users.find_by_email(&normalize_email(identifier)).await
    } else {
        state.users.find_by_name(identifier).await
    };
    let user = lookup.map_err(|e| ApiError::internal("user_store", e))?;

    // Unknown and provider-only accounts pay for a verification too
    let verified = state
        .passwords
        .verify_account(&form.password, user.as_ref().map(|u| u.password_hash.as_str()))
        .map_err(|e| ApiError::internal("password_hasher", e))?;

    let user = match user {
        Some(u) if verified => u,
        _ => {
            warn!("Sign-in rejected: invalid credentials");
            return Ok((
                StatusCode::UNAUTHORIZED,
                views::signin_page(&ctx, &form.user, Some(INVALID_CREDENTIALS)),
            )
                .into_response());
        }
    };

    let session = state
        .sessions
        .new_session(user.id)
        .await
        .map_err(|e| ApiError::internal("session_issue", e))?;

    info!(user_id = user.id, "User signed in");
    let jar = jar.add(session_cookie(&state.config, &session.token, session.expires_at));
    Ok((jar, redirect_found("/")).into_response())
}

/// GET /signout - End the session and expire the cookie
pub async fn signout(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    state
        .sessions
        .end_session(user.id)
        .await
        .map_err(|e| ApiError::internal("session_end", e))?;

    info!(user_id = user.id, "User signed out");
    let jar = jar.add(logout_cookie(&state.config));
    Ok((jar, redirect_found("/")).into_response())
}

/// GET /profile - The signed-in user's record
pub async fn profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, ApiError> {
    let state = state_lock.read().await.clone();
    let providers = state.oauth.providers().names();

    let record = state
        .users
        .find_by_id(user.id)
        .await
        .map_err(|e| ApiError::internal("user_store", e))?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", user.id)))?;

    Ok(views::profile_page(
        &PageContext {
            auth: &auth,
            providers: &providers,
        },
        &record,
    ))
}
