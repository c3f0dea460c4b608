//! OAuth sign-in handlers

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::flow::{CallbackParams, OAuthError};
use super::identity::resolve_identity;
use crate::auth::cookies::session_cookie;
use crate::common::{redirect_found, ApiError, AppState};

/// GET /oauth2_signin/:provider - Start the authorization-code flow
pub async fn oauth_signin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(provider): Path<String>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    match state.oauth.start(&provider).await {
        Ok(url) => Ok(Redirect::temporary(&url).into_response()),
        Err(OAuthError::UnknownProvider(name)) => {
            Err(ApiError::NotFound(format!("oauth provider '{}'", name)))
        }
        Err(e) => {
            error!(provider = %provider, error = %e, "Cannot start OAuth flow");
            Err(ApiError::internal("oauth_registry", e))
        }
    }
}

/// GET /oauth2_callback_{provider} - Finish the flow
///
/// Anything the provider or the browser got wrong sends the user back to
/// `/`. Failures on our side after a verified profile answer 500.
pub async fn oauth_callback(
    provider: String,
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let profile = match state.oauth.complete(&provider, &params).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(provider = %provider, error = %e, "OAuth callback rejected");
            return Ok(Redirect::temporary("/").into_response());
        }
    };

    let user = resolve_identity(&state.users, &profile)
        .await
        .map_err(|e| ApiError::internal("oauth_identity", e))?;

    let session = state
        .sessions
        .new_session(user.id)
        .await
        .map_err(|e| ApiError::internal("session_issue", e))?;

    info!(provider = %provider, user_id = user.id, "OAuth sign-in complete");
    let jar = jar.add(session_cookie(&state.config, &session.token, session.expires_at));
    Ok((jar, redirect_found("/")).into_response())
}
