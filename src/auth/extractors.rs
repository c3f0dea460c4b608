//! Authentication extractors for Axum
//!
//! Both read the [`AuthContext`] the session middleware attached; neither
//! touches storage.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{error, warn};

use super::models::{AuthContext, SessionUser};
use crate::common::ApiError;

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthContext>().cloned().ok_or_else(|| {
            error!(path = %parts.uri.path(), "Route is not behind the session middleware");
            ApiError::InternalServer("session middleware not installed".to_string())
        })
    }
}

/// Signed-in user extractor; rejects guests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = AuthContext::from_request_parts(parts, state).await?;
        match context.user {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                warn!(path = %parts.uri.path(), "Guest reached a signed-in route");
                Err(ApiError::Unauthorized("sign-in required".to_string()))
            }
        }
    }
}
