// src/services/sessions.rs
//! Session issuance, validation and sliding renewal on top of the user store.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::tokens::{format_timestamp, parse_timestamp, TokenError, TokenManager};
use super::users::{StoreError, UserStore};
use crate::auth::models::{Session, User};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token manager: {0}")]
    Token(#[from] TokenError),

    #[error("user store: {0}")]
    Store(#[from] StoreError),

    #[error("session was replaced or cleared")]
    Superseded,
}

#[derive(Debug, Clone)]
pub struct SessionService {
    users: Arc<UserStore>,
    tokens: TokenManager,
}

impl SessionService {
    pub fn new(users: Arc<UserStore>, tokens: TokenManager) -> Self {
        Self { users, tokens }
    }

    /// Issues a new token for the user, replacing any previous one.
    pub async fn new_session(&self, user_id: i64) -> Result<Session, SessionError> {
        self.new_session_at(user_id, Utc::now()).await
    }

    pub async fn new_session_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let token = self.tokens.new_token()?;
        let expires_at = self.tokens.compute_expiry(now);
        self.users
            .set_session(user_id, &token, &format_timestamp(expires_at))
            .await?;
        info!(user_id = user_id, "Session issued");
        Ok(Session { token, expires_at })
    }

    /// True when `presented` is the user's current token and it has not
    /// expired at `now`.
    pub fn check_session(
        &self,
        user: &User,
        presented: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionError> {
        let (Some(stored), Some(expiry)) = (&user.session_token, &user.session_expiry) else {
            return Ok(false);
        };
        if stored != presented {
            debug!(user_id = user.id, "Presented token does not match stored session");
            return Ok(false);
        }
        Ok(!self.tokens.is_expired(expiry, now)?)
    }

    /// Slides the expiry of `user`'s current session forward from `now`.
    /// The stored value always moves strictly later than it was.
    pub async fn update_session(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, SessionError> {
        let (Some(token), Some(previous)) = (&user.session_token, &user.session_expiry) else {
            return Err(SessionError::Superseded);
        };
        let previous = parse_timestamp(previous)?;
        let mut next = self.tokens.compute_expiry(now);
        if next <= previous {
            next = previous + Duration::seconds(1);
        }

        if !self
            .users
            .update_session_expiry(user.id, token, &format_timestamp(next))
            .await?
        {
            return Err(SessionError::Superseded);
        }
        Ok(next)
    }

    pub async fn end_session(&self, user_id: i64) -> Result<(), SessionError> {
        self.users.clear_session(user_id).await?;
        info!(user_id = user_id, "Session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::NewUser;
    use crate::common::testing::setup_test_db;

    async fn setup() -> (SessionService, Arc<UserStore>, i64) {
        let users = Arc::new(UserStore::new(setup_test_db().await));
        let id = users
            .create(&NewUser {
                name: "erin".to_string(),
                email: "erin@example.com".to_string(),
                password_hash: String::new(),
                birth_date: None,
            })
            .await
            .unwrap();
        let service = SessionService::new(users.clone(), TokenManager::new(Duration::minutes(30)));
        (service, users, id)
    }

    #[tokio::test]
    async fn test_session_roundtrip_and_expiry() {
        let (service, users, id) = setup().await;
        let now = Utc::now();
        let session = service.new_session_at(id, now).await.unwrap();
        assert!(session.expires_at <= now + Duration::minutes(30));
        assert!(session.expires_at > now + Duration::minutes(29));

        let user = users.find_by_token(&session.token).await.unwrap().unwrap();
        assert!(service.check_session(&user, &session.token, now).unwrap());
        assert!(service
            .check_session(&user, &session.token, now + Duration::minutes(29))
            .unwrap());
        assert!(!service
            .check_session(&user, &session.token, session.expires_at)
            .unwrap());
        assert!(!service
            .check_session(&user, &session.token, now + Duration::hours(1))
            .unwrap());
    }

    #[tokio::test]
    async fn test_update_session_moves_strictly_forward() {
        let (service, users, id) = setup().await;
        let now = Utc::now();
        let session = service.new_session_at(id, now).await.unwrap();

        let user = users.find_by_id(id).await.unwrap().unwrap();
        let later = service
            .update_session(&user, now + Duration::minutes(5))
            .await
            .unwrap();
        assert!(later > session.expires_at);

        // Same instant again: still strictly forward
        let user = users.find_by_id(id).await.unwrap().unwrap();
        let again = service
            .update_session(&user, now + Duration::minutes(5))
            .await
            .unwrap();
        assert!(again > later);

        let stored = users.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.session_expiry, Some(format_timestamp(again)));
    }

    #[tokio::test]
    async fn test_second_sign_in_invalidates_first_token() {
        let (service, users, id) = setup().await;
        let now = Utc::now();
        let first = service.new_session_at(id, now).await.unwrap();
        let second = service.new_session_at(id, now).await.unwrap();
        assert_ne!(first.token, second.token);

        let user = users.find_by_id(id).await.unwrap().unwrap();
        assert!(!service.check_session(&user, &first.token, now).unwrap());
        assert!(service.check_session(&user, &second.token, now).unwrap());
        assert!(users.find_by_token(&first.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_after_replacement_is_superseded() {
        let (service, users, id) = setup().await;
        let now = Utc::now();
        service.new_session_at(id, now).await.unwrap();
        let stale = users.find_by_id(id).await.unwrap().unwrap();
        service.new_session_at(id, now).await.unwrap();

        let err = service.update_session(&stale, now).await.unwrap_err();
        assert!(matches!(err, SessionError::Superseded));
    }

    #[tokio::test]
    async fn test_end_session_clears_both_fields() {
        let (service, users, id) = setup().await;
        let session = service.new_session(id).await.unwrap();
        service.end_session(id).await.unwrap();

        let user = users.find_by_id(id).await.unwrap().unwrap();
        assert!(user.session_token.is_none());
        assert!(user.session_expiry.is_none());
        assert!(!service
            .check_session(&user, &session.token, Utc::now())
            .unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_expiry_surfaces_error() {
        let (service, users, id) = setup().await;
        users.set_session(id, "tok", "garbage").await.unwrap();
        let user = users.find_by_id(id).await.unwrap().unwrap();
        let err = service.check_session(&user, "tok", Utc::now()).unwrap_err();
        assert!(matches!(err, SessionError::Token(TokenError::CorruptTimestamp { .. })));
    }
}
