//! Authentication data models

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

/// User database model
#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Empty for accounts created through an OAuth provider
    pub password_hash: String,
    pub registered_at: String,
    pub city: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub sign: Option<String>,
    pub session_token: Option<String>,
    pub session_expiry: Option<String>,
}

/// Fields required to register a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub birth_date: Option<String>,
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// `POST /signup` form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub date_of_birth: String,
}

/// `POST /signin` form; `user` accepts a name or an email
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

/// Identity of the signed-in user for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub is_admin: bool,
}

/// Request-scoped authorization context attached by the session middleware
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub user: Option<SessionUser>,
}

impl AuthContext {
    pub fn guest() -> Self {
        Self { user: None }
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().map_or(false, |u| u.is_admin)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }
}
