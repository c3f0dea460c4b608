// src/services/users.rs
//! Persistence for user records and their single active session.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::models::{NewUser, User};
use crate::common::safe_email_log;
use crate::services::tokens::format_timestamp;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("name is already taken")]
    NameTaken,

    #[error("email is already registered")]
    EmailTaken,

    #[error("user {0} not found")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

const USER_COLUMNS: &str = "id, name, email, password_hash, registered_at, city, birth_date, \
                            gender, sign, session_token, session_expiry";

#[derive(Debug, Clone)]
pub struct UserStore {
    db: SqlitePool,
}

impl UserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Inserts a user and returns its id. Name and email collisions are
    /// reported separately so callers can react to each.
    pub async fn create(&self, new_user: &NewUser) -> Result<i64, StoreError> {
        let email = normalize_email(&new_user.email);
        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, registered_at, birth_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_user.name)
        .bind(&email)
        .bind(&new_user.password_hash)
        .bind(format_timestamp(Utc::now()))
        .bind(new_user.birth_date.as_deref())
        .execute(&self.db)
        .await
        .map_err(map_insert_error)?;

        let id = result.last_insert_rowid();
        info!(user_id = id, name = %new_user.name, email = %safe_email_log(&email), "User registered");
        Ok(id)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE name = ?",
            USER_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE session_token = ?",
            USER_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Overwrites token and expiry together in a single statement.
    pub async fn set_session(&self, id: i64, token: &str, expiry: &str) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE users SET session_token = ?, session_expiry = ? WHERE id = ?")
                .bind(token)
                .bind(expiry)
                .bind(id)
                .execute(&self.db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!(user_id = id, "Session stored");
        Ok(())
    }

    /// Moves the expiry of the session identified by `token`. Returns false
    /// when the token is no longer the user's active one.
    pub async fn update_session_expiry(
        &self,
        id: i64,
        token: &str,
        expiry: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET session_expiry = ? WHERE id = ? AND session_token = ?",
        )
        .bind(expiry)
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn clear_session(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET session_token = NULL, session_expiry = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        debug!(user_id = id, "Session cleared");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            if message.contains("users.name") {
                return StoreError::NameTaken;
            }
            if message.contains("users.email") {
                return StoreError::EmailTaken;
            }
        }
    }
    StoreError::Database(e)
}
