// src/oauth/identity.rs
//! Maps a verified provider profile onto a local account.

use thiserror::Error;
use tracing::{info, warn};

use super::profile::{display_name, ProviderProfile};
use crate::auth::models::{NewUser, User};
use crate::common::safe_email_log;
use crate::services::users::{StoreError, UserStore};

/// Upper bound on `name1`, `name2`, ... attempts before giving up.
pub const MAX_NAME_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user store: {0}")]
    Store(#[from] StoreError),

    #[error("no free display name derived from '{0}'")]
    NamesExhausted(String),

    #[error("account for {0} disappeared during sign-in")]
    Vanished(String),
}

/// Returns the account owning `profile.email`, creating one if needed.
///
/// Creation is attempted first and an email collision falls back to a
/// lookup, so two concurrent first sign-ins for the same address both end
/// up on the same row.
pub async fn resolve_identity(
    users: &UserStore,
    profile: &ProviderProfile,
) -> Result<User, IdentityError> {
    if let Some(existing) = users.find_by_email(&profile.email).await? {
        info!(user_id = existing.id, "OAuth sign-in for existing account");
        return Ok(existing);
    }

    let base = display_name(profile);
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = if attempt == 0 {
            base.clone()
        } else {
            format!("{}{}", base, attempt)
        };

        let new_user = NewUser {
            name: candidate,
            email: profile.email.clone(),
            password_hash: String::new(),
            birth_date: None,
        };

        match users.create(&new_user).await {
            Ok(id) => {
                info!(
                    user_id = id,
                    email = %safe_email_log(&profile.email),
                    "Account created from OAuth profile"
                );
                return users
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| IdentityError::Vanished(safe_email_log(&profile.email)));
            }
            Err(StoreError::NameTaken) => continue,
            Err(StoreError::EmailTaken) => {
                return users
                    .find_by_email(&profile.email)
                    .await?
                    .ok_or_else(|| IdentityError::Vanished(safe_email_log(&profile.email)));
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!(base = %base, "Display name suffixes exhausted");
    Err(IdentityError::NamesExhausted(base))
}
