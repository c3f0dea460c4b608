// src/services/password.rs
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("argon2 hash error: {0}")]
    Hash(String),

    #[error("stored hash is malformed: {0}")]
    MalformedHash(String),
}

/// One-way adaptive hashing for local accounts (Argon2id, default params).
#[derive(Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Verified against when there is no real hash, so misses cost the same
    dummy_hash: OnceLock<String>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::Hash(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// An empty stored hash (OAuth-only account) never verifies.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        if hash.is_empty() {
            return Ok(false);
        }
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PasswordError::MalformedHash(e.to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Like [`verify`](Self::verify), but an absent or empty hash still runs
    /// one full verification against a throwaway hash before answering false.
    pub fn verify_account(&self, plain: &str, hash: Option<&str>) -> Result<bool, PasswordError> {
        match hash.filter(|h| !h.is_empty()) {
            Some(hash) => self.verify(plain, hash),
            None => {
                let dummy = self
                    .dummy_hash
                    .get_or_init(|| self.hash("placeholder-password").unwrap_or_default());
                if !dummy.is_empty() {
                    let _ = self.verify(plain, dummy);
                }
                Ok(false)
            }
        }
    }
}
