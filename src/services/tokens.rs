// src/services/tokens.rs
//! Session token generation and expiry arithmetic.
//!
//! Everything here is a pure function of its inputs plus the configured
//! session lifetime, so a `TokenManager` can be shared freely across tasks.

use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("entropy source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    #[error("corrupt session timestamp '{value}': {source}")]
    CorruptTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Clone)]
pub struct TokenManager {
    lifetime: Duration,
}

impl TokenManager {
    pub fn new(lifetime: Duration) -> Self {
        Self { lifetime }
    }

    /// Random v4 UUID drawn straight from the OS entropy source.
    pub fn new_token(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string())
    }

    /// `now + lifetime`, truncated to the microsecond precision we persist.
    pub fn compute_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let expiry = now + self.lifetime;
        expiry
            .duration_trunc(Duration::microseconds(1))
            .unwrap_or(expiry)
    }

    /// Compares a persisted RFC 3339 expiry against `now`.
    pub fn is_expired(&self, expiry: &str, now: DateTime<Utc>) -> Result<bool, TokenError> {
        Ok(parse_timestamp(expiry)? <= now)
    }
}

/// Parses a timestamp as written by [`format_timestamp`].
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TokenError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| TokenError::CorruptTimestamp {
            value: value.to_string(),
            source,
        })
}

/// Canonical storage format for every timestamp column.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Tokens coming from cookies are only looked up if they have UUID shape.
pub fn looks_like_token(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}
