// src/common/config.rs
//! Runtime configuration loaded from the environment

use chrono::Duration;
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Provider client credentials, read from `{PROVIDER}_CLIENT_ID` and
/// `{PROVIDER}_CLIENT_SECRET`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Public host name; also used as the session cookie domain
    pub host: String,
    pub port: u16,
    pub bind_addr: String,
    /// Base URL the browser reaches us on, used to build OAuth redirect URIs
    pub public_url: String,
    pub session_lifetime: Duration,
    pub session_cookie_name: String,
    pub oauth_http_timeout: std::time::Duration,
    pub oauth_state_ttl: Duration,
    pub request_timeout: std::time::Duration,
    pub reset_db: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = parse_env("APP_PORT", 8080u16);
        let public_url = env::var("PUBLIC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{}:{}", host, port));

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://forum.db".to_string()),
            host,
            port,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            public_url,
            session_lifetime: Duration::minutes(parse_env("SESSION_LIFETIME_MINUTES", 30i64)),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "session_token".to_string()),
            oauth_http_timeout: std::time::Duration::from_secs(parse_env(
                "OAUTH_HTTP_TIMEOUT_SECS",
                10u64,
            )),
            oauth_state_ttl: Duration::minutes(parse_env("OAUTH_STATE_TTL_MINUTES", 10i64)),
            request_timeout: std::time::Duration::from_secs(parse_env(
                "REQUEST_TIMEOUT_SECS",
                30u64,
            )),
            reset_db: env::var("RESET_DB")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                == "true",
        }
    }

    /// Reads `{PROVIDER}_CLIENT_ID` / `{PROVIDER}_CLIENT_SECRET`.
    /// Returns `None` unless both are present and non-empty.
    pub fn client_credentials(provider: &str) -> Option<ClientCredentials> {
        let prefix = provider.to_uppercase();
        let client_id = env::var(format!("{}_CLIENT_ID", prefix))
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        let client_secret = env::var(format!("{}_CLIENT_SECRET", prefix))
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        Some(ClientCredentials {
            client_id,
            client_secret,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            bind_addr: "127.0.0.1".to_string(),
            public_url: "http://localhost:8080".to_string(),
            session_lifetime: Duration::minutes(30),
            session_cookie_name: "session_token".to_string(),
            oauth_http_timeout: std::time::Duration::from_secs(5),
            oauth_state_ttl: Duration::minutes(10),
            request_timeout: std::time::Duration::from_secs(30),
            reset_db: false,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => value,
            _ => {
                warn!(key = %key, value = %raw, default = %default, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
