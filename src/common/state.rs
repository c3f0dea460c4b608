// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::config::AppConfig;
use crate::oauth::{OAuthFlow, ProviderRegistry, StateStore};
use crate::posts::ForumService;
use crate::services::{PasswordHasher, SessionService, TokenManager, UserStore};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub users: Arc<UserStore>,
    pub sessions: Arc<SessionService>,
    pub passwords: Arc<PasswordHasher>,
    pub forum: Arc<ForumService>,
    pub oauth: Arc<OAuthFlow>,
}

impl AppState {
    /// Wires every service onto one pool. The HTTP client used for provider
    /// calls gets the configured outbound timeout.
    pub fn new(
        db: SqlitePool,
        config: AppConfig,
        providers: ProviderRegistry,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.oauth_http_timeout)
            .build()?;

        let users = Arc::new(UserStore::new(db.clone()));
        let sessions = Arc::new(SessionService::new(
            users.clone(),
            TokenManager::new(config.session_lifetime),
        ));
        let oauth = Arc::new(OAuthFlow::new(
            http,
            providers,
            StateStore::new(config.oauth_state_ttl),
        ));

        Ok(Self {
            forum: Arc::new(ForumService::new(db.clone())),
            passwords: Arc::new(PasswordHasher::new()),
            config: Arc::new(config),
            db,
            users,
            sessions,
            oauth,
        })
    }
}
