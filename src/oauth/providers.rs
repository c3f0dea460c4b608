// src/oauth/providers.rs
//! Static per-provider OAuth2 configuration.
//!
//! Adding a provider means adding one entry to [`ProviderRegistry::from_env`];
//! the flow itself is driven entirely by these values.

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::common::{AppConfig, ClientCredentials};

/// How the access token is presented to the user-info endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPlacement {
    BearerHeader,
    QueryParam,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub authorize_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub scope: String,
    pub redirect_uri: String,
    pub token_placement: TokenPlacement,
    pub credentials: Option<ClientCredentials>,
}

impl ProviderConfig {
    pub fn google(public_url: &str, credentials: Option<ClientCredentials>) -> Self {
        Self {
            name: "google".to_string(),
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            user_info_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            scope: "openid email profile".to_string(),
            redirect_uri: callback_uri(public_url, "google"),
            token_placement: TokenPlacement::BearerHeader,
            credentials,
        }
    }

    /// The user-info endpoint here is `/user/emails`, which answers with an
    /// array of addresses rather than a single profile object.
    pub fn github(public_url: &str, credentials: Option<ClientCredentials>) -> Self {
        Self {
            name: "github".to_string(),
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            user_info_url: "https://api.github.com/user/emails".to_string(),
            scope: "user:email".to_string(),
            redirect_uri: callback_uri(public_url, "github"),
            token_placement: TokenPlacement::BearerHeader,
            credentials,
        }
    }

    pub fn mailru(public_url: &str, credentials: Option<ClientCredentials>) -> Self {
        Self {
            name: "mailru".to_string(),
            authorize_url: "https://oauth.mail.ru/login".to_string(),
            token_url: "https://oauth.mail.ru/token".to_string(),
            user_info_url: "https://oauth.mail.ru/userinfo".to_string(),
            scope: "userinfo".to_string(),
            redirect_uri: callback_uri(public_url, "mailru"),
            token_placement: TokenPlacement::QueryParam,
            credentials,
        }
    }

    /// Builds the browser redirect for the authorization step.
    pub fn authorization_url(&self, client_id: &str, state: &str) -> String {
        let separator = if self.authorize_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.authorize_url,
            separator,
            urlencoding::encode(client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scope),
            urlencoding::encode(state)
        )
    }
}

pub fn callback_uri(public_url: &str, provider: &str) -> String {
    format!(
        "{}/oauth2_callback_{}",
        public_url.trim_end_matches('/'),
        provider
    )
}

#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new(providers: impl IntoIterator<Item = ProviderConfig>) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    /// Registers every known provider; credentials come from
    /// `{PROVIDER}_CLIENT_ID` / `{PROVIDER}_CLIENT_SECRET`.
    pub fn from_env(config: &AppConfig) -> Self {
        let registry = Self::new([
            ProviderConfig::google(&config.public_url, AppConfig::client_credentials("google")),
            ProviderConfig::github(&config.public_url, AppConfig::client_credentials("github")),
            ProviderConfig::mailru(&config.public_url, AppConfig::client_credentials("mailru")),
        ]);

        for provider in registry.providers.values() {
            if provider.credentials.is_some() {
                info!(provider = %provider.name, "OAuth provider configured");
            } else {
                warn!(provider = %provider.name, "OAuth provider has no client credentials; sign-in will fail");
            }
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Option<ClientCredentials> {
        Some(ClientCredentials {
            client_id: "client id".to_string(),
            client_secret: "s3cret".to_string(),
        })
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ProviderRegistry::new([
            ProviderConfig::google("http://localhost:8080", None),
            ProviderConfig::github("http://localhost:8080", None),
            ProviderConfig::mailru("http://localhost:8080", None),
        ]);
        assert_eq!(registry.names(), vec!["github", "google", "mailru"]);
        assert!(registry.get("google").is_some());
        assert!(registry.get("facebook").is_none());
    }

    #[test]
    fn test_redirect_uri_per_provider() {
        let google = ProviderConfig::google("https://forum.example.com/", None);
        assert_eq!(
            google.redirect_uri,
            "https://forum.example.com/oauth2_callback_google"
        );
        let mailru = ProviderConfig::mailru("https://forum.example.com", None);
        assert_eq!(mailru.token_placement, TokenPlacement::QueryParam);
    }

    #[test]
    fn test_authorization_url_encodes_parameters() {
        let github = ProviderConfig::github("http://localhost:8080", creds());
        let url = github.authorization_url("client id", "abc123");

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Foauth2_callback_github"
        ));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("state=abc123"));
        assert!(!url.contains("s3cret"));
    }
}
