// src/oauth/flow.rs
//! Authorization-code flow driver shared by every provider.

use reqwest::{header, Client};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::profile::{parse_profile, ProviderProfile};
use super::providers::{ProviderConfig, ProviderRegistry, TokenPlacement};
use super::state_store::StateStore;
use crate::common::{safe_email_log, ClientCredentials};

const USER_AGENT: &str = concat!("forum/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("client credentials missing for '{0}'")]
    MissingCredentials(String),

    #[error("state parameter missing, unknown, expired or issued for another provider")]
    StateMismatch,

    #[error("provider returned error: {0}")]
    ProviderDenied(String),

    #[error("authorization code missing from callback")]
    MissingCode,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("token endpoint answered HTTP {0}")]
    TokenEndpoint(u16),

    #[error("token response carried no access token")]
    MissingAccessToken,

    #[error("user-info endpoint answered HTTP {0}")]
    UserInfoEndpoint(u16),

    #[error("user-info payload had no usable email")]
    MissingEmail,
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        // Mail.ru carries the access token in the URL
        OAuthError::RequestFailed(e.without_url().to_string())
    }
}

/// Query string of the provider redirect back to us
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug)]
pub struct OAuthFlow {
    http: Client,
    providers: ProviderRegistry,
    states: StateStore,
}

impl OAuthFlow {
    pub fn new(http: Client, providers: ProviderRegistry, states: StateStore) -> Self {
        Self {
            http,
            providers,
            states,
        }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    fn configured(
        &self,
        provider: &str,
    ) -> Result<(&ProviderConfig, &ClientCredentials), OAuthError> {
        let config = self
            .providers
            .get(provider)
            .ok_or_else(|| OAuthError::UnknownProvider(provider.to_string()))?;
        let credentials = config
            .credentials
            .as_ref()
            .ok_or_else(|| OAuthError::MissingCredentials(provider.to_string()))?;
        Ok((config, credentials))
    }

    /// Records a fresh state value and returns the provider URL to send the
    /// browser to.
    pub async fn start(&self, provider: &str) -> Result<String, OAuthError> {
        let (config, credentials) = self.configured(provider)?;
        let state = self.states.issue(provider).await;
        info!(provider = %provider, "Starting OAuth flow");
        Ok(config.authorization_url(&credentials.client_id, &state))
    }

    /// Validates the callback, exchanges the code and fetches the profile.
    ///
    /// The state is consumed before anything else so a replayed callback
    /// fails even if the first attempt errored further down.
    pub async fn complete(
        &self,
        provider: &str,
        params: &CallbackParams,
    ) -> Result<ProviderProfile, OAuthError> {
        let (config, credentials) = self.configured(provider)?;

        let state_ok = match params.state.as_deref() {
            Some(state) if !state.is_empty() => self.states.consume(state, provider).await,
            _ => false,
        };
        if !state_ok {
            warn!(provider = %provider, "OAuth callback with invalid state");
            return Err(OAuthError::StateMismatch);
        }

        if let Some(err) = params.error.as_deref().filter(|e| !e.is_empty()) {
            warn!(provider = %provider, oauth_error = %err, "Provider reported an error");
            return Err(OAuthError::ProviderDenied(err.to_string()));
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(OAuthError::MissingCode)?;

        let access_token = self.exchange_code(config, credentials, code).await?;
        let profile = self.fetch_profile(config, &access_token).await?;

        info!(
            provider = %provider,
            email = %safe_email_log(&profile.email),
            "OAuth profile retrieved"
        );
        Ok(profile)
    }

    async fn exchange_code(
        &self,
        config: &ProviderConfig,
        credentials: &ClientCredentials,
        code: &str,
    ) -> Result<String, OAuthError> {
        let params = [
            ("code", code),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!(provider = %config.name, "Exchanging authorization code");

        let response = self
            .http
            .post(&config.token_url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(provider = %config.name, status = %status, "Token exchange failed");
            return Err(OAuthError::TokenEndpoint(status.as_u16()));
        }

        let body = response.bytes().await?;
        let token = serde_json::from_slice::<TokenResponse>(&body).map_err(|e| {
            error!(provider = %config.name, error = %e, "Token response not JSON");
            OAuthError::MissingAccessToken
        })?;

        match token.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => Ok(access_token),
            None => {
                error!(
                    provider = %config.name,
                    oauth_error = %token.error.unwrap_or_default(),
                    "Token response without access token"
                );
                Err(OAuthError::MissingAccessToken)
            }
        }
    }

    async fn fetch_profile(
        &self,
        config: &ProviderConfig,
        access_token: &str,
    ) -> Result<ProviderProfile, OAuthError> {
        let request = self
            .http
            .get(&config.user_info_url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT);

        let request = match config.token_placement {
            TokenPlacement::BearerHeader => request.bearer_auth(access_token),
            TokenPlacement::QueryParam => request.query(&[("access_token", access_token)]),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(provider = %config.name, status = %status, "User-info request failed");
            return Err(OAuthError::UserInfoEndpoint(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_profile(&body).ok_or_else(|| {
            warn!(provider = %config.name, "User-info payload without email");
            OAuthError::MissingEmail
        })
    }
}
