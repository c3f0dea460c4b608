//! # OAuth Module
//!
//! Third-party sign-in through Google, GitHub and Mail.ru using the
//! authorization-code flow:
//! - `GET /oauth2_signin/:provider` redirects to the provider
//! - `GET /oauth2_callback_{provider}` validates state, exchanges the code,
//!   resolves the local account and issues a session

pub mod flow;
pub mod handlers;
pub mod identity;
pub mod profile;
pub mod providers;
pub mod routes;
pub mod state_store;


pub use flow::OAuthFlow;
pub use providers::ProviderRegistry;
pub use routes::oauth_routes;
pub use state_store::StateStore;
