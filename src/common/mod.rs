// Common module - shared types and utilities across all modules

pub mod config;
pub mod error;
pub mod helpers;
pub mod migrations;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types for convenience
pub use config::{AppConfig, ClientCredentials};
pub use error::ApiError;
pub use helpers::{redirect_found, safe_email_log, safe_token_log};
pub use state::AppState;
pub use validation::{ValidationResult, Validator};
