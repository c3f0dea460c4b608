// src/services/mod.rs
//
// Shared services module containing the account and session logic
// used by the auth, oauth and admin modules

pub mod password;
pub mod sessions;
pub mod tokens;
pub mod users;

// Re-export commonly used types for convenience
pub use password::PasswordHasher;
pub use sessions::SessionService;
pub use tokens::TokenManager;
pub use users::UserStore;
