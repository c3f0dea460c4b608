// src/posts/mod.rs
//
// Forum content: posts, categories, comments and reactions

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::{protected_post_routes, public_post_routes};
pub use services::ForumService;
