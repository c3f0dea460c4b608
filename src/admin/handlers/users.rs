// src/admin/handlers/users.rs

use axum::{extract::Extension, response::Html};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::auth::{AuthContext, CurrentUser};
use crate::common::{ApiError, AppState};
use crate::views::{self, PageContext};

/// GET /admin/users - Registered user list
pub async fn list_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, ApiError> {
    let state = state_lock.read().await.clone();

    if !user.is_admin {
        warn!(
            user_id = user.id,
            "User list access denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    let users = state.users.list().await.map_err(|e| {
        error!(error = %e, "Failed to fetch user list");
        ApiError::internal("user_store", e)
    })?;

    info!(
        admin_user_id = user.id,
        user_count = users.len(),
        "User list fetched"
    );

    let providers = state.oauth.providers().names();
    Ok(views::admin_users_page(
        &PageContext {
            auth: &auth,
            providers: &providers,
        },
        &users,
    ))
}
