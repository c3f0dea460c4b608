//! OAuth routes

use axum::{
    extract::{Extension, Query},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::flow::CallbackParams;
use super::handlers;
use crate::common::AppState;

/// Sign-in start route plus one callback route per registered provider
///
/// # Routes
/// - `GET /oauth2_signin/:provider`
/// - `GET /oauth2_callback_{provider}` for each name in `providers`
pub fn oauth_routes(providers: &[String]) -> Router {
    let mut router = Router::new().route("/oauth2_signin/:provider", get(handlers::oauth_signin));

    for name in providers {
        let provider = name.clone();
        router = router.route(
            &format!("/oauth2_callback_{}", name),
            get(
                move |state: Extension<Arc<RwLock<AppState>>>,
                      params: Query<CallbackParams>,
                      jar: CookieJar| {
                    handlers::oauth_callback(provider.clone(), state, params, jar)
                },
            ),
        );
    }

    router
}
