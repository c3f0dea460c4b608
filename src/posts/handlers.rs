// src/posts/handlers.rs

use axum::{
    extract::{Extension, Form, Path, Query},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::Form as MultiForm;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::models::{CommentForm, ListQuery, NewPostForm, ReactionForm, ReactionKind};
use super::services::ForumError;
use super::validators::{CommentValidator, PostValidator, ReactionValidator};
use crate::auth::{AuthContext, CurrentUser};
use crate::common::{redirect_found, ApiError, AppState, Validator};
use crate::views::{self, PageContext};

/// GET / - Post list, newest first
pub async fn index(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, ApiError> {
    let state = state_lock.read().await.clone();
    let posts = state.forum.list_posts(query.category).await?;
    let categories = state.forum.list_categories().await?;
    let providers = state.oauth.providers().names();

    Ok(views::index_page(
        &PageContext {
            auth: &auth,
            providers: &providers,
        },
        &posts,
        &categories,
        query.category,
    ))
}

/// GET /posts/:id
pub async fn show_post(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
    Path(post_id): Path<i64>,
) -> Result<Html<String>, ApiError> {
    let state = state_lock.read().await.clone();
    let detail = state.forum.get_post(post_id).await?;
    let providers = state.oauth.providers().names();

    Ok(views::post_page(
        &PageContext {
            auth: &auth,
            providers: &providers,
        },
        &detail,
    ))
}

/// GET /posts/new
pub async fn new_post_page(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
) -> Result<Html<String>, ApiError> {
    let state = state_lock.read().await.clone();
    let categories = state.forum.list_categories().await?;
    let providers = state.oauth.providers().names();

    Ok(views::new_post_page(
        &PageContext {
            auth: &auth,
            providers: &providers,
        },
        &categories,
        &NewPostForm::default(),
        None,
    ))
}

/// POST /posts - Create a post with its categories
pub async fn create_post(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    auth: AuthContext,
    CurrentUser(user): CurrentUser,
    MultiForm(form): MultiForm<NewPostForm>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = PostValidator.validate(&form);
    let error = if !validation.is_valid {
        validation
            .first_message()
            .unwrap_or("Invalid input")
            .to_string()
    } else {
        match state
            .forum
            .create_post(user.id, &form.title, &form.content, &form.categories)
            .await
        {
            Ok(post_id) => return Ok(redirect_found(&format!("/posts/{}", post_id))),
            Err(ForumError::UnknownCategory) => "Choose at least one existing category".to_string(),
            Err(e) => return Err(e.into()),
        }
    };

    warn!(user_id = user.id, reason = %error, "Post rejected");
    let categories = state.forum.list_categories().await?;
    let providers = state.oauth.providers().names();
    Ok((
        StatusCode::BAD_REQUEST,
        views::new_post_page(
            &PageContext {
                auth: &auth,
                providers: &providers,
            },
            &categories,
            &form,
            Some(&error),
        ),
    )
        .into_response())
}

/// POST /posts/:id/comments
pub async fn create_comment(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = CommentValidator.validate(&form);
    if !validation.is_valid {
        return Err(validation.into());
    }

    state
        .forum
        .create_comment(post_id, user.id, &form.content)
        .await?;
    Ok(redirect_found(&format!("/posts/{}", post_id)))
}

fn reaction_kind(form: &ReactionForm) -> Result<ReactionKind, ApiError> {
    let validation = ReactionValidator.validate(form);
    if !validation.is_valid {
        return Err(validation.into());
    }
    form.kind.parse::<ReactionKind>().map_err(ApiError::BadRequest)
}

/// POST /posts/:id/react
pub async fn react_to_post(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<i64>,
    Form(form): Form<ReactionForm>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();
    let kind = reaction_kind(&form)?;

    state
        .forum
        .toggle_post_reaction(post_id, user.id, kind)
        .await?;
    Ok(redirect_found(&format!("/posts/{}", post_id)))
}

/// POST /comments/:id/react
pub async fn react_to_comment(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<i64>,
    Form(form): Form<ReactionForm>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();
    let kind = reaction_kind(&form)?;

    let (_, post_id) = state
        .forum
        .toggle_comment_reaction(comment_id, user.id, kind)
        .await?;
    Ok(redirect_found(&format!("/posts/{}", post_id)))
}

/// POST /posts/:id/delete - Author or administrator only
pub async fn delete_post(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<i64>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let author_id = state.forum.post_author(post_id).await?;
    if author_id != user.id && !user.is_admin {
        warn!(
            user_id = user.id,
            post_id = post_id,
            "Post deletion denied: not the author"
        );
        return Err(ApiError::Forbidden("only the author or an admin may delete".to_string()));
    }

    state.forum.delete_post(post_id).await?;
    info!(user_id = user.id, post_id = post_id, "Post removed by user");
    Ok(redirect_found("/"))
}
