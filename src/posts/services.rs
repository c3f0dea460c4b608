// src/posts/services.rs
//! Storage for posts, comments, categories and reactions.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, info};

use super::models::{
    Category, CommentView, PostDetail, PostRecord, PostSummary, ReactionKind, ReactionOutcome,
};
use crate::common::ApiError;
use crate::services::tokens::format_timestamp;

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("post {0} not found")]
    PostNotFound(i64),

    #[error("comment {0} not found")]
    CommentNotFound(i64),

    #[error("unknown category selected")]
    UnknownCategory,

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ForumError> for ApiError {
    fn from(e: ForumError) -> Self {
        match e {
            ForumError::PostNotFound(_) | ForumError::CommentNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            ForumError::UnknownCategory => ApiError::BadRequest(e.to_string()),
            ForumError::Database(db) => ApiError::DatabaseError(db),
        }
    }
}

/// Which reaction table a toggle targets
#[derive(Debug, Clone, Copy)]
enum ReactionTarget {
    Post,
    Comment,
}

impl ReactionTarget {
    fn table(self) -> &'static str {
        match self {
            ReactionTarget::Post => "post_reactions",
            ReactionTarget::Comment => "comment_reactions",
        }
    }

    fn column(self) -> &'static str {
        match self {
            ReactionTarget::Post => "post_id",
            ReactionTarget::Comment => "comment_id",
        }
    }
}

pub struct ForumService {
    db: SqlitePool,
}

impl ForumService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub async fn list_categories(&self) -> Result<Vec<Category>, ForumError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name ASC")
                .fetch_all(&self.db)
                .await?;
        Ok(categories)
    }

    /// Newest first, optionally limited to one category.
    pub async fn list_posts(&self, category: Option<i64>) -> Result<Vec<PostSummary>, ForumError> {
        let posts = sqlx::query_as::<_, PostSummary>(
            r#"
            SELECT p.id, p.title, u.name AS author, p.created_at,
                   (SELECT COUNT(*) FROM post_reactions r
                     WHERE r.post_id = p.id AND r.kind = 'like') AS likes,
                   (SELECT COUNT(*) FROM post_reactions r
                     WHERE r.post_id = p.id AND r.kind = 'dislike') AS dislikes,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
            FROM posts p
            JOIN users u ON u.id = p.user_id
            WHERE ?1 IS NULL
               OR EXISTS (SELECT 1 FROM post_categories pc
                           WHERE pc.post_id = p.id AND pc.category_id = ?1)
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(category)
        .fetch_all(&self.db)
        .await?;
        Ok(posts)
    }

    pub async fn get_post(&self, post_id: i64) -> Result<PostDetail, ForumError> {
        let post = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT p.id, p.user_id, u.name AS author, p.title, p.content, p.created_at,
                   (SELECT COUNT(*) FROM post_reactions r
                     WHERE r.post_id = p.id AND r.kind = 'like') AS likes,
                   (SELECT COUNT(*) FROM post_reactions r
                     WHERE r.post_id = p.id AND r.kind = 'dislike') AS dislikes
            FROM posts p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ForumError::PostNotFound(post_id))?;

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name
            FROM categories c
            JOIN post_categories pc ON pc.category_id = c.id
            WHERE pc.post_id = ?
            ORDER BY c.name ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await?;

        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.post_id, u.name AS author, c.content, c.created_at,
                   (SELECT COUNT(*) FROM comment_reactions r
                     WHERE r.comment_id = c.id AND r.kind = 'like') AS likes,
                   (SELECT COUNT(*) FROM comment_reactions r
                     WHERE r.comment_id = c.id AND r.kind = 'dislike') AS dislikes
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.post_id = ?
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PostDetail {
            post,
            categories,
            comments,
        })
    }

    pub async fn post_author(&self, post_id: i64) -> Result<i64, ForumError> {
        sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ForumError::PostNotFound(post_id))
    }

    // ============================================================================
    // Writes
    // ============================================================================

    /// Inserts the post and its category links atomically.
    pub async fn create_post(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        category_ids: &[i64],
    ) -> Result<i64, ForumError> {
        let mut ids = category_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err(ForumError::UnknownCategory);
        }

        let mut tx = self.db.begin().await?;

        for category_id in &ids {
            let known: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?")
                .bind(category_id)
                .fetch_optional(&mut *tx)
                .await?;
            if known.is_none() {
                return Err(ForumError::UnknownCategory);
            }
        }

        let post_id = sqlx::query(
            "INSERT INTO posts (user_id, title, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(title.trim())
        .bind(content.trim())
        .bind(format_timestamp(Utc::now()))
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for category_id in &ids {
            sqlx::query("INSERT INTO post_categories (post_id, category_id) VALUES (?, ?)")
                .bind(post_id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(post_id = post_id, user_id = user_id, "Post created");
        Ok(post_id)
    }

    pub async fn create_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<i64, ForumError> {
        self.post_author(post_id).await?;

        let comment_id = sqlx::query(
            "INSERT INTO comments (post_id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content.trim())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.db)
        .await?
        .last_insert_rowid();

        debug!(comment_id = comment_id, post_id = post_id, "Comment created");
        Ok(comment_id)
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<(), ForumError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ForumError::PostNotFound(post_id));
        }
        info!(post_id = post_id, "Post deleted");
        Ok(())
    }

    pub async fn toggle_post_reaction(
        &self,
        post_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> Result<ReactionOutcome, ForumError> {
        let mut tx = self.db.begin().await?;
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ForumError::PostNotFound(post_id));
        }

        let outcome = toggle(&mut tx, ReactionTarget::Post, post_id, user_id, kind).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Returns the outcome and the post the comment belongs to.
    pub async fn toggle_comment_reaction(
        &self,
        comment_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> Result<(ReactionOutcome, i64), ForumError> {
        let mut tx = self.db.begin().await?;
        let post_id: i64 = sqlx::query_scalar("SELECT post_id FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ForumError::CommentNotFound(comment_id))?;

        let outcome = toggle(&mut tx, ReactionTarget::Comment, comment_id, user_id, kind).await?;
        tx.commit().await?;
        Ok((outcome, post_id))
    }
}

/// Same kind removes, the other kind switches, none inserts.
async fn toggle(
    tx: &mut Transaction<'_, Sqlite>,
    target: ReactionTarget,
    target_id: i64,
    user_id: i64,
    kind: ReactionKind,
) -> Result<ReactionOutcome, ForumError> {
    let (table, column) = (target.table(), target.column());

    let current: Option<String> = sqlx::query_scalar(&format!(
        "SELECT kind FROM {} WHERE {} = ? AND user_id = ?",
        table, column
    ))
    .bind(target_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    let outcome = match current.as_deref() {
        Some(existing) if existing == kind.as_str() => {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE {} = ? AND user_id = ?",
                table, column
            ))
            .bind(target_id)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
            ReactionOutcome::Removed
        }
        Some(_) => {
            sqlx::query(&format!(
                "UPDATE {} SET kind = ? WHERE {} = ? AND user_id = ?",
                table, column
            ))
            .bind(kind.as_str())
            .bind(target_id)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
            ReactionOutcome::Switched
        }
        None => {
            sqlx::query(&format!(
                "INSERT INTO {} ({}, user_id, kind) VALUES (?, ?, ?)",
                table, column
            ))
            .bind(target_id)
            .bind(user_id)
            .bind(kind.as_str())
            .execute(&mut **tx)
            .await?;
            ReactionOutcome::Added
        }
    };

    debug!(
        table = table,
        target_id = target_id,
        user_id = user_id,
        kind = %kind,
        outcome = ?outcome,
        "Reaction toggled"
    );
    Ok(outcome)
}
