use serde::Deserialize;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// One row of the front-page listing
#[derive(Debug, Clone, FromRow)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub created_at: String,
    pub likes: i64,
    pub dislikes: i64,
    pub comment_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub user_id: i64,
    pub author: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub likes: i64,
    pub dislikes: i64,
}

/// A post with everything its page shows
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub categories: Vec<Category>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub author: String,
    pub content: String,
    pub created_at: String,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            other => Err(format!("unknown reaction kind '{}'", other)),
        }
    }
}

/// What a toggle did to the stored reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    Added,
    Switched,
    Removed,
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub categories: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReactionForm {
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<i64>,
}
