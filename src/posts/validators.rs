// src/posts/validators.rs

use super::models::{CommentForm, NewPostForm, ReactionForm, ReactionKind};
use crate::common::{ValidationResult, Validator};

const MAX_TITLE_LEN: usize = 200;
const MAX_POST_LEN: usize = 10_000;
const MAX_COMMENT_LEN: usize = 2_000;

pub struct PostValidator;

impl Validator<NewPostForm> for PostValidator {
    fn validate(&self, data: &NewPostForm) -> ValidationResult {
        let mut result = ValidationResult::new();

        let title_len = data.title.trim().chars().count();
        if title_len == 0 {
            result.add_error("title", "Title is required");
        } else if title_len > MAX_TITLE_LEN {
            result.add_error("title", "Title must be at most 200 characters");
        }

        let content_len = data.content.trim().chars().count();
        if content_len == 0 {
            result.add_error("content", "Post text is required");
        } else if content_len > MAX_POST_LEN {
            result.add_error("content", "Post text must be at most 10000 characters");
        }

        if data.categories.is_empty() {
            result.add_error("categories", "Choose at least one category");
        }

        result
    }
}

pub struct CommentValidator;

impl Validator<CommentForm> for CommentValidator {
    fn validate(&self, data: &CommentForm) -> ValidationResult {
        let mut result = ValidationResult::new();

        let len = data.content.trim().chars().count();
        if len == 0 {
            result.add_error("content", "Comment cannot be empty");
        } else if len > MAX_COMMENT_LEN {
            result.add_error("content", "Comment must be at most 2000 characters");
        }

        result
    }
}

pub struct ReactionValidator;

impl Validator<ReactionForm> for ReactionValidator {
    fn validate(&self, data: &ReactionForm) -> ValidationResult {
        let mut result = ValidationResult::new();
        if data.kind.parse::<ReactionKind>().is_err() {
            result.add_error("kind", "Reaction must be 'like' or 'dislike'");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_requires_title_content_and_category() {
        let result = PostValidator.validate(&NewPostForm::default());
        assert_eq!(result.errors.len(), 3);

        let ok = NewPostForm {
            title: "Hello".to_string(),
            content: "World".to_string(),
            categories: vec![1],
        };
        assert!(PostValidator.validate(&ok).is_valid);
    }

    #[test]
    fn test_post_length_limits() {
        let form = NewPostForm {
            title: "t".repeat(201),
            content: "c".repeat(10_001),
            categories: vec![1],
        };
        let result = PostValidator.validate(&form);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_comment_rules() {
        let blank = CommentForm {
            content: "   ".to_string(),
        };
        assert_eq!(
            CommentValidator.validate(&blank).first_message(),
            Some("Comment cannot be empty")
        );
    }

    #[test]
    fn test_reaction_kind() {
        let like = ReactionForm {
            kind: "like".to_string(),
        };
        assert!(ReactionValidator.validate(&like).is_valid);
        let love = ReactionForm {
            kind: "love".to_string(),
        };
        assert!(!ReactionValidator.validate(&love).is_valid);
    }
}
