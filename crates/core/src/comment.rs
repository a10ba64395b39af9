//! Comment domain types: the two-level comment hierarchy of an article.
//!
//! An article carries *primary* comments; each primary comment carries
//! *replies* (sub comments). Replies never nest further.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a single comment. Stores never hand out `0`.
pub type CommentId = u64;

/// Identifier of the article a comment belongs to.
pub type ArticleId = u64;

/// `parent_comment_id` value marking a primary comment.
pub const NO_PARENT: CommentId = 0;

/// A single comment record as it comes out of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: CommentId,

    /// `0` for a primary comment, otherwise the primary comment replied to.
    #[serde(default)]
    pub parent_comment_id: CommentId,

    pub article_id: ArticleId,

    pub author_id: u64,

    #[serde(default)]
    pub author_name: String,

    pub content: String,

    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Build a primary comment. `comment_id` is left at `0` so the store assigns one.
    pub fn primary(article_id: ArticleId, author_id: u64, content: impl Into<String>) -> Self {
        Self {
            comment_id: 0,
            parent_comment_id: NO_PARENT,
            article_id,
            author_id,
            author_name: String::new(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Build a reply to `parent`.
    pub fn reply(
        article_id: ArticleId,
        parent: CommentId,
        author_id: u64,
        content: impl Into<String>,
    ) -> Self {
        Self {
            parent_comment_id: parent,
            ..Self::primary(article_id, author_id, content)
        }
    }

    pub fn with_id(mut self, comment_id: CommentId) -> Self {
        self.comment_id = comment_id;
        self
    }

    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.author_name = name.into();
        self
    }

    pub fn is_primary(&self) -> bool {
        self.parent_comment_id == NO_PARENT
    }

    /// The primary comment this one replies to, if any.
    pub fn parent(&self) -> Option<CommentId> {
        (!self.is_primary()).then_some(self.parent_comment_id)
    }
}

/// A primary comment together with one page of its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryCommentView {
    #[serde(flatten)]
    pub comment: Comment,

    pub sub_comment_list: Vec<Comment>,

    /// More replies exist beyond `sub_comment_list`.
    pub is_more: bool,
}

impl PrimaryCommentView {
    pub fn new(comment: Comment) -> Self {
        Self {
            comment,
            sub_comment_list: Vec::new(),
            is_more: false,
        }
    }
}

/// One page of an article's comment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPageResult {
    pub article_id: ArticleId,

    pub comment_list: Vec<PrimaryCommentView>,

    /// More primary comments exist beyond `comment_list`.
    pub is_more: bool,
}

impl CommentPageResult {
    /// The page returned when the store has nothing for the window.
    pub fn empty(article_id: ArticleId) -> Self {
        Self {
            article_id,
            comment_list: Vec::new(),
            is_more: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.comment_list.is_empty()
    }

    /// Total number of comments on the page, replies included.
    pub fn comment_count(&self) -> usize {
        self.comment_list
            .iter()
            .map(|p| 1 + p.sub_comment_list.len())
            .sum()
    }
}
