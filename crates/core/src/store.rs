//! Comment store trait: the single range read the page assembler consumes.
//!
//! A store answers one window of primary comments plus a bounded number of
//! replies per primary in that window. Both levels must come from the same
//! snapshot; how a backend guarantees that is up to the backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::comment::{ArticleId, Comment, CommentId};
use crate::error::StoreError;

/// A range read over an article's comment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub article_id: ArticleId,

    /// Number of primary comments to skip.
    pub offset: u64,

    /// Maximum number of primary comments to return.
    pub primary_limit: u64,

    /// Maximum number of replies to return for each primary in the window.
    pub sub_limit_per_primary: u64,
}

/// Raw result of a [`RangeQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFetch {
    /// `false` when the article or window yields nothing.
    pub found: bool,

    /// Primary comments of the window, in canonical order.
    pub primaries: Vec<Comment>,

    /// Replies to the primaries in the window, in canonical order.
    pub subs: Vec<Comment>,
}

impl RangeFetch {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn new(primaries: Vec<Comment>, subs: Vec<Comment>) -> Self {
        Self {
            found: !primaries.is_empty(),
            primaries,
            subs,
        }
    }
}

/// The core CommentStore trait.
///
/// Implementations: in-memory (tests, ephemeral runs), SQLite.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// The backend name (e.g., "memory", "sqlite").
    fn name(&self) -> &str;

    /// Read one window of primary comments and their replies.
    ///
    /// Primaries are ordered by ascending id. Replies are grouped by the
    /// window position of their parent, each group ordered by ascending id.
    async fn find_range(&self, query: RangeQuery) -> std::result::Result<RangeFetch, StoreError>;

    /// Insert a comment. A `comment_id` of `0` asks the store to assign one.
    async fn insert(&self, comment: Comment) -> std::result::Result<CommentId, StoreError>;

    /// Number of comments (primaries and replies) stored for an article.
    async fn count(&self, article_id: ArticleId) -> std::result::Result<usize, StoreError>;
}
