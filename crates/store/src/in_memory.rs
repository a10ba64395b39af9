//! In-memory backend: useful for testing and ephemeral runs.

use async_trait::async_trait;
use spiro_core::comment::{ArticleId, Comment, CommentId};
use spiro_core::error::StoreError;
use spiro_core::store::{CommentStore, RangeFetch, RangeQuery};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

struct Inner {
    /// Keyed by id, so iteration is already in canonical order.
    comments: BTreeMap<CommentId, Comment>,
    next_id: CommentId,
}

/// An in-memory comment store.
///
/// Both levels of a range read are answered under one read guard, so a
/// single `find_range` always sees one consistent snapshot.
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                comments: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[async_trait]
impl CommentStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_range(&self, query: RangeQuery) -> Result<RangeFetch, StoreError> {
        let inner = self.inner.read().await;

        let primaries: Vec<Comment> = inner
            .comments
            .values()
            .filter(|c| c.article_id == query.article_id && c.is_primary())
            .skip(to_usize(query.offset))
            .take(to_usize(query.primary_limit))
            .cloned()
            .collect();

        let sub_limit = to_usize(query.sub_limit_per_primary);
        let mut groups: HashMap<CommentId, Vec<Comment>> = primaries
            .iter()
            .map(|p| (p.comment_id, Vec::new()))
            .collect();

        for reply in inner
            .comments
            .values()
            .filter(|c| c.article_id == query.article_id && !c.is_primary())
        {
            if let Some(group) = groups
                .get_mut(&reply.parent_comment_id)
                .filter(|g| g.len() < sub_limit)
            {
                group.push(reply.clone());
            }
        }

        let subs = primaries
            .iter()
            .flat_map(|p| groups.remove(&p.comment_id).unwrap_or_default())
            .collect();

        Ok(RangeFetch::new(primaries, subs))
    }

    async fn insert(&self, mut comment: Comment) -> Result<CommentId, StoreError> {
        let mut inner = self.inner.write().await;

        if comment.comment_id == 0 {
            comment.comment_id = inner.next_id;
        } else if inner.comments.contains_key(&comment.comment_id) {
            return Err(StoreError::Conflict(comment.comment_id));
        }

        if let Some(parent_id) = comment.parent() {
            let valid = inner
                .comments
                .get(&parent_id)
                .is_some_and(|p| p.is_primary() && p.article_id == comment.article_id);
            if !valid {
                return Err(StoreError::InvalidParent {
                    comment_id: comment.comment_id,
                    parent_comment_id: parent_id,
                    article_id: comment.article_id,
                });
            }
        }

        let id = comment.comment_id;
        let after = id.checked_add(1).ok_or_else(|| {
            StoreError::Storage(format!("Comment id {id} leaves no room for later ids"))
        })?;
        inner.next_id = inner.next_id.max(after);
        inner.comments.insert(id, comment);
        Ok(id)
    }

    async fn count(&self, article_id: ArticleId) -> Result<usize, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .count())
    }
}
